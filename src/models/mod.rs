//! Request bodies and condensed responses for TrainerCentral resources.
//!
//! Most tools pass caller-supplied objects straight through; the types here
//! cover the bodies this crate assembles itself.

mod attendee;
mod session;

pub use attendee::CourseAttendee;
pub use session::{
    created_session_id, CourseRef, CourseSessions, LiveSession, SessionMember, SessionSummary,
    TextFile, DELIVERY_MODE_LIVE, MEMBER_ROLE_LEARNER, MEMBER_SOURCE_INVITE, VIEW_TYPE_HTML,
};

pub(crate) use session::id_string;
