//! Tool handlers, one module per TrainerCentral resource.
//!
//! Every handler validates its arguments with [`crate::utils::Params`]
//! before touching the network, so a malformed call never costs a request.

pub(crate) mod assignments;
pub(crate) mod chapters;
pub(crate) mod course_workshops;
pub(crate) mod courses;
pub(crate) mod lessons;
pub(crate) mod test_forms;
pub(crate) mod workshops;
