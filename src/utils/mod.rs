//! Utility modules shared by the client and the tool handlers.
//!
//! - [`HttpClient`]: shared reqwest client with user agent and timeouts
//! - [`Params`]: typed extraction of tool arguments
//! - [`sanitize_resource_id`]: guard for ids embedded in URL paths
//! - [`ScheduleWindow`]: `DD-MM-YYYY HH:MMAM/PM` conversion for live workshops

mod dates;
mod http;
mod validate;

pub use dates::{parse_workshop_time, workshop_time_to_millis, ScheduleWindow, WORKSHOP_TIME_FORMAT};
pub use http::HttpClient;
pub use validate::{
    require_field, sanitize_filename, sanitize_resource_id, Params, ValidationError,
};
