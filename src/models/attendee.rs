//! Learner enrollment request body.

use serde::{Deserialize, Serialize};

use crate::error::{TcError, TcResult};

/// Body of `addCourseAttendee.json`, sent as `{"courseAttendee": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAttendee {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_access_granted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Absolute access expiry in epoch milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<i64>,

    /// Relative access expiry as TrainerCentral expects it, e.g. `"30"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_duration: Option<String>,
}

impl CourseAttendee {
    /// Require a target: the course, or a live session inside a course
    pub fn check_target(&self) -> TcResult<()> {
        if self.course_id.is_none() && self.session_id.is_none() {
            return Err(TcError::validation(
                "either 'course_id' or 'session_id' is required",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendee() -> CourseAttendee {
        CourseAttendee {
            email: "learner@example.com".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Lee".to_string(),
            is_access_granted: true,
            course_id: None,
            session_id: None,
            expiry_time: None,
            expiry_duration: None,
        }
    }

    #[test]
    fn test_target_required() {
        assert!(matches!(
            attendee().check_target(),
            Err(TcError::Validation(_))
        ));

        let mut with_course = attendee();
        with_course.course_id = Some("1".to_string());
        assert!(with_course.check_target().is_ok());
    }

    #[test]
    fn test_serializes_camel_case_and_skips_absent() {
        let mut a = attendee();
        a.session_id = Some("77".to_string());
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["firstName"], "Sam");
        assert_eq!(json["isAccessGranted"], true);
        assert_eq!(json["sessionId"], "77");
        assert!(json.get("courseId").is_none());
        assert!(json.get("expiryTime").is_none());
    }
}
