//! Session (lesson, assignment, workshop) request bodies and summaries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `deliveryMode` used by TrainerCentral for live workshops
pub const DELIVERY_MODE_LIVE: u8 = 3;

/// Material view type for rich HTML content
pub const VIEW_TYPE_HTML: u8 = 4;

/// Default role and source for `sessionMembers.json` invitations
pub const MEMBER_ROLE_LEARNER: u8 = 3;
pub const MEMBER_SOURCE_INVITE: u8 = 1;

/// Scheduled live session inside a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    pub name: String,

    /// HTML description
    pub description: String,

    pub course_id: String,

    pub delivery_mode: u8,

    /// Start in epoch milliseconds
    pub scheduled_time: i64,

    /// End in epoch milliseconds
    pub scheduled_end_time: i64,

    /// `scheduled_end_time - scheduled_time`
    pub duration_time: i64,
}

impl LiveSession {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        course_id: impl Into<String>,
        start_ms: i64,
        end_ms: i64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            course_id: course_id.into(),
            delivery_mode: DELIVERY_MODE_LIVE,
            scheduled_time: start_ms,
            scheduled_end_time: end_ms,
            duration_time: end_ms - start_ms,
        }
    }
}

/// Invitation of an existing user into a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMember {
    pub email_id: String,
    pub session_id: String,
    pub role: u8,
    pub source: u8,
}

/// Rich text attached to a session through `createTextFile.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFile {
    pub rich_text_content: String,
    pub filename: String,
    pub view_type: u8,
}

/// Condensed view of one session returned by `tc_get_course_sessions`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Value,
    pub name: Value,
    pub description: Value,
    pub tests_link: Value,
    pub raw: Value,
}

impl SessionSummary {
    pub fn from_raw(raw: &Value) -> Self {
        let field = |name: &str| raw.get(name).cloned().unwrap_or(Value::Null);
        Self {
            session_id: field("sessionId"),
            name: field("name"),
            description: field("description"),
            tests_link: raw
                .pointer("/links/tests")
                .cloned()
                .unwrap_or(Value::Null),
            raw: raw.clone(),
        }
    }
}

/// Course header in the `tc_get_course_sessions` result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRef {
    pub course_id: Value,
    pub name: Value,
}

/// Result of `tc_get_course_sessions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSessions {
    pub course: CourseRef,
    pub sessions: Vec<SessionSummary>,
    pub raw: Value,
}

/// Pull the new session id out of a `sessions.json` create response.
///
/// TrainerCentral has been seen to return it under `session.sessionId`,
/// `session.id`, or at the top level.
pub fn created_session_id(response: &Value) -> Option<String> {
    ["/session/sessionId", "/session/id", "/sessionId", "/id"]
        .iter()
        .filter_map(|ptr| response.pointer(ptr))
        .find_map(id_string)
}

pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_live_session_body_shape() {
        let session = LiveSession::new("Q&A", "<p>Bring questions</p>", "55", 1_000, 4_600_000);
        let body = serde_json::to_value(&session).unwrap();
        assert_eq!(body["courseId"], "55");
        assert_eq!(body["deliveryMode"], 3);
        assert_eq!(body["scheduledEndTime"], 4_600_000);
        assert_eq!(body["durationTime"], 4_599_000);
    }

    #[test]
    fn test_created_session_id_variants() {
        assert_eq!(
            created_session_id(&json!({"session": {"sessionId": "11"}})).as_deref(),
            Some("11")
        );
        assert_eq!(
            created_session_id(&json!({"session": {"id": 12}})).as_deref(),
            Some("12")
        );
        assert_eq!(created_session_id(&json!({"sessionId": "13"})).as_deref(), Some("13"));
        assert_eq!(created_session_id(&json!({"session": {"name": "x"}})), None);
    }

    #[test]
    fn test_session_summary_picks_tests_link() {
        let raw = json!({
            "sessionId": "1",
            "name": "Intro",
            "links": {"tests": "/api/v4/1/session/1/forms.json"}
        });
        let summary = SessionSummary::from_raw(&raw);
        assert_eq!(summary.tests_link, "/api/v4/1/session/1/forms.json");
        assert_eq!(summary.description, Value::Null);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["sessionId"], "1");
        assert!(json.get("testsLink").is_some());
    }
}
