//! Live sessions scheduled inside a course, and learner enrollment.

use serde_json::{json, Value};
use std::sync::Arc;

use super::{deleted, ListWindow};
use crate::client::TrainerCentralClient;
use crate::error::TcResult;
use crate::models::{CourseAttendee, LiveSession};

#[derive(Debug, Clone)]
pub struct CourseWorkshopsApi {
    client: Arc<TrainerCentralClient>,
}

impl CourseWorkshopsApi {
    pub fn new(client: Arc<TrainerCentralClient>) -> Self {
        Self { client }
    }

    pub async fn create_live_session(&self, session: &LiveSession) -> TcResult<Value> {
        let body = json!({ "session": session });
        self.client.post_json("sessions.json", &body).await
    }

    pub async fn list_upcoming(&self, window: ListWindow) -> TcResult<Value> {
        let query = [
            ("filterType", window.filter.to_string()),
            ("limit", window.limit.to_string()),
            ("si", window.si.to_string()),
        ];
        self.client.get("upcomingSessions.json", &query).await
    }

    pub async fn delete_live_session(&self, session_id: &str) -> TcResult<Value> {
        let response = self
            .client
            .delete(&format!("sessions/{}.json", session_id))
            .await?;
        Ok(deleted(response, "Live session", session_id))
    }

    /// Enroll a learner into a course, or into a live session of a course
    pub async fn invite_learner(&self, attendee: &CourseAttendee) -> TcResult<Value> {
        attendee.check_target()?;
        let body = json!({ "courseAttendee": attendee });
        self.client.post_json("addCourseAttendee.json", &body).await
    }
}
