//! Global live workshops, their occurrences (talks) and invitations.

use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::wrap;
use crate::client::TrainerCentralClient;
use crate::error::TcResult;
use crate::models::{SessionMember, DELIVERY_MODE_LIVE};

/// Paging window for upcoming-workshop listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListWindow {
    /// 1 = your upcoming, 5 = all upcoming
    pub filter: u64,
    pub limit: u64,
    /// Start index
    pub si: u64,
}

impl Default for ListWindow {
    fn default() -> Self {
        Self {
            filter: 5,
            limit: 50,
            si: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkshopsApi {
    client: Arc<TrainerCentralClient>,
}

impl WorkshopsApi {
    pub fn new(client: Arc<TrainerCentralClient>) -> Self {
        Self { client }
    }

    /// Create a global workshop; `deliveryMode` defaults to live (3)
    pub async fn create(&self, mut session: Map<String, Value>) -> TcResult<Value> {
        session
            .entry("deliveryMode")
            .or_insert_with(|| json!(DELIVERY_MODE_LIVE));
        self.client
            .post_json("sessions.json", &wrap("session", session))
            .await
    }

    /// Update or cancel (`{"isCancelled": true}`) a workshop
    pub async fn update(&self, session_id: &str, updates: Map<String, Value>) -> TcResult<Value> {
        self.client
            .put_json(
                &format!("sessions/{}.json", session_id),
                &wrap("session", updates),
            )
            .await
    }

    pub async fn create_occurrence(&self, talk: Map<String, Value>) -> TcResult<Value> {
        self.client
            .post_json("talks.json", &wrap("talk", talk))
            .await
    }

    pub async fn update_occurrence(
        &self,
        talk_id: &str,
        updates: Map<String, Value>,
    ) -> TcResult<Value> {
        self.client
            .put_json(&format!("talks/{}.json", talk_id), &wrap("talk", updates))
            .await
    }

    pub async fn list_upcoming(&self, window: ListWindow) -> TcResult<Value> {
        let query = [
            ("filter", window.filter.to_string()),
            ("limit", window.limit.to_string()),
            ("si", window.si.to_string()),
        ];
        self.client.get("talks.json", &query).await
    }

    pub async fn invite_user(&self, member: SessionMember) -> TcResult<Value> {
        let body = json!({ "sessionMembers": [member] });
        self.client.post_json("sessionMembers.json", &body).await
    }
}
