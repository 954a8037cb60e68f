//! Assignments: sessions with rich-text instructions.

use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{deleted, wrap};
use crate::client::TrainerCentralClient;
use crate::error::{TcError, TcResult};
use crate::models::{created_session_id, TextFile, VIEW_TYPE_HTML};

#[derive(Debug, Clone)]
pub struct AssignmentsApi {
    client: Arc<TrainerCentralClient>,
}

impl AssignmentsApi {
    pub fn new(client: Arc<TrainerCentralClient>) -> Self {
        Self { client }
    }

    pub async fn create(&self, assignment: Map<String, Value>) -> TcResult<Value> {
        self.client
            .post_json("sessions.json", &wrap("session", assignment))
            .await
    }

    /// Attach rich text to an existing session via `createTextFile.json`
    pub async fn add_text_instructions(
        &self,
        session_id: &str,
        html: &str,
        filename: &str,
        view_type: u8,
    ) -> TcResult<Value> {
        let body = TextFile {
            rich_text_content: html.to_string(),
            filename: filename.to_string(),
            view_type,
        };
        self.client
            .post_json(
                &format!("session/{}/createTextFile.json", session_id),
                &serde_json::to_value(&body)?,
            )
            .await
    }

    /// Create the assignment and attach its instructions.
    /// Returns `{"assignment": ..., "instructions": ...}`.
    pub async fn create_with_instructions(
        &self,
        assignment: Map<String, Value>,
        instruction_html: &str,
        instruction_filename: &str,
        view_type: Option<u8>,
    ) -> TcResult<Value> {
        let created = self.create(assignment).await?;
        let session_id = created_session_id(&created).ok_or_else(|| {
            TcError::UnexpectedResponse(format!(
                "assignment created but no session id in response: {}",
                created
            ))
        })?;

        let instructions = self
            .add_text_instructions(
                &session_id,
                instruction_html,
                instruction_filename,
                view_type.unwrap_or(VIEW_TYPE_HTML),
            )
            .await?;

        Ok(json!({ "assignment": created, "instructions": instructions }))
    }

    pub async fn delete(&self, session_id: &str) -> TcResult<Value> {
        let response = self
            .client
            .delete(&format!("sessions/{}.json", session_id))
            .await?;
        Ok(deleted(response, "Assignment", session_id))
    }
}
