//! Lessons (self-paced sessions) and their HTML material.

use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{deleted, wrap};
use crate::client::{HtmlUpload, TrainerCentralClient};
use crate::error::{TcError, TcResult};
use crate::models::{created_session_id, VIEW_TYPE_HTML};

#[derive(Debug, Clone)]
pub struct LessonsApi {
    client: Arc<TrainerCentralClient>,
}

impl LessonsApi {
    pub fn new(client: Arc<TrainerCentralClient>) -> Self {
        Self { client }
    }

    pub async fn create(&self, session: Map<String, Value>) -> TcResult<Value> {
        self.client
            .post_json("sessions.json", &wrap("session", session))
            .await
    }

    /// Create the lesson, then upload `content_html` as its first material.
    /// Returns `{"lesson": ..., "content": ...}`.
    pub async fn create_with_content(
        &self,
        session: Map<String, Value>,
        content_html: &str,
        content_label: &str,
    ) -> TcResult<Value> {
        let lesson = self.create(session).await?;
        let session_id = created_session_id(&lesson).ok_or_else(|| {
            TcError::UnexpectedResponse(format!(
                "lesson created but no session id in response: {}",
                lesson
            ))
        })?;

        tracing::debug!(session_id = %session_id, "Lesson created, uploading content");
        let content = self
            .upload_content(&session_id, content_html, content_label)
            .await?;

        Ok(json!({ "lesson": lesson, "content": content }))
    }

    /// Upload HTML as `{label}.html` with view type 4
    pub async fn upload_content(
        &self,
        session_id: &str,
        content_html: &str,
        label: &str,
    ) -> TcResult<Value> {
        let upload = HtmlUpload {
            label: label.to_string(),
            html: content_html.to_string(),
            view_type: VIEW_TYPE_HTML,
        };
        self.client
            .post_multipart(&format!("sessions/{}/materials.json", session_id), &upload)
            .await
    }

    pub async fn materials(&self, session_id: &str) -> TcResult<Value> {
        self.client
            .get(&format!("sessions/{}/materials.json", session_id), &[])
            .await
    }

    pub async fn get(&self, session_id: &str) -> TcResult<Value> {
        self.client
            .get(&format!("sessions/{}.json", session_id), &[])
            .await
    }

    pub async fn list_for_course(&self, course_id: &str) -> TcResult<Value> {
        self.client
            .get(&format!("course/{}/sessions.json", course_id), &[])
            .await
    }

    pub async fn update(&self, session_id: &str, updates: Map<String, Value>) -> TcResult<Value> {
        self.client
            .put_json(
                &format!("sessions/{}.json", session_id),
                &wrap("session", updates),
            )
            .await
    }

    pub async fn delete(&self, session_id: &str) -> TcResult<Value> {
        let response = self
            .client
            .delete(&format!("sessions/{}.json", session_id))
            .await?;
        Ok(deleted(response, "Lesson", session_id))
    }
}
