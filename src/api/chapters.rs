//! Chapters, called sections by the API.

use serde_json::{Map, Value};
use std::sync::Arc;

use super::{deleted, wrap};
use crate::client::TrainerCentralClient;
use crate::error::TcResult;

#[derive(Debug, Clone)]
pub struct ChaptersApi {
    client: Arc<TrainerCentralClient>,
}

impl ChaptersApi {
    pub fn new(client: Arc<TrainerCentralClient>) -> Self {
        Self { client }
    }

    /// `section` must carry at least `courseId` and `name`
    pub async fn create(&self, section: Map<String, Value>) -> TcResult<Value> {
        self.client
            .post_json("sections.json", &wrap("section", section))
            .await
    }

    pub async fn get(&self, section_id: &str) -> TcResult<Value> {
        self.client
            .get(&format!("sections/{}.json", section_id), &[])
            .await
    }

    pub async fn list_for_course(&self, course_id: &str) -> TcResult<Value> {
        self.client
            .get(&format!("course/{}/sections.json", course_id), &[])
            .await
    }

    pub async fn update(
        &self,
        course_id: &str,
        section_id: &str,
        updates: Map<String, Value>,
    ) -> TcResult<Value> {
        self.client
            .put_json(
                &format!("course/{}/sections/{}.json", course_id, section_id),
                &wrap("section", updates),
            )
            .await
    }

    pub async fn delete(&self, course_id: &str, section_id: &str) -> TcResult<Value> {
        let response = self
            .client
            .delete(&format!("course/{}/sections/{}.json", course_id, section_id))
            .await?;
        Ok(deleted(response, "Chapter", section_id))
    }
}
