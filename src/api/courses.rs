//! Courses: `/courses.json` and `/courses/{id}.json`.

use serde_json::{Map, Value};
use std::sync::Arc;

use super::{deleted, wrap};
use crate::client::TrainerCentralClient;
use crate::error::TcResult;

#[derive(Debug, Clone)]
pub struct CoursesApi {
    client: Arc<TrainerCentralClient>,
}

impl CoursesApi {
    pub fn new(client: Arc<TrainerCentralClient>) -> Self {
        Self { client }
    }

    pub async fn create(&self, course: Map<String, Value>) -> TcResult<Value> {
        self.client
            .post_json("courses.json", &wrap("course", course))
            .await
    }

    pub async fn get(&self, course_id: &str) -> TcResult<Value> {
        self.client
            .get(&format!("courses/{}.json", course_id), &[])
            .await
    }

    /// List courses; `limit` and `si` (start index) are sent only when given
    pub async fn list(&self, limit: Option<u64>, si: Option<u64>) -> TcResult<Value> {
        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(si) = si {
            query.push(("si", si.to_string()));
        }
        self.client.get("courses.json", &query).await
    }

    pub async fn update(&self, course_id: &str, updates: Map<String, Value>) -> TcResult<Value> {
        self.client
            .put_json(&format!("courses/{}.json", course_id), &wrap("course", updates))
            .await
    }

    pub async fn delete(&self, course_id: &str) -> TcResult<Value> {
        let response = self
            .client
            .delete(&format!("courses/{}.json", course_id))
            .await?;
        Ok(deleted(response, "Course", course_id))
    }
}
