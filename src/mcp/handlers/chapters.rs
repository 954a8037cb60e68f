use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::ChaptersApi;
use crate::error::TcResult;
use crate::mcp::tools::{Tool, ToolHandler, ToolRegistry};
use crate::utils::{require_field, Params};

pub(crate) fn register(registry: &mut ToolRegistry, api: &ChaptersApi) {
    registry.register(Tool {
        name: "tc_create_chapter".to_string(),
        description: "Create a chapter (section) in a course. section_data must contain courseId and name".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "section_data": {
                    "type": "object",
                    "description": "Chapter fields, at least {\"courseId\": \"...\", \"name\": \"...\"}"
                }
            },
            "required": ["section_data"]
        }),
        handler: Arc::new(CreateChapterHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_get_chapter".to_string(),
        description: "Fetch a single chapter by its section ID".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "section_id": {
                    "type": "string",
                    "description": "Chapter (section) ID"
                }
            },
            "required": ["section_id"]
        }),
        handler: Arc::new(GetChapterHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_list_course_chapters".to_string(),
        description: "List all chapters of a course".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "course_id": {
                    "type": "string",
                    "description": "Course ID"
                }
            },
            "required": ["course_id"]
        }),
        handler: Arc::new(ListCourseChaptersHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_update_chapter".to_string(),
        description: "Update a chapter of a course (e.g. rename it)".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "course_id": {
                    "type": "string",
                    "description": "Course ID"
                },
                "section_id": {
                    "type": "string",
                    "description": "Chapter (section) ID"
                },
                "updates": {
                    "type": "object",
                    "description": "Fields to change, sent as the 'section' object"
                }
            },
            "required": ["course_id", "section_id", "updates"]
        }),
        handler: Arc::new(UpdateChapterHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_delete_chapter".to_string(),
        description: "Delete a chapter from a course".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "course_id": {
                    "type": "string",
                    "description": "Course ID"
                },
                "section_id": {
                    "type": "string",
                    "description": "Chapter (section) ID"
                }
            },
            "required": ["course_id", "section_id"]
        }),
        handler: Arc::new(DeleteChapterHandler { api: api.clone() }),
    });
}

#[derive(Debug)]
pub struct CreateChapterHandler {
    pub api: ChaptersApi,
}

#[async_trait]
impl ToolHandler for CreateChapterHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let section = Params::new(&args).required_object("section_data")?;
        require_field(&section, "section_data", "courseId")?;
        require_field(&section, "section_data", "name")?;
        self.api.create(section).await
    }
}

#[derive(Debug)]
pub struct GetChapterHandler {
    pub api: ChaptersApi,
}

#[async_trait]
impl ToolHandler for GetChapterHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let section_id = Params::new(&args).required_id("section_id")?;
        self.api.get(&section_id).await
    }
}

#[derive(Debug)]
pub struct ListCourseChaptersHandler {
    pub api: ChaptersApi,
}

#[async_trait]
impl ToolHandler for ListCourseChaptersHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let course_id = Params::new(&args).required_id("course_id")?;
        self.api.list_for_course(&course_id).await
    }
}

#[derive(Debug)]
pub struct UpdateChapterHandler {
    pub api: ChaptersApi,
}

#[async_trait]
impl ToolHandler for UpdateChapterHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let course_id = params.required_id("course_id")?;
        let section_id = params.required_id("section_id")?;
        let updates = params.required_object("updates")?;
        self.api.update(&course_id, &section_id, updates).await
    }
}

#[derive(Debug)]
pub struct DeleteChapterHandler {
    pub api: ChaptersApi,
}

#[async_trait]
impl ToolHandler for DeleteChapterHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let course_id = params.required_id("course_id")?;
        let section_id = params.required_id("section_id")?;
        self.api.delete(&course_id, &section_id).await
    }
}
