use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::LessonsApi;
use crate::error::TcResult;
use crate::mcp::tools::{Tool, ToolHandler, ToolRegistry};
use crate::utils::{sanitize_filename, Params};

const DEFAULT_CONTENT_LABEL: &str = "Content";

pub(crate) fn register(registry: &mut ToolRegistry, api: &LessonsApi) {
    registry.register(Tool {
        name: "tc_create_lesson".to_string(),
        description: "Create a lesson under a course or chapter and upload its HTML content. Returns {\"lesson\": ..., \"content\": ...}".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_data": {
                    "type": "object",
                    "description": "Lesson metadata: name, courseId, sectionId, deliveryMode, ..."
                },
                "content_html": {
                    "type": "string",
                    "description": "Full HTML body of the lesson"
                },
                "content_filename": {
                    "type": "string",
                    "description": "Title of the uploaded content",
                    "default": DEFAULT_CONTENT_LABEL
                }
            },
            "required": ["session_data", "content_html"]
        }),
        handler: Arc::new(CreateLessonHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_get_lesson".to_string(),
        description: "Fetch a lesson (session) with its metadata".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Lesson (session) ID"
                }
            },
            "required": ["session_id"]
        }),
        handler: Arc::new(GetLessonHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_list_course_lessons".to_string(),
        description: "List all lessons (sessions) of a course".to_string(),
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
        handler: Arc::new(ListCourseLessonsHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_update_lesson".to_string(),
        description: "Update lesson metadata such as name or description".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Lesson (session) ID"
                },
                "updates": {
                    "type": "object",
                    "description": "Fields to change, sent as the 'session' object"
                }
            },
            "required": ["session_id", "updates"]
        }),
        handler: Arc::new(UpdateLessonHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_delete_lesson".to_string(),
        description: "Permanently delete a lesson".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Lesson (session) ID"
                }
            },
            "required": ["session_id"]
        }),
        handler: Arc::new(DeleteLessonHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_upload_lesson_content".to_string(),
        description: "Upload HTML content to an existing lesson as an additional material".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Lesson (session) ID"
                },
                "content_html": {
                    "type": "string",
                    "description": "HTML to upload"
                },
                "filename": {
                    "type": "string",
                    "description": "Title of the uploaded content",
                    "default": DEFAULT_CONTENT_LABEL
                }
            },
            "required": ["session_id", "content_html"]
        }),
        handler: Arc::new(UploadLessonContentHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_get_lesson_materials".to_string(),
        description: "List the materials attached to a lesson".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Lesson (session) ID"
                }
            },
            "required": ["session_id"]
        }),
        handler: Arc::new(GetLessonMaterialsHandler { api: api.clone() }),
    });
}

fn content_label(params: &Params<'_>, name: &str) -> TcResult<String> {
    let label = params.optional_str(name)?.unwrap_or(DEFAULT_CONTENT_LABEL);
    Ok(sanitize_filename(label)?)
}

#[derive(Debug)]
pub struct CreateLessonHandler {
    pub api: LessonsApi,
}

#[async_trait]
impl ToolHandler for CreateLessonHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let session = params.required_object("session_data")?;
        let html = params.required_str("content_html")?;
        let label = content_label(&params, "content_filename")?;
        self.api.create_with_content(session, html, &label).await
    }
}

#[derive(Debug)]
pub struct GetLessonHandler {
    pub api: LessonsApi,
}

#[async_trait]
impl ToolHandler for GetLessonHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let session_id = Params::new(&args).required_id("session_id")?;
        self.api.get(&session_id).await
    }
}

#[derive(Debug)]
pub struct ListCourseLessonsHandler {
    pub api: LessonsApi,
}

#[async_trait]
impl ToolHandler for ListCourseLessonsHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let course_id = Params::new(&args).required_id("course_id")?;
        self.api.list_for_course(&course_id).await
    }
}

#[derive(Debug)]
pub struct UpdateLessonHandler {
    pub api: LessonsApi,
}

#[async_trait]
impl ToolHandler for UpdateLessonHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let session_id = params.required_id("session_id")?;
        let updates = params.required_object("updates")?;
        self.api.update(&session_id, updates).await
    }
}

#[derive(Debug)]
pub struct DeleteLessonHandler {
    pub api: LessonsApi,
}

#[async_trait]
impl ToolHandler for DeleteLessonHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let session_id = Params::new(&args).required_id("session_id")?;
        self.api.delete(&session_id).await
    }
}

#[derive(Debug)]
pub struct UploadLessonContentHandler {
    pub api: LessonsApi,
}

#[async_trait]
impl ToolHandler for UploadLessonContentHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let session_id = params.required_id("session_id")?;
        let html = params.required_str("content_html")?;
        let label = content_label(&params, "filename")?;
        self.api.upload_content(&session_id, html, &label).await
    }
}

#[derive(Debug)]
pub struct GetLessonMaterialsHandler {
    pub api: LessonsApi,
}

#[async_trait]
impl ToolHandler for GetLessonMaterialsHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let session_id = Params::new(&args).required_id("session_id")?;
        self.api.materials(&session_id).await
    }
}
