use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::AssignmentsApi;
use crate::error::TcResult;
use crate::mcp::tools::{Tool, ToolHandler, ToolRegistry};
use crate::utils::{sanitize_filename, Params};

pub(crate) fn register(registry: &mut ToolRegistry, api: &AssignmentsApi) {
    registry.register(Tool {
        name: "tc_create_assignment".to_string(),
        description: "Create an assignment under a course or chapter and attach rich-text instructions. assignment_data usually has name, courseId, sectionId and deliveryMode 7. Returns {\"assignment\": ..., \"instructions\": ...}".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "assignment_data": {
                    "type": "object",
                    "description": "Assignment session fields"
                },
                "instruction_html": {
                    "type": "string",
                    "description": "Instructions as HTML"
                },
                "instruction_filename": {
                    "type": "string",
                    "description": "Title of the instructions",
                    "default": "Instructions"
                },
                "view_type": {
                    "type": "integer",
                    "description": "Material view type",
                    "default": 4
                }
            },
            "required": ["assignment_data", "instruction_html"]
        }),
        handler: Arc::new(CreateAssignmentHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_delete_assignment".to_string(),
        description: "Permanently delete an assignment".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Assignment (session) ID"
                }
            },
            "required": ["session_id"]
        }),
        handler: Arc::new(DeleteAssignmentHandler { api: api.clone() }),
    });
}

#[derive(Debug)]
pub struct CreateAssignmentHandler {
    pub api: AssignmentsApi,
}

#[async_trait]
impl ToolHandler for CreateAssignmentHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let assignment = params.required_object("assignment_data")?;
        let html = params.required_str("instruction_html")?;
        let filename = sanitize_filename(
            params
                .optional_str("instruction_filename")?
                .unwrap_or("Instructions"),
        )?;
        let view_type = params.optional_u8("view_type")?;

        self.api
            .create_with_instructions(assignment, html, &filename, view_type)
            .await
    }
}

#[derive(Debug)]
pub struct DeleteAssignmentHandler {
    pub api: AssignmentsApi,
}

#[async_trait]
impl ToolHandler for DeleteAssignmentHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let session_id = Params::new(&args).required_id("session_id")?;
        self.api.delete(&session_id).await
    }
}
