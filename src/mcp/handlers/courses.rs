use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::CoursesApi;
use crate::error::TcResult;
use crate::mcp::tools::{Tool, ToolHandler, ToolRegistry};
use crate::utils::Params;

pub(crate) fn register(registry: &mut ToolRegistry, api: &CoursesApi) {
    registry.register(Tool {
        name: "tc_create_course".to_string(),
        description: "Create a new TrainerCentral course. course_data is sent as the 'course' object, e.g. {\"courseName\": \"My Course\", \"subTitle\": \"...\", \"description\": \"...\", \"courseCategories\": [{\"categoryName\": \"Business\"}]}".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "course_data": {
                    "type": "object",
                    "description": "Course fields such as courseName, subTitle, description, courseCategories"
                }
            },
            "required": ["course_data"]
        }),
        handler: Arc::new(CreateCourseHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_get_course".to_string(),
        description: "Fetch the details of a single course, including links to its sessions".to_string(),
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
        handler: Arc::new(GetCourseHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_list_courses".to_string(),
        description: "List courses in the academy, optionally paginated with limit and si (start index)".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of courses to return"
                },
                "si": {
                    "type": "integer",
                    "description": "Start index for pagination"
                }
            }
        }),
        handler: Arc::new(ListCoursesHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_update_course".to_string(),
        description: "Update fields of an existing course (e.g. courseName, subTitle, description)".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "course_id": {
                    "type": "string",
                    "description": "Course ID"
                },
                "updates": {
                    "type": "object",
                    "description": "Fields to change, sent as the 'course' object"
                }
            },
            "required": ["course_id", "updates"]
        }),
        handler: Arc::new(UpdateCourseHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_delete_course".to_string(),
        description: "Permanently delete a course".to_string(),
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
        handler: Arc::new(DeleteCourseHandler { api: api.clone() }),
    });
}

#[derive(Debug)]
pub struct CreateCourseHandler {
    pub api: CoursesApi,
}

#[async_trait]
impl ToolHandler for CreateCourseHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let course = Params::new(&args).required_object("course_data")?;
        self.api.create(course).await
    }
}

#[derive(Debug)]
pub struct GetCourseHandler {
    pub api: CoursesApi,
}

#[async_trait]
impl ToolHandler for GetCourseHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let course_id = Params::new(&args).required_id("course_id")?;
        self.api.get(&course_id).await
    }
}

#[derive(Debug)]
pub struct ListCoursesHandler {
    pub api: CoursesApi,
}

#[async_trait]
impl ToolHandler for ListCoursesHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let limit = params.optional_u64("limit")?;
        let si = params.optional_u64("si")?;
        self.api.list(limit, si).await
    }
}

#[derive(Debug)]
pub struct UpdateCourseHandler {
    pub api: CoursesApi,
}

#[async_trait]
impl ToolHandler for UpdateCourseHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let course_id = params.required_id("course_id")?;
        let updates = params.required_object("updates")?;
        self.api.update(&course_id, updates).await
    }
}

#[derive(Debug)]
pub struct DeleteCourseHandler {
    pub api: CoursesApi,
}

#[async_trait]
impl ToolHandler for DeleteCourseHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let course_id = Params::new(&args).required_id("course_id")?;
        self.api.delete(&course_id).await
    }
}
