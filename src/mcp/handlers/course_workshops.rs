use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::workshops::list_window;
use crate::api::CourseWorkshopsApi;
use crate::error::TcResult;
use crate::mcp::tools::{Tool, ToolHandler, ToolRegistry};
use crate::models::{CourseAttendee, LiveSession};
use crate::utils::{Params, ScheduleWindow, WORKSHOP_TIME_FORMAT};

pub(crate) fn register(registry: &mut ToolRegistry, api: &CourseWorkshopsApi) {
    registry.register(Tool {
        name: "tc_create_course_live_session".to_string(),
        description: format!(
            "Create a live workshop inside a course. start_time and end_time must be {} (e.g. 29-11-2025 4:30PM), read in the server's local time zone",
            WORKSHOP_TIME_FORMAT
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "course_id": {
                    "type": "string",
                    "description": "Course ID"
                },
                "name": {
                    "type": "string",
                    "description": "Session title"
                },
                "description_html": {
                    "type": "string",
                    "description": "Session description as HTML"
                },
                "start_time": {
                    "type": "string",
                    "description": WORKSHOP_TIME_FORMAT
                },
                "end_time": {
                    "type": "string",
                    "description": WORKSHOP_TIME_FORMAT
                }
            },
            "required": ["course_id", "name", "description_html", "start_time", "end_time"]
        }),
        handler: Arc::new(CreateCourseLiveSessionHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_list_course_live_sessions".to_string(),
        description: "List upcoming live sessions across courses".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "filter_type": {
                    "type": "integer",
                    "description": "1 = your upcoming, 5 = all upcoming",
                    "default": 5
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of sessions",
                    "default": 50
                },
                "si": {
                    "type": "integer",
                    "description": "Start index for pagination",
                    "default": 0
                }
            }
        }),
        handler: Arc::new(ListCourseLiveSessionsHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_delete_course_live_session".to_string(),
        description: "Delete a live session of a course".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Live session ID"
                }
            },
            "required": ["session_id"]
        }),
        handler: Arc::new(DeleteCourseLiveSessionHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "invite_learner_to_course_or_course_live_session".to_string(),
        description: "Enroll a learner into a course, or into a live session of a course. Provide course_id or session_id".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "email": {
                    "type": "string",
                    "description": "Learner email"
                },
                "first_name": {
                    "type": "string",
                    "description": "Learner first name"
                },
                "last_name": {
                    "type": "string",
                    "description": "Learner last name"
                },
                "course_id": {
                    "type": "string",
                    "description": "Course to enroll into"
                },
                "session_id": {
                    "type": "string",
                    "description": "Course live session to enroll into"
                },
                "is_access_granted": {
                    "type": "boolean",
                    "description": "Grant access immediately",
                    "default": true
                },
                "expiry_time": {
                    "type": "integer",
                    "description": "Access expiry in epoch milliseconds"
                },
                "expiry_duration": {
                    "type": "string",
                    "description": "Access duration as accepted by TrainerCentral"
                }
            },
            "required": ["email", "first_name", "last_name"]
        }),
        handler: Arc::new(InviteLearnerHandler { api: api.clone() }),
    });
}

#[derive(Debug)]
pub struct CreateCourseLiveSessionHandler {
    pub api: CourseWorkshopsApi,
}

#[async_trait]
impl ToolHandler for CreateCourseLiveSessionHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let course_id = params.required_id("course_id")?;
        let name = params.required_str("name")?;
        let description = params.required_str("description_html")?;
        let window = ScheduleWindow::from_strings(
            params.required_str("start_time")?,
            params.required_str("end_time")?,
        )?;

        let session = LiveSession::new(
            name,
            description,
            course_id,
            window.start_ms,
            window.end_ms,
        );
        self.api.create_live_session(&session).await
    }
}

#[derive(Debug)]
pub struct ListCourseLiveSessionsHandler {
    pub api: CourseWorkshopsApi,
}

#[async_trait]
impl ToolHandler for ListCourseLiveSessionsHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let window = list_window(&Params::new(&args))?;
        self.api.list_upcoming(window).await
    }
}

#[derive(Debug)]
pub struct DeleteCourseLiveSessionHandler {
    pub api: CourseWorkshopsApi,
}

#[async_trait]
impl ToolHandler for DeleteCourseLiveSessionHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let session_id = Params::new(&args).required_id("session_id")?;
        self.api.delete_live_session(&session_id).await
    }
}

#[derive(Debug)]
pub struct InviteLearnerHandler {
    pub api: CourseWorkshopsApi,
}

#[async_trait]
impl ToolHandler for InviteLearnerHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let attendee = CourseAttendee {
            email: params.required_str("email")?.trim().to_string(),
            first_name: params.required_str("first_name")?.to_string(),
            last_name: params.required_str("last_name")?.to_string(),
            is_access_granted: params.optional_bool("is_access_granted")?.unwrap_or(true),
            course_id: params.optional_id("course_id")?,
            session_id: params.optional_id("session_id")?,
            expiry_time: params.optional_i64("expiry_time")?,
            expiry_duration: params.optional_str("expiry_duration")?.map(str::to_string),
        };
        attendee.check_target()?;
        self.api.invite_learner(&attendee).await
    }
}
