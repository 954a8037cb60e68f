use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::{ListWindow, WorkshopsApi};
use crate::error::TcResult;
use crate::mcp::tools::{Tool, ToolHandler, ToolRegistry};
use crate::models::{SessionMember, MEMBER_ROLE_LEARNER, MEMBER_SOURCE_INVITE};
use crate::utils::Params;

pub(crate) fn register(registry: &mut ToolRegistry, api: &WorkshopsApi) {
    registry.register(Tool {
        name: "tc_create_workshop".to_string(),
        description: "Create a global live workshop (not tied to a course). session_data example: {\"name\": \"AI Masterclass\", \"scheduledTime\": 1732670000000, \"scheduledEndTime\": 1732673600000, \"description\": \"<div>...</div>\", \"sessionSettings\": {\"registrationRequired\": true, \"recurringType\": 0}}. deliveryMode defaults to 3".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_data": {
                    "type": "object",
                    "description": "Workshop fields; times are epoch milliseconds"
                }
            },
            "required": ["session_data"]
        }),
        handler: Arc::new(CreateWorkshopHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_update_workshop".to_string(),
        description: "Update a global workshop. Pass {\"isCancelled\": true} to cancel it".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Workshop (session) ID"
                },
                "updates": {
                    "type": "object",
                    "description": "Fields to change, sent as the 'session' object"
                }
            },
            "required": ["session_id", "updates"]
        }),
        handler: Arc::new(UpdateWorkshopHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_create_workshop_occurrence".to_string(),
        description: "Add an occurrence (talk) to a workshop, e.g. {\"sessionId\": \"...\", \"scheduledTime\": 1733000000000, \"scheduledEndTime\": 1733003600000, \"durationTime\": 3600000}".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "talk_data": {
                    "type": "object",
                    "description": "Talk fields; times are epoch milliseconds"
                }
            },
            "required": ["talk_data"]
        }),
        handler: Arc::new(CreateOccurrenceHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_update_workshop_occurrence".to_string(),
        description: "Reschedule or cancel ({\"isCancelled\": true}) a workshop occurrence".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "talk_id": {
                    "type": "string",
                    "description": "Occurrence (talk) ID"
                },
                "updates": {
                    "type": "object",
                    "description": "Fields to change, sent as the 'talk' object"
                }
            },
            "required": ["talk_id", "updates"]
        }),
        handler: Arc::new(UpdateOccurrenceHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_list_all_global_workshops".to_string(),
        description: "List upcoming global live workshops".to_string(),
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
                    "description": "Maximum number of workshops",
                    "default": 50
                },
                "si": {
                    "type": "integer",
                    "description": "Start index for pagination",
                    "default": 0
                }
            }
        }),
        handler: Arc::new(ListGlobalWorkshopsHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_invite_user_to_session".to_string(),
        description: "Invite an existing user by email to a live workshop session".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Workshop (session) ID"
                },
                "email": {
                    "type": "string",
                    "description": "Email of the user to invite"
                },
                "role": {
                    "type": "integer",
                    "description": "Session role, 3 = attendee",
                    "default": MEMBER_ROLE_LEARNER
                },
                "source": {
                    "type": "integer",
                    "description": "Invitation source code",
                    "default": MEMBER_SOURCE_INVITE
                }
            },
            "required": ["session_id", "email"]
        }),
        handler: Arc::new(InviteUserHandler { api: api.clone() }),
    });
}

/// Paging arguments shared by the upcoming-workshop listings
pub(crate) fn list_window(params: &Params<'_>) -> TcResult<ListWindow> {
    let defaults = ListWindow::default();
    Ok(ListWindow {
        filter: params.optional_u64("filter_type")?.unwrap_or(defaults.filter),
        limit: params.optional_u64("limit")?.unwrap_or(defaults.limit),
        si: params.optional_u64("si")?.unwrap_or(defaults.si),
    })
}

#[derive(Debug)]
pub struct CreateWorkshopHandler {
    pub api: WorkshopsApi,
}

#[async_trait]
impl ToolHandler for CreateWorkshopHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let session = Params::new(&args).required_object("session_data")?;
        self.api.create(session).await
    }
}

#[derive(Debug)]
pub struct UpdateWorkshopHandler {
    pub api: WorkshopsApi,
}

#[async_trait]
impl ToolHandler for UpdateWorkshopHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let session_id = params.required_id("session_id")?;
        let updates = params.required_object("updates")?;
        self.api.update(&session_id, updates).await
    }
}

#[derive(Debug)]
pub struct CreateOccurrenceHandler {
    pub api: WorkshopsApi,
}

#[async_trait]
impl ToolHandler for CreateOccurrenceHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let talk = Params::new(&args).required_object("talk_data")?;
        self.api.create_occurrence(talk).await
    }
}

#[derive(Debug)]
pub struct UpdateOccurrenceHandler {
    pub api: WorkshopsApi,
}

#[async_trait]
impl ToolHandler for UpdateOccurrenceHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let talk_id = params.required_id("talk_id")?;
        let updates = params.required_object("updates")?;
        self.api.update_occurrence(&talk_id, updates).await
    }
}

#[derive(Debug)]
pub struct ListGlobalWorkshopsHandler {
    pub api: WorkshopsApi,
}

#[async_trait]
impl ToolHandler for ListGlobalWorkshopsHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let window = list_window(&Params::new(&args))?;
        self.api.list_upcoming(window).await
    }
}

#[derive(Debug)]
pub struct InviteUserHandler {
    pub api: WorkshopsApi,
}

#[async_trait]
impl ToolHandler for InviteUserHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let member = SessionMember {
            email_id: params.required_str("email")?.trim().to_string(),
            session_id: params.required_id("session_id")?,
            role: params.optional_u8("role")?.unwrap_or(MEMBER_ROLE_LEARNER),
            source: params.optional_u8("source")?.unwrap_or(MEMBER_SOURCE_INVITE),
        };
        self.api.invite_user(member).await
    }
}
