//! Tool registry for MCP tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use super::handlers;
use crate::api::TrainerCentralApi;
use crate::error::{TcError, TcResult};

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "tc_get_course")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Validate the arguments, call TrainerCentral and return its JSON
    async fn execute(&self, args: Value) -> TcResult<Value>;
}

/// Registry for all MCP tools, ordered by name
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry holding the full TrainerCentral tool catalog
    pub fn new(api: &TrainerCentralApi) -> Self {
        let mut registry = Self::default();
        handlers::courses::register(&mut registry, &api.courses);
        handlers::chapters::register(&mut registry, &api.chapters);
        handlers::lessons::register(&mut registry, &api.lessons);
        handlers::assignments::register(&mut registry, &api.assignments);
        handlers::test_forms::register(&mut registry, &api.test_forms);
        handlers::workshops::register(&mut registry, &api.workshops);
        handlers::course_workshops::register(&mut registry, &api.course_workshops);
        tracing::debug!("Registered {} tools", registry.len());
        registry
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        if self.tools.insert(tool.name.clone(), tool).is_some() {
            tracing::warn!("Tool registered twice; keeping the later one");
        }
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> TcResult<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| TcError::validation(format!("Tool '{}' not found", name)))?;

        tracing::debug!(tool = %name, "Executing tool");
        match tool.handler.execute(args).await? {
            // empty 2xx body from the upstream
            Value::Null => Ok(serde_json::json!({"success": true})),
            result => Ok(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TrainerCentralClient;
    use crate::config::Settings;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let settings = Settings::from_lookup(|key| match key {
            "ZOHO_ACCESS_TOKEN" => Some("token".to_string()),
            "TRAINERCENTRAL_DOMAIN" => Some("http://127.0.0.1:9".to_string()),
            "TRAINERCENTRAL_ORG_ID" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();
        let client = Arc::new(TrainerCentralClient::new(settings).unwrap());
        ToolRegistry::new(&TrainerCentralApi::new(client))
    }

    #[test]
    fn test_full_catalog_is_registered() {
        let registry = registry();
        assert_eq!(registry.len(), 33);
        for name in [
            "tc_create_course",
            "tc_list_course_chapters",
            "tc_upload_lesson_content",
            "tc_create_full_test",
            "tc_get_course_sessions",
            "tc_list_all_global_workshops",
            "tc_create_course_live_session",
            "invite_learner_to_course_or_course_live_session",
        ] {
            assert!(registry.get(name).is_some(), "missing tool {}", name);
        }
    }

    #[test]
    fn test_schemas_list_declared_required_properties() {
        for tool in registry().all() {
            let schema = &tool.input_schema;
            assert_eq!(schema["type"], "object", "{}", tool.name);
            let properties = schema["properties"].as_object().unwrap();
            if let Some(required) = schema.get("required").and_then(Value::as_array) {
                for field in required {
                    let field = field.as_str().unwrap();
                    assert!(
                        properties.contains_key(field),
                        "{} requires undeclared '{}'",
                        tool.name,
                        field
                    );
                }
            }
            assert!(!tool.description.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_validation_error() {
        let err = registry()
            .execute("tc_launch_rocket", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_missing_parameters_rejected_before_http() {
        let registry = registry();
        let cases = [
            ("tc_get_course", json!({})),
            ("tc_update_course", json!({"course_id": "1"})),
            ("tc_create_chapter", json!({"section_data": {"name": "no course"}})),
            ("tc_delete_chapter", json!({"course_id": "1"})),
            ("tc_create_lesson", json!({"session_data": {}})),
            ("tc_create_assignment", json!({"assignment_data": {"name": "A"}})),
            ("tc_add_test_questions", json!({"session_id": "1", "questions": {"field": []}})),
            ("tc_invite_user_to_session", json!({"session_id": "1"})),
            ("tc_update_workshop_occurrence", json!({"talk_id": "1", "updates": "cancel"})),
            (
                "tc_create_course_live_session",
                json!({
                    "course_id": "1",
                    "name": "Live",
                    "description_html": "",
                    "start_time": "2025-11-29 16:30",
                    "end_time": "29-11-2025 5:30PM"
                }),
            ),
            (
                "invite_learner_to_course_or_course_live_session",
                json!({"email": "a@b.c", "first_name": "A", "last_name": "B"}),
            ),
            ("tc_get_lesson", json!({"session_id": "../../portals"})),
        ];

        for (name, args) in cases {
            let err = registry.execute(name, args).await.unwrap_err();
            assert_eq!(
                err.kind(),
                ErrorKind::ValidationError,
                "{} returned {:?}",
                name,
                err
            );
        }
    }
}
