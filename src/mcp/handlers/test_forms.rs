use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::TestFormsApi;
use crate::error::{TcError, TcResult};
use crate::mcp::tools::{Tool, ToolHandler, ToolRegistry};
use crate::utils::Params;

const QUESTION_FORMAT: &str = "Questions document {\"field\": [...]}. Each field has fieldType (2 = single/multiple choice with selectionType 0/1, 7 = true/false, 8 = fill in the blanks, 16 = essay), label (HTML), score, and the matching multipleChoice / fillInBlank / essay block. A bare array is wrapped as {\"field\": [...]}";

pub(crate) fn register(registry: &mut ToolRegistry, api: &TestFormsApi) {
    registry.register(Tool {
        name: "tc_create_test_form".to_string(),
        description: "Create an empty test form under a lesson. The response's form.formIdValue is needed to add questions".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Lesson (session) ID"
                },
                "name": {
                    "type": "string",
                    "description": "Test title"
                },
                "description_html": {
                    "type": "string",
                    "description": "Test instructions as HTML"
                }
            },
            "required": ["session_id", "name", "description_html"]
        }),
        handler: Arc::new(CreateTestFormHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_add_test_questions".to_string(),
        description: "Add questions to an existing test form".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Lesson (session) ID"
                },
                "form_id_value": {
                    "type": "string",
                    "description": "form.formIdValue returned by tc_create_test_form"
                },
                "questions": {
                    "type": ["object", "array"],
                    "description": QUESTION_FORMAT
                }
            },
            "required": ["session_id", "form_id_value", "questions"]
        }),
        handler: Arc::new(AddTestQuestionsHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_create_full_test".to_string(),
        description: "Create a complete test under a lesson: creates the form, then adds the questions. Returns {\"form\": ..., \"questions\": ...}".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Lesson (session) ID"
                },
                "name": {
                    "type": "string",
                    "description": "Test title"
                },
                "description_html": {
                    "type": "string",
                    "description": "Test instructions as HTML"
                },
                "questions": {
                    "type": ["object", "array"],
                    "description": QUESTION_FORMAT
                }
            },
            "required": ["session_id", "name", "description_html", "questions"]
        }),
        handler: Arc::new(CreateFullTestHandler { api: api.clone() }),
    });

    registry.register(Tool {
        name: "tc_get_course_sessions".to_string(),
        description: "List the sessions (lessons) of a course with their IDs and test links, to pick where a test goes".to_string(),
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
        handler: Arc::new(GetCourseSessionsHandler { api: api.clone() }),
    });
}

/// Accept `{"field": [...]}` or a bare array of fields
fn questions_document(params: &Params<'_>) -> TcResult<Value> {
    match params.required_array("questions") {
        Ok(fields) => Ok(json!({ "field": fields })),
        Err(_) => {
            let doc = params.required_object("questions")?;
            if !doc.get("field").is_some_and(Value::is_array) {
                return Err(TcError::validation(
                    "'questions' must contain a 'field' array",
                ));
            }
            Ok(Value::Object(doc))
        }
    }
}

#[derive(Debug)]
pub struct CreateTestFormHandler {
    pub api: TestFormsApi,
}

#[async_trait]
impl ToolHandler for CreateTestFormHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let session_id = params.required_id("session_id")?;
        let name = params.required_str("name")?;
        let description = params.required_str("description_html")?;
        self.api.create_form(&session_id, name, description).await
    }
}

#[derive(Debug)]
pub struct AddTestQuestionsHandler {
    pub api: TestFormsApi,
}

#[async_trait]
impl ToolHandler for AddTestQuestionsHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let session_id = params.required_id("session_id")?;
        let form_id_value = params.required_id("form_id_value")?;
        let questions = questions_document(&params)?;
        self.api
            .add_questions(&session_id, &form_id_value, &questions)
            .await
    }
}

#[derive(Debug)]
pub struct CreateFullTestHandler {
    pub api: TestFormsApi,
}

#[async_trait]
impl ToolHandler for CreateFullTestHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let params = Params::new(&args);
        let session_id = params.required_id("session_id")?;
        let name = params.required_str("name")?;
        let description = params.required_str("description_html")?;
        let questions = questions_document(&params)?;
        self.api
            .create_full_test(&session_id, name, description, &questions)
            .await
    }
}

#[derive(Debug)]
pub struct GetCourseSessionsHandler {
    pub api: TestFormsApi,
}

#[async_trait]
impl ToolHandler for GetCourseSessionsHandler {
    async fn execute(&self, args: Value) -> TcResult<Value> {
        let course_id = Params::new(&args).required_id("course_id")?;
        let sessions = self.api.course_sessions(&course_id).await?;
        Ok(serde_json::to_value(sessions)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_document_shapes() {
        let bare = json!({"questions": [{"fieldType": 7}]});
        assert_eq!(
            questions_document(&Params::new(&bare)).unwrap(),
            json!({"field": [{"fieldType": 7}]})
        );

        let wrapped = json!({"questions": {"field": [{"fieldType": 16}]}});
        assert_eq!(
            questions_document(&Params::new(&wrapped)).unwrap(),
            json!({"field": [{"fieldType": 16}]})
        );

        let wrong = json!({"questions": {"fields": []}});
        assert!(questions_document(&Params::new(&wrong)).is_err());

        let missing = json!({});
        assert!(matches!(
            questions_document(&Params::new(&missing)),
            Err(TcError::Validation(_))
        ));
    }
}
