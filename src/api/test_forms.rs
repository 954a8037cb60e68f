//! Tests (assessment forms) attached to a session, and course session listing.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::client::TrainerCentralClient;
use crate::error::{TcError, TcResult};
use crate::models::{id_string, CourseRef, CourseSessions, SessionSummary};

/// Form `type` TrainerCentral uses for tests
const FORM_TYPE_TEST: u8 = 3;

#[derive(Debug, Clone)]
pub struct TestFormsApi {
    client: Arc<TrainerCentralClient>,
}

impl TestFormsApi {
    pub fn new(client: Arc<TrainerCentralClient>) -> Self {
        Self { client }
    }

    fn type_query() -> [(&'static str, String); 1] {
        [("type", FORM_TYPE_TEST.to_string())]
    }

    /// Create an empty test form. The response carries `form.formIdValue`,
    /// which is what questions are added against.
    pub async fn create_form(
        &self,
        session_id: &str,
        name: &str,
        description_html: &str,
    ) -> TcResult<Value> {
        let body = json!({
            "form": {
                "name": name,
                "description": description_html,
                "sessionId": session_id,
                "type": FORM_TYPE_TEST,
            }
        });
        self.client
            .post_json_with_query(
                &format!("session/{}/forms.json", session_id),
                &Self::type_query(),
                &body,
            )
            .await
    }

    /// `questions` is the `{"field": [...]}` document, sent as is
    pub async fn add_questions(
        &self,
        session_id: &str,
        form_id_value: &str,
        questions: &Value,
    ) -> TcResult<Value> {
        self.client
            .post_json_with_query(
                &format!("session/{}/form/{}/fields.json", session_id, form_id_value),
                &Self::type_query(),
                questions,
            )
            .await
    }

    /// Create the form and add the questions in one call.
    /// Returns `{"form": ..., "questions": ...}`.
    pub async fn create_full_test(
        &self,
        session_id: &str,
        name: &str,
        description_html: &str,
        questions: &Value,
    ) -> TcResult<Value> {
        let form = self.create_form(session_id, name, description_html).await?;
        let form_id_value = form
            .pointer("/form/formIdValue")
            .and_then(id_string)
            .ok_or_else(|| {
                TcError::UnexpectedResponse(format!(
                    "test form created but no form.formIdValue in response: {}",
                    form
                ))
            })?;

        let added = self
            .add_questions(session_id, &form_id_value, questions)
            .await?;
        Ok(json!({ "form": form, "questions": added }))
    }

    /// Fetch the course, follow `course.links.sessions` and condense each session.
    pub async fn course_sessions(&self, course_id: &str) -> TcResult<CourseSessions> {
        let course_response = self
            .client
            .get(&format!("courses/{}.json", course_id), &[])
            .await?;

        let course = course_response.get("course").ok_or_else(|| {
            TcError::UnexpectedResponse(format!(
                "'course' missing in response: {}",
                course_response
            ))
        })?;

        let link = course
            .pointer("/links/sessions")
            .and_then(Value::as_str)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| {
                TcError::UnexpectedResponse(format!(
                    "course {} has no sessions link",
                    course_id
                ))
            })?;

        let sessions_response = self.client.get_link(link).await?;
        let sessions = sessions_response
            .get("sessions")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(SessionSummary::from_raw).collect())
            .unwrap_or_default();

        Ok(CourseSessions {
            course: CourseRef {
                course_id: course.get("courseId").cloned().unwrap_or(Value::Null),
                name: course
                    .get("courseName")
                    .or_else(|| course.get("name"))
                    .cloned()
                    .unwrap_or(Value::Null),
            },
            sessions,
            raw: sessions_response,
        })
    }
}
