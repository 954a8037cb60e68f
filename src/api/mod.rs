//! Typed wrappers over the TrainerCentral REST resources.
//!
//! Each wrapper only builds paths and bodies; authentication, retries on 401
//! and error mapping live in [`TrainerCentralClient`].

mod assignments;
mod chapters;
mod course_workshops;
mod courses;
mod lessons;
mod test_forms;
mod workshops;

pub use assignments::AssignmentsApi;
pub use chapters::ChaptersApi;
pub use course_workshops::CourseWorkshopsApi;
pub use courses::CoursesApi;
pub use lessons::LessonsApi;
pub use test_forms::TestFormsApi;
pub use workshops::{ListWindow, WorkshopsApi};

use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::client::TrainerCentralClient;

/// All resource APIs over one shared client
#[derive(Debug, Clone)]
pub struct TrainerCentralApi {
    pub courses: CoursesApi,
    pub chapters: ChaptersApi,
    pub lessons: LessonsApi,
    pub assignments: AssignmentsApi,
    pub test_forms: TestFormsApi,
    pub workshops: WorkshopsApi,
    pub course_workshops: CourseWorkshopsApi,
}

impl TrainerCentralApi {
    pub fn new(client: Arc<TrainerCentralClient>) -> Self {
        Self {
            courses: CoursesApi::new(Arc::clone(&client)),
            chapters: ChaptersApi::new(Arc::clone(&client)),
            lessons: LessonsApi::new(Arc::clone(&client)),
            assignments: AssignmentsApi::new(Arc::clone(&client)),
            test_forms: TestFormsApi::new(Arc::clone(&client)),
            workshops: WorkshopsApi::new(Arc::clone(&client)),
            course_workshops: CourseWorkshopsApi::new(client),
        }
    }
}

/// `{"<key>": {...}}`, the envelope every TrainerCentral write expects
pub(crate) fn wrap(key: &str, fields: Map<String, Value>) -> Value {
    let mut body = Map::new();
    body.insert(key.to_string(), Value::Object(fields));
    Value::Object(body)
}

/// Replace an empty delete response with an explicit success object
pub(crate) fn deleted(response: Value, what: &str, id: &str) -> Value {
    if response.is_null() {
        json!({
            "success": true,
            "message": format!("{} {} deleted", what, id),
            "id": id,
        })
    } else {
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_nests_fields() {
        let mut fields = Map::new();
        fields.insert("name".into(), json!("Rust 101"));
        assert_eq!(wrap("course", fields), json!({"course": {"name": "Rust 101"}}));
    }

    #[test]
    fn test_deleted_synthesizes_only_for_empty_body() {
        let synthesized = deleted(Value::Null, "Course", "9");
        assert_eq!(synthesized["success"], true);
        assert_eq!(synthesized["id"], "9");
        assert_eq!(synthesized["message"], "Course 9 deleted");

        let upstream = json!({"status": "deleted"});
        assert_eq!(deleted(upstream.clone(), "Course", "9"), upstream);
    }
}
