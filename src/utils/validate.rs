//! Validation of tool parameters before they reach a URL or request body.
//!
//! Identifiers end up as URL path segments, so anything that could escape the
//! segment (separators, traversal, query characters) is rejected here.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::TcError;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("missing required parameter '{0}'")]
    Missing(String),

    #[error("parameter '{name}' must be {expected}")]
    WrongType { name: String, expected: &'static str },

    #[error("invalid {name}: {reason}")]
    InvalidId { name: String, reason: String },

    #[error("invalid filename: contains disallowed characters")]
    InvalidFilename,

    #[error("path traversal detected in '{0}'")]
    PathTraversal(String),
}

impl From<ValidationError> for TcError {
    fn from(err: ValidationError) -> Self {
        TcError::Validation(err.to_string())
    }
}

/// Validate an identifier used as a URL path segment.
///
/// Numbers are accepted as well as strings, since TrainerCentral ids are
/// often passed through as JSON numbers.
pub fn sanitize_resource_id(name: &str, value: &Value) -> Result<String, ValidationError> {
    let id = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => return Err(ValidationError::Missing(name.to_string())),
        _ => {
            return Err(ValidationError::WrongType {
                name: name.to_string(),
                expected: "a string or number",
            })
        }
    };

    if id.is_empty() {
        return Err(ValidationError::Missing(name.to_string()));
    }

    if id.contains("..") {
        return Err(ValidationError::PathTraversal(id));
    }

    if let Some(ch) = id
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
    {
        return Err(ValidationError::InvalidId {
            name: name.to_string(),
            reason: format!("contains disallowed character {:?}", ch),
        });
    }

    Ok(id)
}

/// Sanitize a filename stem for uploaded lesson material
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let filename = filename.trim();

    if filename.is_empty() {
        return Err(ValidationError::InvalidFilename);
    }

    if filename.contains("..")
        || filename.starts_with('/')
        || filename.starts_with('\\')
        || filename.contains(":/")
        || filename.contains(":\\")
    {
        return Err(ValidationError::PathTraversal(filename.to_string()));
    }

    // Keep only safe characters: alphanumeric, dash, underscore, dot, space
    let mut sanitized: String = filename
        .chars()
        .filter(|ch| ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.' | ' '))
        .collect();

    const MAX_FILENAME_LENGTH: usize = 200;
    if sanitized.chars().count() > MAX_FILENAME_LENGTH {
        sanitized = sanitized.chars().take(MAX_FILENAME_LENGTH).collect();
    }

    let sanitized = sanitized.trim().to_string();
    if sanitized.is_empty() {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(sanitized)
}

/// Typed view over a tool's JSON arguments
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    args: &'a Value,
}

impl<'a> Params<'a> {
    pub fn new(args: &'a Value) -> Self {
        Self { args }
    }

    fn raw(&self, name: &str) -> Option<&'a Value> {
        self.args.get(name).filter(|v| !v.is_null())
    }

    /// Required non-empty string
    pub fn required_str(&self, name: &str) -> Result<&'a str, ValidationError> {
        match self.raw(name) {
            None => Err(ValidationError::Missing(name.to_string())),
            Some(Value::String(s)) if s.trim().is_empty() => {
                Err(ValidationError::Missing(name.to_string()))
            }
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(ValidationError::WrongType {
                name: name.to_string(),
                expected: "a string",
            }),
        }
    }

    pub fn optional_str(&self, name: &str) -> Result<Option<&'a str>, ValidationError> {
        match self.raw(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(ValidationError::WrongType {
                name: name.to_string(),
                expected: "a string",
            }),
        }
    }

    /// Required identifier, safe to embed in a URL path
    pub fn required_id(&self, name: &str) -> Result<String, ValidationError> {
        match self.raw(name) {
            Some(value) => sanitize_resource_id(name, value),
            None => Err(ValidationError::Missing(name.to_string())),
        }
    }

    pub fn optional_id(&self, name: &str) -> Result<Option<String>, ValidationError> {
        match self.raw(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(value) => sanitize_resource_id(name, value).map(Some),
        }
    }

    /// Required JSON object, returned as an owned map for body building
    pub fn required_object(&self, name: &str) -> Result<Map<String, Value>, ValidationError> {
        match self.raw(name) {
            None => Err(ValidationError::Missing(name.to_string())),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(ValidationError::WrongType {
                name: name.to_string(),
                expected: "an object",
            }),
        }
    }

    pub fn required_array(&self, name: &str) -> Result<Vec<Value>, ValidationError> {
        match self.raw(name) {
            None => Err(ValidationError::Missing(name.to_string())),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(ValidationError::WrongType {
                name: name.to_string(),
                expected: "an array",
            }),
        }
    }

    pub fn optional_u64(&self, name: &str) -> Result<Option<u64>, ValidationError> {
        match self.raw(name) {
            None => Ok(None),
            Some(v) => v.as_u64().map(Some).ok_or(ValidationError::WrongType {
                name: name.to_string(),
                expected: "a non-negative integer",
            }),
        }
    }

    /// Small enum-like codes (`role`, `source`, `view_type`)
    pub fn optional_u8(&self, name: &str) -> Result<Option<u8>, ValidationError> {
        match self.optional_u64(name)? {
            None => Ok(None),
            Some(v) => u8::try_from(v).map(Some).map_err(|_| ValidationError::WrongType {
                name: name.to_string(),
                expected: "an integer between 0 and 255",
            }),
        }
    }

    pub fn optional_i64(&self, name: &str) -> Result<Option<i64>, ValidationError> {
        match self.raw(name) {
            None => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or(ValidationError::WrongType {
                name: name.to_string(),
                expected: "an integer",
            }),
        }
    }

    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>, ValidationError> {
        match self.raw(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(ValidationError::WrongType {
                name: name.to_string(),
                expected: "a boolean",
            }),
        }
    }
}

/// Ensure a required key is present inside a nested payload object
pub fn require_field(
    object: &Map<String, Value>,
    object_name: &str,
    field: &str,
) -> Result<(), ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::Missing(format!(
            "{}.{}",
            object_name, field
        ))),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::Missing(format!(
            "{}.{}",
            object_name, field
        ))),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_resource_id_valid() {
        assert_eq!(
            sanitize_resource_id("course_id", &json!("19208000000123")).unwrap(),
            "19208000000123"
        );
        assert_eq!(
            sanitize_resource_id("course_id", &json!(42)).unwrap(),
            "42"
        );
        assert_eq!(
            sanitize_resource_id("form_id_value", &json!(" abc-12_x ")).unwrap(),
            "abc-12_x"
        );
    }

    #[test]
    fn test_sanitize_resource_id_rejects_path_escape() {
        assert!(matches!(
            sanitize_resource_id("course_id", &json!("../portals")),
            Err(ValidationError::PathTraversal(_))
        ));
        assert!(sanitize_resource_id("course_id", &json!("1/2")).is_err());
        assert!(sanitize_resource_id("course_id", &json!("1.json?x=1")).is_err());
        assert!(sanitize_resource_id("course_id", &json!("1 2")).is_err());
    }

    #[test]
    fn test_sanitize_resource_id_empty_or_wrong_type() {
        assert_eq!(
            sanitize_resource_id("course_id", &json!("  ")),
            Err(ValidationError::Missing("course_id".to_string()))
        );
        assert!(matches!(
            sanitize_resource_id("course_id", &json!({"id": 1})),
            Err(ValidationError::WrongType { .. })
        ));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Intro Notes").unwrap(), "Intro Notes");
        assert_eq!(sanitize_filename("week;1").unwrap(), "week1");
        assert!(sanitize_filename("../etc/passwd").is_err());
        assert!(sanitize_filename("/etc/passwd").is_err());
        assert!(sanitize_filename(";;").is_err());
    }

    #[test]
    fn test_params_required_and_optional() {
        let args = json!({
            "name": "Week 1",
            "blank": "",
            "limit": 10,
            "flag": true,
            "data": {"name": "x"},
            "items": [1, 2]
        });
        let p = Params::new(&args);

        assert_eq!(p.required_str("name").unwrap(), "Week 1");
        assert_eq!(
            p.required_str("blank"),
            Err(ValidationError::Missing("blank".to_string()))
        );
        assert!(matches!(
            p.required_str("limit"),
            Err(ValidationError::WrongType { .. })
        ));
        assert_eq!(p.optional_str("absent").unwrap(), None);
        assert_eq!(p.optional_u64("limit").unwrap(), Some(10));
        assert_eq!(p.optional_bool("flag").unwrap(), Some(true));
        assert!(p.optional_bool("name").is_err());
        assert_eq!(p.required_object("data").unwrap()["name"], "x");
        assert!(p.required_object("items").is_err());
        assert_eq!(p.required_array("items").unwrap().len(), 2);
    }

    #[test]
    fn test_require_field_in_payload() {
        let obj = json!({"courseId": "1", "name": " "});
        let map = obj.as_object().unwrap();
        assert!(require_field(map, "section_data", "courseId").is_ok());
        assert_eq!(
            require_field(map, "section_data", "name"),
            Err(ValidationError::Missing("section_data.name".to_string()))
        );
    }

    #[test]
    fn test_validation_error_maps_to_tc_error() {
        let err: TcError = ValidationError::Missing("course_id".to_string()).into();
        assert!(matches!(err, TcError::Validation(ref m) if m.contains("course_id")));
    }
}
