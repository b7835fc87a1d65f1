//! Tests authored by professors and their assignment to classes.

use chrono::{DateTime, Utc};
use eduzas_core::serde::{deserialize_nullable, deserialize_optional_uuid};
use eduzas_core::{PaginationParams, StringQuery};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::value_types::HexColor;

pub const MAX_TIME_LIMIT_MINUTES: i32 = 600;

/// Documents stored for tests, answers and resources must be JSON objects or arrays.
pub fn validate_document(content: &Value) -> Result<(), ValidationError> {
    if content.is_object() || content.is_array() {
        return Ok(());
    }
    let mut error = ValidationError::new("document");
    error.message = Some("content must be a JSON object or array".into());
    Err(error)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Test {
    pub id: Uuid,
    pub title: String,
    pub color: HexColor,
    #[schema(value_type = Object)]
    pub content: Json<Value>,
    pub time_limit_minutes: Option<i32>,
    pub professor_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Assignment row between a test and a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassTest {
    pub test_id: Uuid,
    pub class_id: String,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
}

/// A test listed under a class, with its visibility there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TestInClass {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub test: Test,
    pub visible: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTestDto {
    #[validate(length(min = 1, max = 100, message = "title must be 1-100 characters"))]
    pub title: String,
    pub color: Option<HexColor>,
    #[validate(custom(function = "validate_document"))]
    #[schema(value_type = Object)]
    pub content: Value,
    #[validate(range(min = 1, max = 600, message = "time_limit_minutes must be 1-600"))]
    pub time_limit_minutes: Option<i32>,
    /// Owning professor. Required when an admin creates the test.
    pub professor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_test"))]
pub struct UpdateTestDto {
    #[validate(length(min = 1, max = 100, message = "title must be 1-100 characters"))]
    pub title: Option<String>,
    pub color: Option<HexColor>,
    #[validate(custom(function = "validate_document"))]
    #[schema(value_type = Option<Object>)]
    pub content: Option<Value>,
    /// `null` removes the time limit.
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<i32>)]
    pub time_limit_minutes: Option<Option<i32>>,
    pub active: Option<bool>,
}

fn validate_update_test(dto: &UpdateTestDto) -> Result<(), ValidationError> {
    match dto.time_limit_minutes {
        Some(Some(minutes)) if !(1..=MAX_TIME_LIMIT_MINUTES).contains(&minutes) => {
            let mut error = ValidationError::new("range");
            error.message = Some("time_limit_minutes must be 1-600".into());
            Err(error)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TestCriteria {
    pub title: Option<StringQuery>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub professor_id: Option<Uuid>,
    pub active: Option<bool>,
    pub class_id: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignTestDto {
    pub class_id: String,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

fn visible_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetVisibilityDto {
    pub visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_document() {
        assert!(validate_document(&json!({"questions": []})).is_ok());
        assert!(validate_document(&json!([1, 2])).is_ok());
        assert!(validate_document(&json!("text")).is_err());
        assert!(validate_document(&Value::Null).is_err());
    }

    #[test]
    fn test_create_test_validation() {
        let dto: CreateTestDto = serde_json::from_value(json!({
            "title": "Quiz 1",
            "content": {"questions": [{"q": "2+2?"}]},
            "time_limit_minutes": 0
        }))
        .unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("time_limit_minutes"));
        assert!(dto.color.is_none());
    }

    #[test]
    fn test_update_test_time_limit() {
        let dto: UpdateTestDto = serde_json::from_str(r#"{"time_limit_minutes":null}"#).unwrap();
        assert_eq!(dto.time_limit_minutes, Some(None));
        assert!(dto.validate().is_ok());

        let dto: UpdateTestDto = serde_json::from_str(r#"{"time_limit_minutes":601}"#).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_assign_defaults_visible() {
        let dto: AssignTestDto = serde_json::from_str(r#"{"class_id":"ABCD1234"}"#).unwrap();
        assert!(dto.visible);
    }
}
