use chrono::{DateTime, Utc};
use eduzas_core::PaginationParams;
use eduzas_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::tests::validate_document;

/// A student's answer to a test within one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Answer {
    pub user_id: Uuid,
    pub test_id: Uuid,
    pub class_id: String,
    #[schema(value_type = Object)]
    pub content: Json<Value>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAnswerDto {
    pub test_id: Uuid,
    pub class_id: String,
    #[validate(custom(function = "validate_document"))]
    #[schema(value_type = Object)]
    pub content: Value,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAnswerDto {
    #[validate(custom(function = "validate_document"))]
    #[schema(value_type = Object)]
    pub content: Value,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AnswerCriteria {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub test_id: Option<Uuid>,
    pub class_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub user_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_content_must_be_document() {
        let dto = UpdateAnswerDto {
            content: Value::Bool(true),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_answer_criteria_empty_ids() {
        let criteria: AnswerCriteria =
            serde_json::from_str(r#"{"test_id":"","user_id":null,"page":"3"}"#).unwrap();
        assert!(criteria.test_id.is_none());
        assert!(criteria.user_id.is_none());
        assert_eq!(criteria.pagination.page(), Some(3));
    }
}
