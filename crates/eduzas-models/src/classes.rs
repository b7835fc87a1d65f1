//! Classes, their professors and their enrolled students.

use chrono::{DateTime, Utc};
use eduzas_core::serde::{deserialize_nullable, deserialize_optional_uuid};
use eduzas_core::{PaginationParams, StringQuery};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::users::User;
use crate::value_types::HexColor;

/// Length of the shareable class code used as the class id.
pub const CLASS_CODE_LEN: usize = 8;
pub const CLASS_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn is_class_code(code: &str) -> bool {
    code.len() == CLASS_CODE_LEN && code.bytes().all(|b| CLASS_CODE_ALPHABET.contains(&b))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Class {
    #[schema(example = "K7Q2M9XA")]
    pub id: String,
    pub class_name: String,
    pub subject: Option<String>,
    pub section: Option<String>,
    pub color: HexColor,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateClassDto {
    #[validate(length(min = 1, max = 100, message = "class_name must be 1-100 characters"))]
    pub class_name: String,
    #[validate(length(max = 100, message = "subject must be at most 100 characters"))]
    pub subject: Option<String>,
    #[validate(length(max = 50, message = "section must be at most 50 characters"))]
    pub section: Option<String>,
    pub color: Option<HexColor>,
    /// Professor who will own the class. Required when an admin creates it.
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_class"))]
pub struct UpdateClassDto {
    #[validate(length(min = 1, max = 100, message = "class_name must be 1-100 characters"))]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    pub subject: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    pub section: Option<Option<String>>,
    pub color: Option<HexColor>,
    pub active: Option<bool>,
}

fn validate_update_class(dto: &UpdateClassDto) -> Result<(), ValidationError> {
    let longer_than = |value: &Option<Option<String>>, max: usize| {
        value
            .as_ref()
            .and_then(|v| v.as_ref())
            .is_some_and(|v| v.chars().count() > max)
    };
    if longer_than(&dto.subject, 100) || longer_than(&dto.section, 50) {
        let mut error = ValidationError::new("length");
        error.message = Some("subject must be at most 100 and section at most 50 characters".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ClassCriteria {
    pub class_name: Option<StringQuery>,
    pub subject: Option<StringQuery>,
    pub section: Option<StringQuery>,
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub with_student: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub with_professor: Option<Uuid>,
    /// Students only: also list classes they have hidden.
    #[serde(default)]
    pub include_hidden: bool,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct EnrollStudentDto {
    /// Student to enroll. Admins only; students always enroll themselves.
    pub student_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Enrollment {
    pub class_id: String,
    pub student_id: Uuid,
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetHiddenDto {
    pub hidden: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddProfessorDto {
    pub professor_id: Uuid,
    #[serde(default)]
    pub is_owner: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassProfessor {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub user: User,
    pub is_owner: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_class_code() {
        assert!(is_class_code("K7Q2M9XA"));
        assert!(!is_class_code("k7q2m9xa"));
        assert!(!is_class_code("K7Q2M9X"));
        assert!(!is_class_code("K7Q2M9XA1"));
        assert!(!is_class_code("K7Q2-9XA"));
    }

    #[test]
    fn test_create_class_validation() {
        let dto: CreateClassDto =
            serde_json::from_str(r##"{"class_name":"","color":"#00ff00"}"##).unwrap();
        assert!(dto.validate().is_err());
        assert_eq!(dto.color.unwrap().as_str(), "#00FF00");
    }

    #[test]
    fn test_create_class_rejects_bad_color() {
        assert!(serde_json::from_str::<CreateClassDto>(r#"{"class_name":"A","color":"blue"}"#).is_err());
    }

    #[test]
    fn test_update_class_null_clears_subject() {
        let dto: UpdateClassDto = serde_json::from_str(r#"{"subject":null}"#).unwrap();
        assert_eq!(dto.subject, Some(None));
        assert_eq!(dto.section, None);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_update_class_long_section() {
        let dto = UpdateClassDto {
            section: Some(Some("s".repeat(51))),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_class_criteria_defaults() {
        let criteria: ClassCriteria = serde_json::from_str(r#"{"with_student":""}"#).unwrap();
        assert!(criteria.with_student.is_none());
        assert!(!criteria.include_hidden);
        assert_eq!(criteria.pagination.limit(), 10);
    }

    #[test]
    fn test_add_professor_defaults_to_non_owner() {
        let dto: AddProfessorDto = serde_json::from_str(
            r#"{"professor_id":"6f1c7c9e-8a52-4c39-9d4e-0d1f7a3b2c11"}"#,
        )
        .unwrap();
        assert!(!dto.is_owner);
    }
}
