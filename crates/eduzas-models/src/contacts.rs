//! Agenda contacts: one user's saved entries for other users.

use chrono::{DateTime, Utc};
use eduzas_core::serde::{deserialize_nullable, deserialize_optional_uuid};
use eduzas_core::{PaginationParams, StringQuery};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::tags::{validate_tag, validate_tags};
use crate::value_types::Email;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Contact {
    pub agenda_owner_id: Uuid,
    pub user_id: Uuid,
    pub alias: String,
    pub notes: Option<String>,
    /// Email of the contacted user.
    pub email: Email,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateContactDto {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "alias must be 1-100 characters"))]
    pub alias: String,
    #[validate(length(max = 500, message = "notes must be at most 500 characters"))]
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_contact"))]
pub struct UpdateContactDto {
    #[validate(length(min = 1, max = 100, message = "alias must be 1-100 characters"))]
    pub alias: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

fn validate_update_contact(dto: &UpdateContactDto) -> Result<(), ValidationError> {
    let too_long = dto
        .notes
        .as_ref()
        .and_then(|n| n.as_ref())
        .is_some_and(|n| n.chars().count() > 500);
    if too_long {
        let mut error = ValidationError::new("length");
        error.message = Some("notes must be at most 500 characters".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddContactTagDto {
    #[validate(custom(function = "validate_tag"))]
    pub tag: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ContactCriteria {
    pub alias: Option<StringQuery>,
    /// Contacts must carry every listed tag.
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    /// Admins may search another user's agenda.
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub agenda_owner_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
