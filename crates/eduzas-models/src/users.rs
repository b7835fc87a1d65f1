//! User entity and user-management DTOs.

use chrono::{DateTime, Utc};
use eduzas_auth::Role;
use eduzas_core::serde::deserialize_nullable;
use eduzas_core::{PaginationParams, StringQuery};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::value_types::Email;

/// Columns of [`User`] for `RETURNING` clauses; never includes the password hash.
pub const USER_FIELDS: &str = "id, email, first_name, mid_name, father_lastname, mother_lastname, \
     role, active, created_at, modified_at";

/// [`USER_FIELDS`] qualified with the `u` alias for joins.
pub const USER_COLUMNS: &str = "u.id, u.email, u.first_name, u.mid_name, u.father_lastname, \
     u.mother_lastname, u.role, u.active, u.created_at, u.modified_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: Email,
    pub first_name: String,
    pub mid_name: Option<String>,
    pub father_lastname: String,
    pub mother_lastname: Option<String>,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            self.mid_name.as_deref(),
            Some(self.father_lastname.as_str()),
            self.mother_lastname.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Admin-only creation of an account with any role.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    pub email: Email,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "first_name must be 1-50 characters"))]
    pub first_name: String,
    #[validate(length(max = 50, message = "mid_name must be at most 50 characters"))]
    pub mid_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "father_lastname must be 1-50 characters"))]
    pub father_lastname: String,
    #[validate(length(max = 50, message = "mother_lastname must be at most 50 characters"))]
    pub mother_lastname: Option<String>,
    pub role: Role,
}

/// Changes a user makes to their own profile.
///
/// `mid_name` and `mother_lastname` accept `null` to clear the value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_optional_names"))]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 50, message = "first_name must be 1-50 characters"))]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    pub mid_name: Option<Option<String>>,
    #[validate(length(min = 1, max = 50, message = "father_lastname must be 1-50 characters"))]
    pub father_lastname: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    pub mother_lastname: Option<Option<String>>,
}

fn validate_optional_names(dto: &UpdateProfileDto) -> Result<(), ValidationError> {
    let too_long = |value: &Option<Option<String>>| {
        value
            .as_ref()
            .and_then(|v| v.as_ref())
            .is_some_and(|v| v.chars().count() > 50)
    };
    if too_long(&dto.mid_name) || too_long(&dto.mother_lastname) {
        let mut error = ValidationError::new("length");
        error.message = Some("names must be at most 50 characters".into());
        return Err(error);
    }
    Ok(())
}

/// Admin changes to any account.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: UpdateProfileDto,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1, message = "current_password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "new_password must be 8-128 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UserCriteria {
    pub email: Option<StringQuery>,
    pub first_name: Option<StringQuery>,
    pub father_lastname: Option<StringQuery>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
