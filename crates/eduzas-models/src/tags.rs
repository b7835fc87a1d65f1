//! Free-form labels attached to agenda contacts.

use chrono::{DateTime, Utc};
use eduzas_core::{PaginationParams, StringQuery};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const TAG_MAX_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tag {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Trims `text` and returns it if it is a usable tag.
pub fn normalize_tag(text: &str) -> Option<String> {
    let text = text.trim();
    let valid = !text.is_empty()
        && text.chars().count() <= TAG_MAX_LEN
        && !text.chars().any(char::is_whitespace);
    valid.then(|| text.to_string())
}

pub fn validate_tag(text: &str) -> Result<(), ValidationError> {
    if normalize_tag(text).is_none() {
        let mut error = ValidationError::new("tag");
        error.message = Some("tags must be 1-30 characters without spaces".into());
        return Err(error);
    }
    Ok(())
}

pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    tags.iter().try_for_each(|tag| validate_tag(tag))
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTagDto {
    #[validate(custom(function = "validate_tag"))]
    #[schema(example = "classmates")]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TagCriteria {
    pub text: Option<StringQuery>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
