//! Study resources shared with classes.

use chrono::{DateTime, Utc};
use eduzas_core::serde::deserialize_optional_uuid;
use eduzas_core::{PaginationParams, StringQuery};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::tests::validate_document;
use crate::value_types::HexColor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub color: HexColor,
    #[schema(value_type = Object)]
    pub content: Json<Value>,
    pub professor_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassResource {
    pub resource_id: Uuid,
    pub class_id: String,
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ResourceInClass {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub resource: Resource,
    pub hidden: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateResourceDto {
    #[validate(length(min = 1, max = 100, message = "title must be 1-100 characters"))]
    pub title: String,
    pub color: Option<HexColor>,
    #[validate(custom(function = "validate_document"))]
    #[schema(value_type = Object)]
    pub content: Value,
    pub professor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateResourceDto {
    #[validate(length(min = 1, max = 100, message = "title must be 1-100 characters"))]
    pub title: Option<String>,
    pub color: Option<HexColor>,
    #[validate(custom(function = "validate_document"))]
    #[schema(value_type = Option<Object>)]
    pub content: Option<Value>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResourceCriteria {
    pub title: Option<StringQuery>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub professor_id: Option<Uuid>,
    pub active: Option<bool>,
    pub class_id: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignResourceDto {
    pub class_id: String,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetHiddenResourceDto {
    pub hidden: bool,
}
