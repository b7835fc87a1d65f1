//! Pagination utilities for search endpoints.
//!
//! Supports both offset-based and page-based pagination:
//!
//! - `limit`: Maximum number of items to return (1-100, default: 10)
//! - `offset`: Number of items to skip from the beginning
//! - `page`: Page number (1-indexed). When present it takes precedence over `offset`.
//!
//! Search criteria embed [`PaginationParams`] with `#[serde(flatten)]`, so a
//! request body looks like `{"class_name": {...}, "limit": 20, "page": 2}`.
//!
//! # Example
//!
//! ```ignore
//! let params = PaginationParams { limit: Some(20), offset: None, page: Some(3) };
//! let rows = fetch(params.limit(), params.offset()).await?;
//! let total = count().await?;
//!
//! Ok(Json(Paginated::new(rows, PaginationMeta::new(total, &params))))
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

/// Deserializes an optional i64 given either as a number or as a string.
///
/// Empty strings are treated as `None`.
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<NumberOrString> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Metadata about a paginated response.
///
/// ```json
/// {
///   "total": 100,
///   "limit": 10,
///   "offset": 20,
///   "page": 3,
///   "total_pages": 10,
///   "has_more": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Maximum items per page (the limit that was applied)
    pub limit: i64,
    /// Number of items skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Current page number (only present if page-based pagination was used)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Number of pages of `limit` items needed to hold `total`
    pub total_pages: i64,
    /// Whether there are more items after this page
    pub has_more: bool,
}

impl PaginationMeta {
    #[must_use]
    pub fn new(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        let offset = params.offset();
        let total = total.max(0);

        Self {
            total,
            limit,
            offset: Some(offset),
            page: params.page(),
            total_pages: (total + limit - 1) / limit,
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

/// Pagination parameters.
///
/// - `limit` is clamped to the range [1, 100]
/// - `offset` is clamped to a minimum of 0
/// - `page` is clamped to a minimum of 1
#[derive(Debug, Clone, Hash, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Maximum number of items to return (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0, ignored if `page` is set)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
    /// Page number (1-indexed)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: Some(DEFAULT_LIMIT),
            offset: Some(0),
            page: None,
        }
    }
}

impl PaginationParams {
    /// Returns the effective limit, clamped to [1, 100]. Defaults to 10.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Returns the effective offset.
    ///
    /// If `page` is set the offset is `(page - 1) * limit`, otherwise the
    /// explicit offset or 0.
    #[must_use]
    pub fn offset(&self) -> i64 {
        if let Some(page) = self.page() {
            (page - 1).saturating_mul(self.limit())
        } else {
            self.offset.unwrap_or(0).max(0)
        }
    }

    /// Returns the page number if provided, clamped to a minimum of 1.
    #[must_use]
    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }
}

/// One page of results plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, meta: PaginationMeta) -> Self {
        Self { data, meta }
    }

    pub fn empty(params: &PaginationParams) -> Self {
        Self {
            data: Vec::new(),
            meta: PaginationMeta::new(0, params),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
