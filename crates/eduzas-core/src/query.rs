//! String search criteria shared by every search endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchType {
    /// Exact, case-sensitive equality.
    #[default]
    Equals,
    /// Case-insensitive substring match.
    Like,
}

/// A text filter on one column, e.g. `{"text": "alg", "search_type": "LIKE"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StringQuery {
    pub text: String,
    #[serde(default)]
    pub search_type: SearchType,
}

impl StringQuery {
    pub fn equals(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            search_type: SearchType::Equals,
        }
    }

    pub fn like(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            search_type: SearchType::Like,
        }
    }

    /// Blank text disables the filter.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
