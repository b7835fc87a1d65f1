//! Validated newtypes for domain primitives.
//!
//! - [`Email`]: trimmed, lower-cased, syntactically valid address
//! - [`HexColor`]: `#RRGGBB` color used by classes, tests and resources
//!
//! Both validate on construction and on deserialization, and are stored as
//! plain `TEXT` columns.
//!
//! ```ignore
//! let email: Email = " Ana@Example.COM ".parse()?;
//! assert_eq!(email.as_str(), "ana@example.com");
//!
//! let color: HexColor = "#1a2B3c".parse()?;
//! assert_eq!(color.as_str(), "#1A2B3C");
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::ValidateEmail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTypeError {
    InvalidEmail(String),
    InvalidColor(String),
}

impl std::error::Error for ValueTypeError {}

impl fmt::Display for ValueTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            Self::InvalidColor(msg) => write!(f, "Invalid color: {}", msg),
        }
    }
}

/// Implements the string-backed sqlx codec, `Display`, `FromStr` and a
/// validating `Deserialize` for a newtype with `new` and `new_unchecked`.
macro_rules! text_value_type {
    ($name:ident) => {
        impl $name {
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[inline]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValueTypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueTypeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }

        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        // Rows were validated on the way in.
        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(Self::new_unchecked(s))
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <String as PgHasArrayType>::array_type_info()
            }
        }
    };
}

// ============================================================================
// Email
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[schema(value_type = String, format = "email", example = "ana@example.com")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> Result<Self, ValueTypeError> {
        let email = email.into().trim().to_lowercase();
        if email.is_empty() {
            return Err(ValueTypeError::InvalidEmail("email cannot be empty".into()));
        }
        if !email.validate_email() {
            return Err(ValueTypeError::InvalidEmail(format!(
                "'{}' is not a valid email address",
                email
            )));
        }
        Ok(Self(email))
    }

    #[inline]
    pub fn new_unchecked(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn domain(&self) -> &str {
        self.0.split('@').nth(1).unwrap_or("")
    }
}

text_value_type!(Email);

// ============================================================================
// HexColor
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[schema(value_type = String, example = "#007BFF")]
pub struct HexColor(String);

impl HexColor {
    pub const DEFAULT: &'static str = "#007BFF";

    pub fn new(color: impl Into<String>) -> Result<Self, ValueTypeError> {
        let color = color.into().trim().to_ascii_uppercase();
        let valid = color.len() == 7
            && color.starts_with('#')
            && color[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            return Err(ValueTypeError::InvalidColor(format!(
                "'{}' is not a #RRGGBB color",
                color
            )));
        }
        Ok(Self(color))
    }

    #[inline]
    pub fn new_unchecked(color: impl Into<String>) -> Self {
        Self(color.into())
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

text_value_type!(HexColor);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_normalized() {
        let email = Email::new("  Ana.Lopez@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "ana.lopez@example.com");
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn test_invalid_email() {
        assert!(Email::new("").is_err());
        assert!(Email::new("not-an-email").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!("two@@example.com".parse::<Email>().is_err());
    }

    #[test]
    fn test_email_deserialize_validates() {
        let email: Email = serde_json::from_str(r#""USER@test.com""#).unwrap();
        assert_eq!(email.as_str(), "user@test.com");

        let err = serde_json::from_str::<Email>(r#""nope""#).unwrap_err();
        assert!(err.to_string().contains("Invalid email"));
    }

    #[test]
    fn test_email_serializes_as_string() {
        let email = Email::new("a@b.co").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), r#""a@b.co""#);
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(HexColor::new("#1a2b3c").unwrap().as_str(), "#1A2B3C");
        assert_eq!(HexColor::default().as_str(), "#007BFF");
        assert!(HexColor::new("1a2b3c").is_err());
        assert!(HexColor::new("#1a2b3").is_err());
        assert!(HexColor::new("#GGGGGG").is_err());
        assert!(HexColor::new("#1a2b3c4d").is_err());
    }

    #[test]
    fn test_hex_color_deserialize_validates() {
        let color: HexColor = serde_json::from_str(r##""#ff0000""##).unwrap();
        assert_eq!(color.to_string(), "#FF0000");
        assert!(serde_json::from_str::<HexColor>(r#""red""#).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ValueTypeError::InvalidColor("x".to_string());
        assert_eq!(err.to_string(), "Invalid color: x");
    }
}
