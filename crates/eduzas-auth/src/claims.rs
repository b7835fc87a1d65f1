//! JWT access token claims.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::role::Role;

/// Claims embedded in access tokens.
///
/// They carry everything the authorization checks need about the caller so
/// no lookup is required to decide role-only questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    /// Expiration (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serialize() {
        let id = Uuid::new_v4();
        let claims = Claims {
            sub: id,
            email: "test@example.com".to_string(),
            role: Role::Student,
            exp: 1234567890,
            iat: 1234567800,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(&format!(r#""sub":"{}""#, id)));
        assert!(serialized.contains(r#""role":"STUDENT""#));
    }

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{"sub":"6f1c7c9e-8a52-4c39-9d4e-0d1f7a3b2c11","email":"user@test.com","role":"ADMIN","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub.to_string(), "6f1c7c9e-8a52-4c39-9d4e-0d1f7a3b2c11");
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.is_admin());
        assert_eq!(claims.exp, 9999999999);
    }

    #[test]
    fn test_claims_reject_unknown_role() {
        let json = r#"{"sub":"6f1c7c9e-8a52-4c39-9d4e-0d1f7a3b2c11","email":"user@test.com","role":"TEACHER","exp":1,"iat":1}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }
}
