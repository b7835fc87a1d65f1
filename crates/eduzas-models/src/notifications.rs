//! Class notifications and their per-student inbox rows.

use chrono::{DateTime, Utc};
use eduzas_core::{PaginationParams, StringQuery};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub class_id: String,
    pub title: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationCreated {
    #[serde(flatten)]
    pub notification: Notification,
    /// Students who received the notification.
    pub recipient_count: i64,
}

/// A notification as seen in one user's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserNotification {
    pub id: Uuid,
    pub class_id: String,
    pub class_name: String,
    pub title: String,
    pub readed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateNotificationDto {
    #[validate(length(equal = 8, message = "class_id must be an 8 character class code"))]
    pub class_id: String,
    #[validate(length(min = 1, max = 100, message = "title must be 1-100 characters"))]
    #[schema(example = "Exam moved to Friday")]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NotificationCriteria {
    pub class_id: Option<String>,
    pub readed: Option<bool>,
    pub title: Option<StringQuery>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MarkReadDto {
    #[serde(default = "default_readed")]
    pub readed: bool,
}

impl Default for MarkReadDto {
    fn default() -> Self {
        Self { readed: true }
    }
}

fn default_readed() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_read_defaults_to_true() {
        let dto: MarkReadDto = serde_json::from_str("{}").unwrap();
        assert!(dto.readed);
        let dto: MarkReadDto = serde_json::from_str(r#"{"readed":false}"#).unwrap();
        assert!(!dto.readed);
    }

    #[test]
    fn test_create_notification_validation() {
        let dto = CreateNotificationDto {
            class_id: "ABCD1234".to_string(),
            title: String::new(),
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
        assert!(!errors.field_errors().contains_key("class_id"));
    }

    #[test]
    fn test_notification_created_flattens() {
        let created = NotificationCreated {
            notification: Notification {
                id: Uuid::nil(),
                class_id: "ABCD1234".to_string(),
                title: "Hi".to_string(),
                active: true,
                created_at: Utc::now(),
            },
            recipient_count: 3,
        };
        let json = serde_json::to_value(created).unwrap();
        assert_eq!(json["title"], "Hi");
        assert_eq!(json["recipient_count"], 3);
    }
}
