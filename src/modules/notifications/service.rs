use anyhow::anyhow;
use eduzas_auth::Role;
use eduzas_auth::policy::can_moderate_class;
use eduzas_core::{AppError, Paginated};
use eduzas_db::{Filters, fetch_page};
use eduzas_models::notifications::{
    CreateNotificationDto, Notification, NotificationCreated, NotificationCriteria,
    UserNotification,
};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::metrics::track_notification_published;
use crate::modules::classes::class_access;
use crate::utils::email::EmailService;

const INBOX_FROM: &str = " FROM user_notifications un
     JOIN notifications n ON n.id = un.notification_id
     JOIN classes c ON c.id = n.class_id";

#[derive(sqlx::FromRow)]
struct Recipient {
    email: String,
    first_name: String,
}

pub struct NotificationService;

impl NotificationService {
    /// Publishes to every student enrolled right now, then mails them in the
    /// background.
    #[instrument(skip(db, email, dto), fields(class_id = %dto.class_id))]
    pub async fn create_notification(
        db: &PgPool,
        email: &EmailService,
        caller_id: Uuid,
        caller_role: Role,
        dto: CreateNotificationDto,
    ) -> Result<NotificationCreated, AppError> {
        let access = class_access(db, &dto.class_id, caller_id).await?;
        if !can_moderate_class(caller_role, access) {
            return Err(AppError::forbidden(
                "Only professors of the class can publish notifications",
            ));
        }

        let mut tx = db.begin().await?;

        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (class_id, title) VALUES ($1, $2)
             RETURNING id, class_id, title, active, created_at",
        )
        .bind(&dto.class_id)
        .bind(dto.title.trim())
        .fetch_one(&mut *tx)
        .await?;

        let recipients = sqlx::query_as::<_, Recipient>(
            "WITH inserted AS (
                 INSERT INTO user_notifications (notification_id, user_id)
                 SELECT $1, cs.student_id FROM class_students cs WHERE cs.class_id = $2
                 RETURNING user_id
             )
             SELECT u.email, u.first_name FROM inserted i JOIN users u ON u.id = i.user_id",
        )
        .bind(notification.id)
        .bind(&notification.class_id)
        .fetch_all(&mut *tx)
        .await?;

        let class_name: String = sqlx::query_scalar("SELECT class_name FROM classes WHERE id = $1")
            .bind(&notification.class_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let recipient_count = recipients.len() as i64;
        track_notification_published(recipient_count);
        info!(notification_id = %notification.id, recipient_count, "Notification published");

        if !recipients.is_empty() {
            let mailer = email.clone();
            let title = notification.title.clone();
            tokio::spawn(async move {
                for recipient in recipients {
                    if let Err(e) = mailer
                        .send_class_notification(
                            &recipient.email,
                            &recipient.first_name,
                            &class_name,
                            &title,
                        )
                        .await
                    {
                        warn!(error = %e.error, "Failed to send notification email");
                    }
                }
            });
        }

        Ok(NotificationCreated {
            notification,
            recipient_count,
        })
    }

    /// The caller's inbox, newest first. Inactive notifications are left out.
    #[instrument(skip(db))]
    pub async fn search_notifications(
        db: &PgPool,
        user_id: Uuid,
        criteria: NotificationCriteria,
    ) -> Result<Paginated<UserNotification>, AppError> {
        let mut filters = Filters::new();
        filters
            .where_optional("un.user_id", Some(user_id))
            .where_fixed("n.active")
            .where_optional("n.class_id", criteria.class_id)
            .where_optional("un.readed", criteria.readed)
            .where_string_query("n.title", criteria.title.as_ref());

        let page = fetch_page::<UserNotification>(
            db,
            &format!(
                "SELECT n.id, n.class_id, c.class_name, n.title, un.readed, n.created_at{}",
                INBOX_FROM
            ),
            &format!("SELECT COUNT(*){}", INBOX_FROM),
            &filters,
            "n.created_at DESC, n.id",
            &criteria.pagination,
        )
        .await?;

        Ok(page)
    }

    #[instrument(skip(db))]
    pub async fn mark_read(
        db: &PgPool,
        user_id: Uuid,
        notification_id: Uuid,
        readed: bool,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE user_notifications SET readed = $1 WHERE notification_id = $2 AND user_id = $3",
        )
        .bind(readed)
        .bind(notification_id)
        .bind(user_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Notification not found")));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn delete_notification(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        id: Uuid,
    ) -> Result<(), AppError> {
        let class_id: String = sqlx::query_scalar("SELECT class_id FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Notification not found")))?;

        let access = class_access(db, &class_id, caller_id).await?;
        if !can_moderate_class(caller_role, access) {
            return Err(AppError::forbidden(
                "Only professors of the class can delete its notifications",
            ));
        }

        sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        info!(notification_id = %id, "Notification deleted");
        Ok(())
    }
}
