use std::time::Duration;

use eduzas_config::EmailConfig;
use eduzas_core::AppError;
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument};

use crate::metrics::track_email;

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends the platform's transactional mail over SMTP.
///
/// With `SMTP_ENABLED=false` every send is logged and skipped.
#[derive(Debug, Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self))]
    pub async fn send_welcome_email(&self, to_email: &str, to_name: &str) -> Result<(), AppError> {
        let text_body = format!(
            "Hi {},\n\n\
             Welcome to EduZas! Your account is ready.\n\n\
             Sign in at {} to join your classes.\n\n\
             The EduZas Team",
            to_name, self.config.frontend_url
        );
        let html_body = layout(
            "#007BFF",
            "Welcome to EduZas",
            &format!(
                "<p>Hi <strong>{}</strong>,</p>\
                 <p>Your account is ready. Sign in to join your classes.</p>{}",
                escape_html(to_name),
                button(&self.config.frontend_url, "Open EduZas"),
            ),
        );

        self.send_email("welcome", to_email, "Welcome to EduZas", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, reset_token))]
    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        reset_token: &str,
        expires_in_minutes: i64,
    ) -> Result<(), AppError> {
        let reset_link = format!(
            "{}/reset-password?token={}",
            self.config.frontend_url, reset_token
        );

        let text_body = format!(
            "Hi {},\n\n\
             You requested to reset your password.\n\n\
             Open the link below to choose a new one:\n\
             {}\n\n\
             This link expires in {} minutes.\n\n\
             If you didn't request this, ignore this email.\n\n\
             The EduZas Team",
            to_name, reset_link, expires_in_minutes
        );
        let html_body = layout(
            "#4F46E5",
            "Password Reset Request",
            &format!(
                "<p>Hi <strong>{}</strong>,</p>\
                 <p>We received a request to reset your password.</p>{}\
                 <p style=\"word-break: break-all;\">{}</p>\
                 <p><strong>This link expires in {} minutes.</strong></p>\
                 <p>If you didn't request this, ignore this email.</p>",
                escape_html(to_name),
                button(&reset_link, "Reset Password"),
                escape_html(&reset_link),
                expires_in_minutes
            ),
        );

        self.send_email(
            "password_reset",
            to_email,
            "Password Reset Request",
            &text_body,
            &html_body,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn send_password_reset_confirmation(
        &self,
        to_email: &str,
        to_name: &str,
    ) -> Result<(), AppError> {
        let text_body = format!(
            "Hi {},\n\n\
             Your password has been reset.\n\n\
             If you didn't make this change, contact support immediately.\n\n\
             The EduZas Team",
            to_name
        );
        let html_body = layout(
            "#10B981",
            "Password Reset Successful",
            &format!(
                "<p>Hi <strong>{}</strong>,</p>\
                 <p>Your password has been reset. You can now sign in with it.</p>\
                 <p><strong>Security notice:</strong> if you didn't make this change, \
                 contact support immediately.</p>",
                escape_html(to_name)
            ),
        );

        self.send_email(
            "password_reset_confirmation",
            to_email,
            "Password Reset Successful",
            &text_body,
            &html_body,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn send_class_notification(
        &self,
        to_email: &str,
        to_name: &str,
        class_name: &str,
        title: &str,
    ) -> Result<(), AppError> {
        let subject = format!("[{}] {}", class_name, title);
        let text_body = format!(
            "Hi {},\n\n\
             There is a new notification in {}:\n\n\
             {}\n\n\
             The EduZas Team",
            to_name, class_name, title
        );
        let html_body = layout(
            "#007BFF",
            &format!("New notification in {}", escape_html(class_name)),
            &format!(
                "<p>Hi <strong>{}</strong>,</p>\
                 <blockquote style=\"border-left: 4px solid #007BFF; margin: 20px 0; padding: 10px 15px;\">{}</blockquote>{}",
                escape_html(to_name),
                escape_html(title),
                button(&self.config.frontend_url, "Open EduZas"),
            ),
        );

        self.send_email("class_notification", to_email, &subject, &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, text_body, html_body))]
    async fn send_email(
        &self,
        kind: &'static str,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            info!(kind, to = to_email, subject, "SMTP disabled, skipping email");
            return Ok(());
        }

        let result = self.deliver(to_email, subject, text_body, html_body).await;
        track_email(kind, result.is_ok());
        result
    }

    async fn deliver(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .timeout(Some(SMTP_TIMEOUT))
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| {
                    AppError::internal_error(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(self.config.smtp_port)
                .credentials(creds)
                .timeout(Some(SMTP_TIMEOUT))
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?
            .map_err(|e| AppError::internal_error(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn button(href: &str, label: &str) -> String {
    format!(
        r#"<table width="100%" cellpadding="0" cellspacing="0" style="margin: 30px 0;"><tr><td align="center"><a href="{}" style="display: inline-block; padding: 14px 40px; background-color: #4F46E5; color: #ffffff; text-decoration: none; border-radius: 6px; font-size: 16px; font-weight: bold;">{}</a></td></tr></table>"#,
        escape_html(href),
        label
    )
}

/// Wraps `content` in the shared card layout. `title` must already be escaped.
fn layout(accent: &str, title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #f4f4f4; padding: 20px;">
        <tr>
            <td align="center">
                <table width="600" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px; overflow: hidden;">
                    <tr>
                        <td style="background-color: {accent}; padding: 30px; text-align: center;">
                            <h1 style="margin: 0; color: #ffffff; font-size: 28px;">EduZas</h1>
                        </td>
                    </tr>
                    <tr>
                        <td style="padding: 40px 30px; color: #666666; font-size: 16px; line-height: 1.5;">
                            <h2 style="margin: 0 0 20px 0; color: #333333; font-size: 24px;">{title}</h2>
                            {content}
                        </td>
                    </tr>
                    <tr>
                        <td style="background-color: #f8f9fa; padding: 20px 30px; text-align: center; border-top: 1px solid #e9ecef;">
                            <p style="margin: 0; color: #999999; font-size: 12px;">This is an automated email from EduZas. Please do not reply.</p>
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#
    )
}
