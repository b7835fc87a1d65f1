use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, OptionalFromRequest, Request, rejection::JsonRejection},
    http::header,
};
use eduzas_core::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

fn collect_messages(errors: &ValidationErrors, messages: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errors) => {
                messages.extend(errors.iter().map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, messages),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_messages(nested, messages);
                }
            }
        }
    }
}

/// Joins every rule message, including those of nested structs.
pub fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, &mut messages);
    messages.sort();
    messages.join(", ")
}

/// Maps a JSON rejection to a client error.
///
/// Missing fields and wrong types are malformed requests (400). Values that
/// parse as JSON but fail a type's own checks, such as an invalid email, are
/// rule violations (422).
fn rejection_error(rejection: JsonRejection) -> AppError {
    let body = rejection.body_text();

    if let Some(field) = body
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
    {
        return AppError::bad_request(anyhow!("{} is required", field));
    }

    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::bad_request(anyhow!("Missing 'Content-Type: application/json' header"))
        }
        JsonRejection::JsonDataError(_) if body.contains("invalid type") => {
            AppError::bad_request(anyhow!("Invalid field type in request"))
        }
        JsonRejection::JsonDataError(_) if body.contains("UUID parsing failed") => {
            let field = body
                .split("target type: ")
                .nth(1)
                .and_then(|s| s.split(": ").next())
                .unwrap_or("id");
            AppError::bad_request(anyhow!("{} must be a valid UUID", field))
        }
        JsonRejection::JsonDataError(_) if body.contains("unknown variant") => {
            AppError::bad_request(anyhow!("Invalid value in request"))
        }
        JsonRejection::JsonDataError(_) => {
            let message = body
                .rsplit(": ")
                .next()
                .map(|m| m.split(" at line").next().unwrap_or(m).to_string())
                .unwrap_or_else(|| "Invalid request body".to_string());
            AppError::unprocessable(anyhow!(message))
        }
        _ => AppError::bad_request(anyhow!("Invalid request body")),
    }
}

/// JSON body extractor that also runs `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = <Json<T> as FromRequest<S>>::from_request(req, state)
            .await
            .map_err(rejection_error)?;

        value
            .validate()
            .map_err(|errors| AppError::unprocessable(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}

/// A request without `Content-Type` has no body to extract. Any body that
/// is sent goes through the same checks as [`ValidatedJson`].
impl<T, S> OptionalFromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        if !req.headers().contains_key(header::CONTENT_TYPE) {
            return Ok(None);
        }
        <Self as FromRequest<S>>::from_request(req, state)
            .await
            .map(Some)
    }
}
