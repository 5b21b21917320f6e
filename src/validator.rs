//! A JSON extractor that runs `validator` rules before the handler sees the
//! payload.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use classbook_core::{AppError, Rejection};

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

/// Body rejections become 400s, except values that parse as JSON but break a
/// domain rule, which are validation failures.
fn body_error(rejection: JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow::anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    let text = rejection.body_text();
    if let Some(field) = text
        .split("missing field `")
        .nth(1)
        .and_then(|rest| rest.split('`').next())
    {
        return Rejection::validation(format!("{} is required", field)).into();
    }
    if text.contains("invalid value") {
        let detail = text
            .split(": ")
            .last()
            .and_then(|rest| rest.split(" at line").next())
            .unwrap_or("Invalid field value");
        return Rejection::validation(detail.to_string()).into();
    }
    if text.contains("invalid type") {
        return AppError::bad_request(anyhow::anyhow!("Invalid field type in request"));
    }

    AppError::bad_request(anyhow::anyhow!("Invalid request body"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(body_error)?;

        value
            .validate()
            .map_err(|errors| Rejection::validation(format_errors(&errors)))?;

        Ok(ValidatedJson(value))
    }
}
