use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use indexmap::IndexMap;
use serde_json::json;
use thiserror::Error;

use crate::i18n::{Locale, Text};
use crate::users::validation::Violations;

/// Every way a request can fail, already carrying its localized message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: IndexMap<String, String>,
        help: Option<String>,
    },
    #[error("{message}: {detail}")]
    BadRequest { message: String, detail: String },
    #[error("{message}: {detail}")]
    NotFound { message: String, detail: String },
    #[error("{message}: {detail}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    pub fn validation(locale: Locale, violations: &Violations) -> Self {
        ApiError::Validation {
            message: locale.text(Text::ValidationFailed).to_string(),
            errors: violations.messages(locale),
            help: Some(locale.text(Text::ValidationHelp).to_string()),
        }
    }

    pub fn bad_request(locale: Locale, detail: impl Display) -> Self {
        ApiError::BadRequest {
            message: locale.text(Text::MalformedBody).to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn user_not_found(locale: Locale, id: impl Display) -> Self {
        ApiError::NotFound {
            message: locale.text(Text::NotFound).to_string(),
            detail: format!("no user with id {id}"),
        }
    }

    /// `context` is the operation-specific failure text, e.g. [`Text::CreateFailed`].
    pub fn internal(locale: Locale, context: Text, detail: impl Display) -> Self {
        ApiError::Internal {
            message: locale.text(context).to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation {
                message,
                errors,
                help,
            } => json!({
                "success": false,
                "message": message,
                "errors": errors,
                "help": help,
            }),
            ApiError::BadRequest { message, detail }
            | ApiError::NotFound { message, detail }
            | ApiError::Internal { message, detail } => json!({
                "success": false,
                "message": message,
                "error": detail,
            }),
        };
        (status, Json(body)).into_response()
    }
}
