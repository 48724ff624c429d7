use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::literal::LiteralError;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Field on line {line} of {} exceeds the field size limit ({limit})", .path.display())]
    FieldTooLarge {
        path: PathBuf,
        line: u64,
        limit: u64,
    },

    #[error("No usable field size limit for {}: gave up below {floor}", .path.display())]
    FieldLimitExhausted { path: PathBuf, floor: u64 },

    #[error("Malformed row in {file}: {reason}")]
    MalformedRow { file: String, reason: String },

    #[error("Malformed serialized list: {0}")]
    Literal(#[from] LiteralError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn malformed_row(file: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::MalformedRow {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client
    pub fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Logs server-side failures; client errors are not logged
    pub fn log(&self) {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        let message = self.client_message();

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
