//! Request error taxonomy
//!
//! Every handler returns `Result<HttpResponse, AppError>`; the router turns
//! errors into a JSON `{"error": ...}` body on API routes or a small HTML page
//! elsewhere.

use hyper::StatusCode;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::http::{self, HttpResponse};
use crate::ingest::{IngestError, Rejection, ValidationError};
use crate::store::StoreError;

const DATABASE_ERROR_PAGE: &str =
    "<h1>Database Error</h1><p>Please make sure the database is set up and seeded.</p>";

#[derive(Debug, Error)]
pub enum AppError {
    /// User-fixable input problem
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Storage(#[from] StoreError),
    #[error("{0}")]
    Ingestion(#[from] IngestError),
    /// Missing static file
    #[error("{0}")]
    Asset(String),
    /// The client stopped sending its request body
    #[error("Request body not received within {}s", .0.as_secs())]
    RequestTimeout(Duration),
    /// A handler panicked
    #[error("{0}")]
    Internal(String),
    /// Another error, prefixed with what was being attempted
    #[error("Error {action}: {source}")]
    Failed {
        action: &'static str,
        source: Box<AppError>,
    },
}

/// How an error is rendered for the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFormat {
    Html,
    Json,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Attach the action being attempted, e.g. `"adding product"`
    #[must_use]
    pub fn during(self, action: &'static str) -> Self {
        Self::Failed {
            action,
            source: Box::new(self),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::Asset(_) => StatusCode::NOT_FOUND,
            Self::Ingestion(IngestError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RequestTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::Storage(_) | Self::Ingestion(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Failed { source, .. } => source.status(),
        }
    }

    /// Server-side faults are logged; client errors are not
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    pub fn into_response(self, format: ErrorFormat) -> HttpResponse {
        let status = self.status();
        match format {
            ErrorFormat::Json => http::build_json_response(status, &json!({ "error": self.to_string() })),
            ErrorFormat::Html => http::build_html_response(status, self.html_body()),
        }
    }

    fn html_body(&self) -> String {
        match self {
            Self::Validation(message) | Self::NotFound(message) => format!("<h1>{message}</h1>"),
            Self::Asset(_) => "<h1>File not found!</h1>".to_string(),
            Self::Storage(_) => DATABASE_ERROR_PAGE.to_string(),
            Self::Ingestion(IngestError::TooLarge { limit }) => {
                format!("<h1>Upload too large</h1><p>The limit is {limit} bytes.</p>")
            }
            Self::RequestTimeout(_) => format!("<h1>Request Timeout</h1><p>{self}</p>"),
            Self::Ingestion(_) | Self::Internal(_) | Self::Failed { .. } => {
                format!("<h1>Internal Server Error</h1><p>{self}</p>")
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Invalid(e) => e.into(),
            Rejection::Failed(e) => e.into(),
        }
    }
}
