use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use minijinja::context;

use crate::net::ApiError;
use crate::web;

/// Request-level error, rendered as an HTML error page.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsafe redirect target: {0}")]
    UnsafeRedirect(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::UnsafeRedirect(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the browser. Upstream and storage details stay in the log.
    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::UnsafeRedirect(_) => "The redirect target is not allowed.".to_string(),
            Self::NotFound(_) => "The page you requested does not exist.".to_string(),
            Self::Api(_) => "The proxy service API could not complete the request.".to_string(),
            Self::Database(_) | Self::Internal(_) => "Something went wrong on our side.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        web::render_status(
            status,
            "error",
            context! {
                status => status.as_u16(),
                reason => status.canonical_reason().unwrap_or("Error"),
                message => self.public_message(),
            },
        )
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        tracing::error!(error = %err, "Database error");
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
