use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::aviapages::UpstreamError;

static EXPOSE_STACK: AtomicBool = AtomicBool::new(true);

/// Production hides the error chain from response bodies.
pub fn set_expose_stack(expose: bool) {
    EXPOSE_STACK.store(expose, Ordering::Relaxed);
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("upstream aviation API error: {0}")]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Context for an internal error whose text is safe to show to clients.
#[derive(Debug, Clone, Copy)]
pub struct PublicMessage(pub &'static str);

impl fmt::Display for PublicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Upstream(UpstreamError::RateLimited) => {
                "Aviation data provider is busy, please retry shortly".into()
            }
            ApiError::Upstream(_) => "Aviation data provider request failed".into(),
            ApiError::Internal(e) => e
                .downcast_ref::<PublicMessage>()
                .map_or("Internal server error", |m| m.0)
                .into(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }
        let stack = match &self {
            ApiError::Upstream(e) if EXPOSE_STACK.load(Ordering::Relaxed) => Some(format!("{e:?}")),
            ApiError::Internal(e) if EXPOSE_STACK.load(Ordering::Relaxed) => Some(format!("{e:?}")),
            _ => None,
        };
        let body = ErrorBody {
            message: self.public_message(),
            stack,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Upstream(UpstreamError::RateLimited).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_becomes_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_message_is_not_leaked() {
        let err = ApiError::Internal(anyhow::anyhow!("password=hunter2"));
        assert_eq!(err.public_message(), "Internal server error");
        let client = ApiError::bad_request("Invalid email");
        assert_eq!(client.public_message(), "Invalid email");
    }

    #[test]
    fn public_context_is_shown_for_internal_errors() {
        let err = ApiError::Internal(
            anyhow::anyhow!("connection refused").context(PublicMessage("Failed to send message")),
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Failed to send message");
    }
}
