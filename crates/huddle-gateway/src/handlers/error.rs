//! Handler error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use huddle_common::{AppError, ErrorResponse};
use huddle_core::{DomainError, RoomId};
use thiserror::Error;

use crate::protocol::{ErrorPayload, ProtocolError, ServerEvent};

/// Error raised at the boundary of a gateway operation
///
/// Everything except `Authentication` is reported to the requesting session
/// as an `error` event; `Authentication` refuses the upgrade itself.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bad, expired or missing credential
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AppError),

    /// The identity may not perform this operation on the room
    #[error("{0}")]
    Authorization(String),

    /// The room or entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// The frame or its payload was rejected
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Ephemeral or persistent store temporarily unreachable
    #[error("Store unavailable: {0}")]
    TransientStore(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Machine-readable code sent to clients
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(e) => e.error_code(),
            Self::Authorization(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::TransientStore(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message sent to clients; infrastructure detail stays in the logs
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::TransientStore(_) => "Service temporarily unavailable".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// HTTP status when the error refuses a request outright
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::TransientStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Build the session-scoped `error` event for this failure
    #[must_use]
    pub fn to_event(&self, event: Option<&str>, room_id: Option<RoomId>) -> ServerEvent {
        ServerEvent::Error(ErrorPayload {
            code: self.code().to_string(),
            message: self.client_message(),
            event: event.map(str::to_string),
            room_id,
        })
    }
}

impl From<DomainError> for GatewayError {
    fn from(err: DomainError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else if err.is_authorization() {
            Self::Authorization(err.to_string())
        } else if err.is_validation() {
            Self::InvalidPayload(err.to_string())
        } else if matches!(err, DomainError::InternalError(_)) {
            Self::Internal(err.to_string())
        } else {
            Self::TransientStore(err.to_string())
        }
    }
}

impl From<ProtocolError> for GatewayError {
    fn from(err: ProtocolError) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            Self::Authentication(e) => ErrorResponse::from(e),
            other => ErrorResponse {
                code: other.code().to_string(),
                message: other.client_message(),
                details: None,
            },
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "Gateway request failed");
        }

        (status, Json(body)).into_response()
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, GatewayError>;
