//! HTTP error normalization.
//!
//! Every failure leaves the server as `{error, message, details?}` with a
//! status code chosen here. Internal error chains are never serialized.

use std::any::Any;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pay402::FacilitatorError;
use serde::Serialize;
use serde_json::Value;

use crate::config::Environment;

/// Which dispatch operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `POST /verify`.
    Verify,
    /// `POST /settle`.
    Settle,
}

impl Operation {
    const fn failure_label(self) -> &'static str {
        match self {
            Self::Verify => "Verification failed",
            Self::Settle => "Settlement failed",
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Error category.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Field-level issues of a validation error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            details: None,
        }
    }
}

/// Errors surfaced by the facilitator HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The dispatch core rejected or failed the request.
    #[error("{}: {source}", operation.failure_label())]
    Dispatch {
        /// Operation that failed.
        operation: Operation,
        /// Underlying failure.
        #[source]
        source: FacilitatorError,
    },

    /// The request body is not valid JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] JsonRejection),

    /// No route matches the request.
    #[error("the requested endpoint does not exist")]
    NotFound,
}

impl ApiError {
    /// Wraps a verification failure.
    #[must_use]
    pub const fn verify(source: FacilitatorError) -> Self {
        Self::Dispatch {
            operation: Operation::Verify,
            source,
        }
    }

    /// Wraps a settlement failure.
    #[must_use]
    pub const fn settle(source: FacilitatorError) -> Self {
        Self::Dispatch {
            operation: Operation::Settle,
            source,
        }
    }

    /// Status code and body of the response.
    #[must_use]
    pub fn to_parts(&self) -> (StatusCode, ErrorBody) {
        match self {
            Self::Dispatch { operation, source } => {
                let body = match source.as_schema_violation() {
                    Some(violation) => ErrorBody {
                        details: Some(violation.details()),
                        ..ErrorBody::new(
                            "Validation error",
                            "Invalid payment payload or requirements",
                        )
                    },
                    None => ErrorBody::new(operation.failure_label(), source.to_string()),
                };
                (StatusCode::BAD_REQUEST, body)
            }
            Self::InvalidJson(rejection) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Invalid JSON body", rejection.body_text()),
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("Not Found", "The requested endpoint does not exist"),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_parts();
        if let Self::Dispatch { source, .. } = &self {
            tracing::warn!(
                error = %self,
                validation = source.as_schema_violation().is_some(),
                "Request failed"
            );
        }
        (status, Json(body)).into_response()
    }
}

/// Builds the 500 response for a handler panic.
///
/// The panic message is only disclosed in development.
#[must_use]
pub fn panic_response(panic: Box<dyn Any + Send + 'static>, environment: Environment) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");

    let message = if environment == Environment::Development {
        detail.to_owned()
    } else {
        "An error occurred".to_owned()
    };
    let body = ErrorBody::new("Internal Server Error", message);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
