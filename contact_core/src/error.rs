//! Application error types and handling

use crate::submission::{SubmitError, TransportError};
use crate::validation::ValidationResult;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(ValidationResult),

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_seconds: Option<u64>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Delivery error: {0}")]
    Delivery(#[from] TransportError),

    #[error("Internal server error")]
    InternalServerError,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(result) => AppError::Validation(result),
            SubmitError::RateLimited(message) => AppError::RateLimited {
                message,
                retry_after_seconds: None,
            },
            SubmitError::InFlight => AppError::Conflict(SubmitError::InFlight.to_string()),
            SubmitError::Delivery(err) => AppError::Delivery(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body, retry_after) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg }), None),
            AppError::Validation(result) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "Validation failed", "fields": result.errors }),
                None,
            ),
            AppError::RateLimited {
                message,
                retry_after_seconds,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": message, "retry_after": retry_after_seconds }),
                retry_after_seconds,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg }), None),
            AppError::Delivery(err) => {
                tracing::error!("Delivery error: {}", err);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "Your message could not be sent. Please try again." }),
                    None,
                )
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
                None,
            ),
            AppError::IoError(err) => {
                tracing::error!("IO error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                    None,
                )
            }
        };

        let mut body = body;
        body["status"] = json!(status.as_u16());

        let mut response = (status, Json(body)).into_response();

        if let Some(seconds) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (AppError::Validation(ValidationResult::success()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                AppError::RateLimited {
                    message: "slow down".to_string(),
                    retry_after_seconds: Some(30),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (AppError::Conflict("busy".to_string()), StatusCode::CONFLICT),
            (AppError::Delivery(TransportError::Status(500)), StatusCode::BAD_GATEWAY),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_server_side_errors_map_to_500() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        for error in [AppError::IoError(io), AppError::InternalServerError] {
            assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_retry_after_header() {
        let response = AppError::RateLimited {
            message: "slow down".to_string(),
            retry_after_seconds: Some(42),
        }
        .into_response();

        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn test_submit_error_conversion() {
        let err: AppError = SubmitError::InFlight.into();
        assert!(matches!(err, AppError::Conflict(_)));

        let err: AppError = SubmitError::RateLimited("wait".to_string()).into();
        assert!(matches!(err, AppError::RateLimited { retry_after_seconds: None, .. }));
    }
}
