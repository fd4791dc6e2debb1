use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::gemini::GeminiError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
    details: Value,
}

#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    NotFound { message: String, details: Value },
    BadGateway { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn bad_gateway(message: impl Into<String>, details: Value) -> Self {
        Self::BadGateway {
            message: message.into(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            ),
            AppError::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details)
            }
            AppError::BadGateway { message, details } => {
                (StatusCode::BAD_GATEWAY, "bad_gateway", message, details)
            }
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<GeminiError> for AppError {
    fn from(e: GeminiError) -> Self {
        if e.is_client_error() {
            AppError::bad_request("Invalid Gemini request", json!({ "reason": e.to_string() }))
        } else {
            AppError::bad_gateway("Gemini request failed", json!({ "reason": e.to_string() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_gemini_client_error_maps_to_validation() {
        let error: AppError = GeminiError::UrlTooLong(2000).into();
        assert!(matches!(error, AppError::Validation { .. }));
    }

    #[test]
    fn test_gemini_invalid_port_maps_to_validation() {
        let error: AppError = GeminiError::InvalidPort(0).into();

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_gemini_protocol_error_is_not_client_error() {
        assert!(!GeminiError::MalformedHeader.is_client_error());
        assert!(!GeminiError::Tls("pin mismatch".to_string()).is_client_error());
        assert!(GeminiError::InvalidUrl("x".to_string()).is_client_error());
    }

    #[test]
    fn test_gemini_transport_error_maps_to_bad_gateway() {
        let error: AppError = GeminiError::Timeout(Duration::from_secs(5)).into();
        assert!(matches!(error, AppError::BadGateway { .. }));

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
