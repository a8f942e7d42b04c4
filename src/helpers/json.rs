use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_derive::Serialize;

/// Machine-readable error codes carried in every error envelope.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingToken,
    InvalidToken,
    MissingUserId,
    MissingFields,
    InvalidProvider,
    NotSynced,
    SyncFailed,
}

#[derive(Serialize, Debug)]
struct ErrorBody {
    error: String,
    code: ErrorCode,
}

/// Error responses share one wire shape: `{"error": "...", "code": "..."}`.
/// Success bodies are bespoke per route.
pub struct JsonResponse;

impl JsonResponse {
    fn error(status: StatusCode, code: ErrorCode, message: String) -> actix_web::Error {
        let body = ErrorBody {
            error: message.clone(),
            code,
        };
        let response = HttpResponse::build(status).json(&body);
        InternalError::from_response(message, response).into()
    }

    pub fn unauthorized(code: ErrorCode, message: impl Into<String>) -> actix_web::Error {
        Self::error(StatusCode::UNAUTHORIZED, code, message.into())
    }

    pub fn bad_request(code: ErrorCode, message: impl Into<String>) -> actix_web::Error {
        Self::error(StatusCode::BAD_REQUEST, code, message.into())
    }

    pub fn not_found(message: impl Into<String>) -> actix_web::Error {
        Self::error(StatusCode::NOT_FOUND, ErrorCode::NotSynced, message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> actix_web::Error {
        let message = message.into();
        let shown = if message.trim().is_empty() {
            "Sync failed".to_string()
        } else {
            message
        };
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::SyncFailed, shown)
    }
}
