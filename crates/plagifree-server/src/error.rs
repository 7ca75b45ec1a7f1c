use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use plagifree_core::PlagiError;
use serde_json::json;

/// JSON error body returned by every API route: `{ "error", "message" }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_name: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_name: error_name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "InvalidRequest", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error_name,
            "message": self.message,
        });
        (self.status, axum::Json(body)).into_response()
    }
}

impl From<PlagiError> for ApiError {
    fn from(err: PlagiError) -> Self {
        let (status, name) = match &err {
            PlagiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "InvalidRequest"),
            PlagiError::EmailAlreadyRegistered => {
                (StatusCode::BAD_REQUEST, "EmailAlreadyRegistered")
            }
            PlagiError::Auth(_) => (StatusCode::UNAUTHORIZED, "AuthenticationRequired"),
            PlagiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "InvalidCredentials"),
            PlagiError::Forbidden(_) => (StatusCode::FORBIDDEN, "AuthorizationError"),
            PlagiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            PlagiError::AccountNotFound => (StatusCode::UNAUTHORIZED, "AuthenticationRequired"),
            PlagiError::QuotaExceeded(_) => (StatusCode::TOO_MANY_REQUESTS, "QuotaExceeded"),
            PlagiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UpstreamFailure"),
            PlagiError::Storage(_) | PlagiError::Crypto(_) | PlagiError::InternalError(_) => {
                tracing::error!(error = %err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError")
            }
        };
        ApiError::new(status, name, err.to_string())
    }
}
