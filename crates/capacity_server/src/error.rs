use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use capacity_core::error::CapacityError;

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: &'static str,
}

/// Handler error: a domain error rendered as `{code, message}`.
#[derive(Debug)]
pub struct AppError(pub CapacityError);

impl From<CapacityError> for AppError {
    fn from(e: CapacityError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_business() {
            tracing::warn!(status = status.as_u16(), error = %self.0, "request rejected");
        } else {
            tracing::error!(status = status.as_u16(), error = ?self.0, "request failed");
        }

        let message = self.0.technical_message();
        let body = ErrorBody {
            code: message.code(),
            message: message.message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capacity_core::error::TechnicalMessage;

    #[test]
    fn status_follows_error_kind() {
        let resp = AppError(CapacityError::EntityAlreadyExists(
            TechnicalMessage::CapacityAlreadyExists,
        ))
        .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = AppError(CapacityError::technical(TechnicalMessage::ErrorTechnologyAdapter))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
