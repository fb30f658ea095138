//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"error": "<message>"}`. Domain
//! messages are passed through; internal ones are logged and replaced by
//! a generic text.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gymdesk_core::error::GymError;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub GymError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GymError::NotFound { .. } => StatusCode::NOT_FOUND,
            GymError::AlreadyExists { .. } | GymError::Conflict { .. } => StatusCode::CONFLICT,
            GymError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            GymError::AuthorizationDenied { .. } | GymError::TenantContext => StatusCode::FORBIDDEN,
            GymError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GymError::Database(_)
            | GymError::Crypto(_)
            | GymError::Export(_)
            | GymError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self(GymError::AuthorizationDenied {
            reason: reason.into(),
        })
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self(GymError::AuthenticationFailed {
            reason: reason.into(),
        })
    }
}

impl<E: Into<GymError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self.0, "request failed");
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (GymError::not_found("lead", "x"), StatusCode::NOT_FOUND),
            (
                GymError::AlreadyExists {
                    entity: "plan".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                GymError::Conflict {
                    message: "slot taken".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                GymError::AuthenticationFailed {
                    reason: "expired".into(),
                },
                StatusCode::UNAUTHORIZED,
            ),
            (GymError::TenantContext, StatusCode::FORBIDDEN),
            (GymError::validation("bad cpf"), StatusCode::UNPROCESSABLE_ENTITY),
            (
                GymError::Database("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
