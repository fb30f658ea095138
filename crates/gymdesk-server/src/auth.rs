//! Bearer-token authentication for API handlers.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use gymdesk_auth::token::validate_access_token;
use gymdesk_core::models::staff::StaffRole;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Identity of the staff member behind a request. Every unit-scoped
/// handler uses `unit_id` from here, never from the request body.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub staff_id: Uuid,
    pub unit_id: Uuid,
    pub role: StaffRole,
}

impl AuthContext {
    pub fn require_billing(&self) -> Result<(), ApiError> {
        if self.role.can_manage_billing() {
            Ok(())
        } else {
            Err(ApiError::forbidden("billing requires an owner or manager"))
        }
    }

    pub fn require_owner(&self) -> Result<(), ApiError> {
        if self.role.can_manage_staff() {
            Ok(())
        } else {
            Err(ApiError::forbidden("only the unit owner can do this"))
        }
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// `EventSource` cannot send headers, so the chat stream also accepts
/// `?access_token=`.
fn query_token(parts: &Parts) -> Option<&str> {
    parts
        .uri
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("access_token="))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(&parts.headers)
            .or_else(|| query_token(parts))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

        let claims = validate_access_token(token, state.auth_config())?;
        Ok(Self {
            staff_id: claims.staff_id,
            unit_id: claims.unit_id,
            role: claims.role,
        })
    }
}

/// Client details recorded on sessions.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Ok(Self {
            ip_address: header("x-forwarded-for")
                .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
                .filter(|ip| !ip.is_empty()),
            user_agent: header(USER_AGENT.as_str()),
        })
    }
}
