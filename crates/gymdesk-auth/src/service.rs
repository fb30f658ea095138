//! Authentication service: staff login, refresh rotation and logout.

use chrono::{Duration, Utc};
use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::models::session::CreateSession;
use gymdesk_core::models::staff::{StaffMember, StaffStatus};
use gymdesk_core::repository::{SessionRepository, StaffRepository};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub unit_id: Uuid,
    pub email: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Token pair handed back on login and on refresh.
#[derive(Debug, Serialize)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Raw opaque refresh token (returned to the client, never stored).
    pub refresh_token: String,
    pub session_id: Uuid,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub staff: StaffMember,
}

/// Input for the refresh token rotation flow.
#[derive(Debug)]
pub struct RefreshInput {
    pub unit_id: Uuid,
    pub raw_refresh_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: StaffRepository, S: SessionRepository> {
    staff_repo: U,
    session_repo: S,
    config: AuthConfig,
}

impl<U: StaffRepository, S: SessionRepository> AuthService<U, S> {
    pub fn new(staff_repo: U, session_repo: S, config: AuthConfig) -> Self {
        Self {
            staff_repo,
            session_repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticate a staff member by email and password and issue
    /// tokens. Unknown emails and wrong passwords are indistinguishable.
    pub async fn login(&self, input: LoginInput) -> GymResult<LoginOutput> {
        let staff = match self
            .staff_repo
            .get_by_email(input.unit_id, &input.email)
            .await
        {
            Ok(s) => s,
            Err(GymError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            &input.password,
            &staff.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            warn!(unit_id = %input.unit_id, staff_id = %staff.id, "login rejected: bad password");
            return Err(AuthError::InvalidCredentials.into());
        }

        if staff.status != StaffStatus::Active {
            return Err(AuthError::AccountInactive.into());
        }

        let output = self
            .open_session(staff, input.ip_address, input.user_agent)
            .await?;
        info!(unit_id = %input.unit_id, staff_id = %output.staff.id, "staff logged in");
        Ok(output)
    }

    /// Rotate a refresh token: consume the old one, verify the staff
    /// member is still active, and issue a new token pair.
    ///
    /// Each refresh token is single-use; the old session is invalidated
    /// before the new one is created.
    pub async fn refresh(&self, input: RefreshInput) -> GymResult<LoginOutput> {
        let token_hash = token::hash_refresh_token(&input.raw_refresh_token);
        let session = self
            .session_repo
            .get_by_token_hash(input.unit_id, &token_hash)
            .await
            .map_err(|e| match e {
                GymError::NotFound { .. } => {
                    AuthError::TokenInvalid("refresh token not found or already used".into()).into()
                }
                other => other,
            })?;

        self.session_repo
            .invalidate(input.unit_id, session.id)
            .await?;

        if session.expires_at <= Utc::now() {
            return Err(AuthError::TokenExpired.into());
        }

        let staff = self
            .staff_repo
            .get_by_id(input.unit_id, session.staff_id)
            .await?;
        if staff.status != StaffStatus::Active {
            return Err(AuthError::AccountInactive.into());
        }

        self.open_session(staff, input.ip_address, input.user_agent)
            .await
    }

    /// Invalidate a single session (logout).
    pub async fn logout(&self, unit_id: Uuid, session_id: Uuid) -> GymResult<()> {
        self.session_repo.invalidate(unit_id, session_id).await
    }

    /// Logout by presenting the refresh token instead of the session id.
    pub async fn logout_with_refresh_token(&self, unit_id: Uuid, raw: &str) -> GymResult<()> {
        let token_hash = token::hash_refresh_token(raw);
        match self
            .session_repo
            .get_by_token_hash(unit_id, &token_hash)
            .await
        {
            Ok(session) => self.session_repo.invalidate(unit_id, session.id).await,
            // Already gone: logging out twice is not an error.
            Err(GymError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Revoke all sessions of a staff member (e.g. on deactivation).
    pub async fn revoke_all_sessions(&self, unit_id: Uuid, staff_id: Uuid) -> GymResult<()> {
        self.session_repo
            .invalidate_staff_sessions(unit_id, staff_id)
            .await
    }

    async fn open_session(
        &self,
        staff: StaffMember,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> GymResult<LoginOutput> {
        let raw_refresh = token::generate_refresh_token();
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let session = self
            .session_repo
            .create(CreateSession {
                unit_id: staff.unit_id,
                staff_id: staff.id,
                token_hash: token::hash_refresh_token(&raw_refresh),
                ip_address,
                user_agent,
                expires_at,
            })
            .await?;

        let access_token =
            token::issue_access_token(staff.id, staff.unit_id, staff.role, &self.config)?;

        Ok(LoginOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: session.id,
            expires_in: self.config.access_token_lifetime_secs,
            staff,
        })
    }
}
