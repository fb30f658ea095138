//! Command-line arguments and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use clap::Parser;
use gymdesk_auth::AuthConfig;
use gymdesk_db::DbConfig;

use crate::bootstrap::Bootstrap;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required (set it directly or via the *_FILE variant)")]
    Missing(&'static str),

    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// GymDesk API server
#[derive(Parser, Debug, Clone)]
#[command(name = "gymdesk")]
#[command(about = "Multi-tenant gym management API")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "GYMDESK_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// SurrealDB endpoint (`mem://` for an embedded store)
    #[arg(long, env = "DATABASE_URL", default_value = "ws://127.0.0.1:8000")]
    pub database_url: String,

    #[arg(long, env = "DB_NAMESPACE", default_value = "gymdesk")]
    pub db_namespace: String,

    #[arg(long, env = "DB_DATABASE", default_value = "main")]
    pub db_database: String,

    #[arg(long, env = "DB_USER", default_value = "root")]
    pub db_user: String,

    #[arg(long, env = "DB_PASSWORD", default_value = "root", hide_env_values = true)]
    pub db_password: String,

    /// PEM-encoded Ed25519 signing key
    #[arg(long, env = "JWT_PRIVATE_KEY", hide_env_values = true)]
    pub jwt_private_key: Option<String>,

    #[arg(long, env = "JWT_PRIVATE_KEY_FILE")]
    pub jwt_private_key_file: Option<PathBuf>,

    /// PEM-encoded Ed25519 verification key
    #[arg(long, env = "JWT_PUBLIC_KEY")]
    pub jwt_public_key: Option<String>,

    #[arg(long, env = "JWT_PUBLIC_KEY_FILE")]
    pub jwt_public_key_file: Option<PathBuf>,

    #[arg(long, env = "JWT_ISSUER", default_value = "gymdesk")]
    pub jwt_issuer: String,

    #[arg(long, env = "ACCESS_TOKEN_TTL_SECS", default_value = "900")]
    pub access_token_ttl_secs: u64,

    #[arg(long, env = "REFRESH_TOKEN_TTL_SECS", default_value = "2592000")]
    pub refresh_token_ttl_secs: u64,

    /// Secret mixed into password hashes
    #[arg(long, env = "PASSWORD_PEPPER", hide_env_values = true)]
    pub password_pepper: Option<String>,

    /// Seconds between billing and automation sweeps; 0 disables them
    #[arg(long, env = "AUTOMATION_INTERVAL_SECS", default_value = "3600")]
    pub automation_interval_secs: u64,

    /// Reject check-in QR codes older than this many seconds
    #[arg(long, env = "QR_MAX_AGE_SECS")]
    pub qr_max_age_secs: Option<i64>,

    /// First unit and owner
    #[command(flatten)]
    pub bootstrap: BootstrapArgs,
}

/// Unit and Owner created on startup when missing. Nothing is seeded
/// unless the slug is set.
#[derive(Parser, Debug, Clone)]
pub struct BootstrapArgs {
    #[arg(long, env = "BOOTSTRAP_UNIT_SLUG")]
    pub bootstrap_unit_slug: Option<String>,

    /// Display name; defaults to the slug
    #[arg(long, env = "BOOTSTRAP_UNIT_NAME")]
    pub bootstrap_unit_name: Option<String>,

    #[arg(long, env = "BOOTSTRAP_OWNER_NAME", default_value = "Owner")]
    pub bootstrap_owner_name: String,

    #[arg(long, env = "BOOTSTRAP_OWNER_EMAIL")]
    pub bootstrap_owner_email: Option<String>,

    #[arg(long, env = "BOOTSTRAP_OWNER_PASSWORD", hide_env_values = true)]
    pub bootstrap_owner_password: Option<String>,
}

fn inline_or_file(
    inline: &Option<String>,
    file: &Option<PathBuf>,
    name: &'static str,
) -> Result<String, ConfigError> {
    if let Some(value) = inline.as_ref().filter(|v| !v.trim().is_empty()) {
        return Ok(value.clone());
    }
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        }),
        None => Err(ConfigError::Missing(name)),
    }
}

impl Args {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.database_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_user.clone(),
            password: self.db_password.clone(),
        }
    }

    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        Ok(AuthConfig {
            jwt_private_key_pem: inline_or_file(
                &self.jwt_private_key,
                &self.jwt_private_key_file,
                "JWT_PRIVATE_KEY",
            )?,
            jwt_public_key_pem: inline_or_file(
                &self.jwt_public_key,
                &self.jwt_public_key_file,
                "JWT_PUBLIC_KEY",
            )?,
            access_token_lifetime_secs: self.access_token_ttl_secs,
            refresh_token_lifetime_secs: self.refresh_token_ttl_secs,
            jwt_issuer: self.jwt_issuer.clone(),
            pepper: self.password_pepper.clone().filter(|p| !p.is_empty()),
        })
    }

    pub fn sweep_interval(&self) -> Option<std::time::Duration> {
        (self.automation_interval_secs > 0)
            .then(|| std::time::Duration::from_secs(self.automation_interval_secs))
    }

    /// The seed to apply on startup, if one is configured.
    pub fn bootstrap(&self) -> Result<Option<Bootstrap>, ConfigError> {
        let seed = &self.bootstrap;
        let Some(slug) = seed
            .bootstrap_unit_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };
        let owner_email = seed
            .bootstrap_owner_email
            .clone()
            .ok_or(ConfigError::Missing("BOOTSTRAP_OWNER_EMAIL"))?;
        let owner_password = seed
            .bootstrap_owner_password
            .clone()
            .ok_or(ConfigError::Missing("BOOTSTRAP_OWNER_PASSWORD"))?;

        Ok(Some(Bootstrap {
            unit_name: seed
                .bootstrap_unit_name
                .clone()
                .unwrap_or_else(|| slug.to_string()),
            unit_slug: slug.to_string(),
            owner_name: seed.bootstrap_owner_name.clone(),
            owner_email,
            owner_password,
        }))
    }

    pub fn qr_max_age(&self) -> Option<Duration> {
        self.qr_max_age_secs
            .filter(|secs| *secs > 0)
            .map(Duration::seconds)
    }
}
