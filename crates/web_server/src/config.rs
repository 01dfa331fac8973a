//! Environment-driven server configuration.
//!
//! Every option only shapes middleware (port, CORS origin, session cookie, static bundle); none
//! changes how requests are dispatched.

use std::path::PathBuf;

use axum::http::HeaderValue;
use thiserror::Error;

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;
/// Allowed cross-origin client when `CLIENT_URL` is unset.
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:3000";
/// Session signing secret used when `SESSION_SECRET` is unset.
pub const DEVELOPMENT_SESSION_SECRET: &str = "host-dev-secret-change-in-production";
/// Static bundle directory used when `STATIC_DIR` is unset.
pub const DEFAULT_STATIC_DIR: &str = "dist-web";

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `PORT` is not a valid TCP port.
    #[error("invalid PORT `{0}`")]
    InvalidPort(String),
    /// `CLIENT_URL` cannot be used as an origin header.
    #[error("invalid CLIENT_URL `{0}`")]
    InvalidClientUrl(String),
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Origin allowed to make credentialed cross-origin requests.
    pub client_origin: HeaderValue,
    /// Secret used to sign session identifiers.
    pub session_secret: String,
    /// Production mode: secure cookies and static bundle serving.
    pub production: bool,
    /// Directory of the built web bundle served in production.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            client_origin: HeaderValue::from_static(DEFAULT_CLIENT_URL),
            session_secret: DEVELOPMENT_SESSION_SECRET.to_string(),
            production: false,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => defaults.port,
        };
        let client_origin = match lookup("CLIENT_URL") {
            Some(raw) => HeaderValue::from_str(raw.trim_end_matches('/'))
                .map_err(|_| ConfigError::InvalidClientUrl(raw.clone()))?,
            None => defaults.client_origin,
        };

        Ok(Self {
            port,
            client_origin,
            session_secret: lookup("SESSION_SECRET").unwrap_or(defaults.session_secret),
            production: lookup("NODE_ENV").is_some_and(|mode| mode == "production"),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        })
    }
}
