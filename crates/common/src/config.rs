//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload limits.
    #[serde(default)]
    pub uploads: UploadConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    #[serde(default = "default_url")]
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            url: default_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait when opening or acquiring a connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Seconds an idle connection is kept.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Seconds before a connection is recycled.
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
    /// Log every SQL statement at debug level.
    #[serde(default)]
    pub log_statements: bool,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC key used to sign JWTs (`JWT_KEY`).
    pub jwt_key: String,
    /// JWT issuer (`JWT_ISSUER`).
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// Token lifetime for a regular session, in hours.
    #[serde(default = "default_session_hours")]
    pub session_hours: i64,
    /// Token lifetime when "remember me" is requested, in days.
    #[serde(default = "default_remember_days")]
    pub remember_days: i64,
    /// Whether the auth cookie carries the `Secure` attribute.
    #[serde(default = "default_true")]
    pub cookie_secure: bool,
    /// Google OAuth client, if configured.
    #[serde(default)]
    pub google: Option<GoogleOAuthConfig>,
}

/// Google OAuth client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleOAuthConfig {
    /// `GOOGLE_CLIENT_ID`.
    pub client_id: String,
    /// `GOOGLE_CLIENT_SECRET`.
    pub client_secret: String,
    /// Callback URL registered with Google.
    #[serde(default = "default_google_redirect")]
    pub redirect_url: String,
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for stored files.
    #[serde(default = "default_storage_path")]
    pub base_path: PathBuf,
    /// URL prefix the files are served under.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
            base_url: default_storage_url(),
        }
    }
}

/// Upload limits for article attachments.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum attachments per article.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Maximum size of one attachment in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_file_size: default_max_file_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_url() -> String {
    "http://localhost:3000".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_idle_timeout_secs() -> u64 {
    600
}

const fn default_max_lifetime_secs() -> u64 {
    1800
}

fn default_issuer() -> String {
    "matrix".to_string()
}

const fn default_session_hours() -> i64 {
    24
}

const fn default_remember_days() -> i64 {
    30
}

const fn default_true() -> bool {
    true
}

fn default_google_redirect() -> String {
    "http://localhost:3000/api/auth/google/callback".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./files")
}

fn default_storage_url() -> String {
    "/files".to_string()
}

const fn default_max_files() -> usize {
    6
}

const fn default_max_file_size() -> u64 {
    5 * 1024 * 1024
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `MATRIX_ENV`)
    /// 3. Environment variables with `MATRIX__` prefix
    /// 4. `JWT_KEY`, `JWT_ISSUER`, `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("MATRIX_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MATRIX")
                    .separator("__")
                    .try_parsing(true),
            );

        with_bare_env_overrides(builder)?.build()?.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MATRIX")
                    .separator("__")
                    .try_parsing(true),
            );

        with_bare_env_overrides(builder)?.build()?.try_deserialize()
    }
}

/// Apply the unprefixed environment variables the deployment sets.
fn with_bare_env_overrides(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    builder
        .set_override_option("auth.jwt_key", std::env::var("JWT_KEY").ok())?
        .set_override_option("auth.jwt_issuer", std::env::var("JWT_ISSUER").ok())?
        .set_override_option("auth.google.client_id", std::env::var("GOOGLE_CLIENT_ID").ok())?
        .set_override_option(
            "auth.google.client_secret",
            std::env::var("GOOGLE_CLIENT_SECRET").ok(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let uploads = UploadConfig::default();
        assert_eq!(uploads.max_files, 6);
        assert_eq!(uploads.max_file_size, 5 * 1024 * 1024);

        let server = ServerConfig::default();
        assert_eq!(server.port, 3000);
        assert_eq!(server.request_timeout_secs, 30);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: Config = config::Config::builder()
            .set_override("database.url", "postgres://localhost/matrix")
            .unwrap()
            .set_override("auth.jwt_key", "secret")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.auth.jwt_issuer, "matrix");
        assert_eq!(config.auth.remember_days, 30);
        assert!(config.auth.cookie_secure);
        assert!(config.auth.google.is_none());
        assert_eq!(config.database.max_connections, 100);
        assert_eq!(config.database.connect_timeout_secs, 10);
        assert!(!config.database.log_statements);
    }
}
