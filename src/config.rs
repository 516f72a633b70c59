use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::validation::PasswordPolicy;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_JWT_EXPIRATION_SECS: u64 = 48 * 60 * 60;
const CONFIG_DIR: &str = "config";
pub const DEV_DEFAULT_JWT_SECRET: &str = "stayhub_development_secret_change_me_before_deploying";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// JWT signing secret (minimum 32 characters)
    #[validate(length(min = 32, message = "jwt_secret must be at least 32 characters"))]
    pub jwt_secret: String,

    /// JWT lifetime in seconds
    #[serde(default = "default_jwt_expiration_secs")]
    #[validate(range(min = 60))]
    pub jwt_expiration_secs: u64,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment: development, test or production
    #[validate(custom = "validate_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Password strength rule for users and hosts
    #[serde(default)]
    pub password_policy: PasswordPolicy,

    /// Whether users and hosts must supply an image URL as profile picture
    #[serde(default)]
    pub require_profile_picture: bool,
}

impl AppConfig {
    /// Creates a new configuration with defaults for everything not given
    pub fn new(
        database_url: String,
        jwt_secret: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration_secs: default_jwt_expiration_secs(),
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            cors_allowed_origins: None,
            password_policy: PasswordPolicy::default(),
            require_profile_picture: false,
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Explicitly configured CORS origins, trimmed and without blanks
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.is_production() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            let mut err = ValidationError::new("jwt_secret_default_dev");
            err.message = Some(
                "The bundled development JWT secret must not be used in production. Set APP__JWT_SECRET to a unique, secure value."
                    .into(),
            );
            errors.add("jwt_secret", err);
        }

        if self.is_production() && self.cors_origins().iter().any(|origin| origin == "*") {
            let mut err = ValidationError::new("cors_wildcard");
            err.message =
                Some("A wildcard CORS origin is not allowed in production; list origins explicitly".into());
            errors.add("cors_allowed_origins", err);
        }

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_pool_bounds");
            err.message = Some("db_min_connections cannot exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_jwt_expiration_secs() -> u64 {
    DEFAULT_JWT_EXPIRATION_SECS
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn validate_environment(environment: &str) -> Result<(), ValidationError> {
    match environment.to_ascii_lowercase().as_str() {
        "development" | "test" | "production" => Ok(()),
        _ => {
            let mut err = ValidationError::new("environment");
            err.message = Some("Must be one of: development, test, production".into());
            Err(err)
        }
    }
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("stayhub_api={},tower_http=info,sea_orm=warn", level);
    let filter = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(default_directive));

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{RUN_ENV}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Same as [`load_config`] but with an explicit config directory and profile.
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://stayhub.db?mode=rwc")?
        .set_default("jwt_secret", DEV_DEFAULT_JWT_SECRET)?
        .set_default("jwt_expiration_secs", DEFAULT_JWT_EXPIRATION_SECS)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "a_test_secret_that_is_comfortably_long_enough".into(),
            "127.0.0.1".into(),
            3000,
            "production".into(),
        )
    }

    #[test]
    fn defaults_are_strict_and_48h() {
        let cfg = base_config();
        assert_eq!(cfg.password_policy, PasswordPolicy::Strict);
        assert_eq!(cfg.jwt_expiration_secs, 172_800);
        assert!(!cfg.require_profile_picture);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn production_rejects_dev_secret() {
        let mut cfg = base_config();
        cfg.jwt_secret = DEV_DEFAULT_JWT_SECRET.into();
        assert!(cfg.validate_additional_constraints().is_err());

        cfg.environment = "development".into();
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn production_rejects_wildcard_cors() {
        let mut cfg = base_config();
        cfg.cors_allowed_origins = Some("https://stayhub.example, *".into());
        assert!(cfg.validate_additional_constraints().is_err());

        cfg.cors_allowed_origins = Some("https://stayhub.example".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn short_secret_fails_validation() {
        let mut cfg = base_config();
        cfg.jwt_secret = "too-short".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_environment_fails_validation() {
        let mut cfg = base_config();
        cfg.environment = "staging-ish".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn cors_origins_are_trimmed() {
        let mut cfg = base_config();
        cfg.cors_allowed_origins = Some(" https://a.example , ,https://b.example".into());
        assert_eq!(
            cfg.cors_origins(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn loads_profile_file_over_defaults() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("test.toml")).unwrap();
        writeln!(
            file,
            r#"
            database_url = "sqlite::memory:"
            port = 4100
            password_policy = "basic"
            require_profile_picture = true
            "#
        )
        .unwrap();

        let cfg = load_config_from(dir.path(), "test").unwrap();
        assert_eq!(cfg.port, 4100);
        assert_eq!(cfg.environment, "test");
        assert_eq!(cfg.password_policy, PasswordPolicy::Basic);
        assert!(cfg.require_profile_picture);
        assert_eq!(cfg.jwt_secret, DEV_DEFAULT_JWT_SECRET);
    }
}
