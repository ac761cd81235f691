use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_PAGE_SIZE: u64 = 10;
const CONFIG_DIR: &str = "config";

/// Dashboard configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (sqlite or postgres)
    #[validate(length(min = 1), custom = "validate_database_url")]
    pub database_url: String,

    /// Server host address
    #[validate(length(min = 1))]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[validate(length(min = 1))]
    pub environment: String,

    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Directory served under `/static`
    #[serde(default = "default_static_dir")]
    #[validate(length(min = 1))]
    pub static_dir: String,

    /// Upload directory, relative to `static_dir`
    #[serde(default = "default_upload_dir")]
    #[validate(custom = "validate_upload_dir")]
    pub upload_dir: String,

    /// Rows per dashboard list page
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    pub page_size: u64,

    /// Maximum accepted request body in bytes (uploads included)
    #[serde(default = "default_max_body_size")]
    #[validate(range(min = 1024))]
    pub max_body_size: usize,

    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl AppConfig {
    /// Creates a configuration with defaults for every optional setting
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
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
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            static_dir: default_static_dir(),
            upload_dir: default_upload_dir(),
            page_size: default_page_size(),
            max_body_size: default_max_body_size(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Absolute-or-relative path of the upload directory on disk
    pub fn upload_path(&self) -> PathBuf {
        Path::new(&self.static_dir).join(&self.upload_dir)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    8
}
fn default_db_idle_timeout_secs() -> u64 {
    300
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_upload_dir() -> String {
    "upload".to_string()
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_max_body_size() -> usize {
    16 * 1024 * 1024
}

fn default_event_channel_capacity() -> usize {
    256
}

fn validate_database_url(url: &str) -> Result<(), ValidationError> {
    if url.starts_with("sqlite:") || url.starts_with("postgres://") || url.starts_with("postgresql://")
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("database_url");
        err.message = Some("database_url must be a sqlite: or postgres:// URL".into());
        Err(err)
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

fn validate_upload_dir(dir: &str) -> Result<(), ValidationError> {
    let path = Path::new(dir);
    if dir.is_empty()
        || path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        let mut err = ValidationError::new("upload_dir");
        err.message = Some("upload_dir must be a relative path inside static_dir".into());
        return Err(err);
    }
    Ok(())
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("catalog_dashboard={},tower_http=debug,sea_orm=warn", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads dashboard configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    load_config_from(Path::new(CONFIG_DIR), &run_env, true)
}

/// Loads configuration from `config_dir`; `with_env` toggles the `APP__` overrides.
pub fn load_config_from(
    config_dir: &Path,
    run_env: &str,
    with_env: bool,
) -> Result<AppConfig, AppConfigError> {
    let mut builder = Config::builder()
        .set_default("database_url", "sqlite://catalog.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT)?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(run_env)).required(false));

    if with_env {
        builder = builder.add_source(Environment::with_prefix("APP").separator("__"));
    }

    let app_config: AppConfig = builder.build()?.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
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

    fn write_config(dir: &TempDir, filename: &str, content: &str) {
        let mut file = std::fs::File::create(dir.path().join(filename)).unwrap();
        writeln!(file, "{}", content).unwrap();
    }

    #[test]
    fn defaults_apply_without_files() {
        let dir = TempDir::new().unwrap();
        let config = load_config_from(dir.path(), "development", false).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.static_dir, "static");
        assert_eq!(config.upload_path(), Path::new("static").join("upload"));
        assert!(!config.is_production());
    }

    #[test]
    fn environment_file_overrides_default_file() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
                database_url = "sqlite://default.db"
                page_size = 20
            "#,
        );
        write_config(
            &dir,
            "production.toml",
            r#"
                database_url = "postgres://db/catalog"
                log_json = true
            "#,
        );

        let config = load_config_from(dir.path(), "production", false).unwrap();
        assert_eq!(config.database_url(), "postgres://db/catalog");
        assert_eq!(config.page_size, 20);
        assert!(config.log_json);
        assert!(config.is_production());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
                database_url = "mysql://nope"
                log_level = "loud"
                page_size = 0
                upload_dir = "../escape"
                event_channel_capacity = 0
            "#,
        );

        let result = load_config_from(dir.path(), "development", false);
        match result {
            Err(AppConfigError::Validation(errors)) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("database_url"));
                assert!(fields.contains_key("log_level"));
                assert!(fields.contains_key("page_size"));
                assert!(fields.contains_key("upload_dir"));
                assert!(fields.contains_key("event_channel_capacity"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "default.toml", "jwt_secret = \"x\"");
        assert!(matches!(
            load_config_from(dir.path(), "development", false),
            Err(AppConfigError::Load(_))
        ));
    }
}
