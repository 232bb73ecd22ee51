use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_TERMINAL_STAGE: &str = "Testing";
const DEFAULT_DISASSEMBLE_STAGE: &str = "Disassemble";

/// Item type names accepted in intake role mappings.
const VALID_ITEM_TYPES: [&str; 2] = ["NEW", "SERVICE"];

/// One intake role mapping: role name → item type + initial stage.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct IntakeRole {
    /// `NEW` or `SERVICE`
    pub item_type: String,
    /// Stage the unit enters the pipeline at
    pub initial_stage: String,
}

/// Pipeline routing configuration.
///
/// The role→(item type, initial stage) selection is deliberately explicit
/// startup configuration instead of hard-coded role names, so an unknown
/// role fails at creation time.
#[derive(Clone, Debug, Deserialize)]
pub struct PipelineConfig {
    /// Terminal stage of every flow; completing here finalizes the unit.
    #[serde(default = "default_terminal_stage")]
    pub terminal_stage: String,

    /// Stage whose redirect target mints a disassemble recovery session.
    #[serde(default = "default_disassemble_stage")]
    pub disassemble_stage: String,

    /// Role name → intake mapping.
    #[serde(default = "default_intake_roles")]
    pub intake_roles: HashMap<String, IntakeRole>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            terminal_stage: default_terminal_stage(),
            disassemble_stage: default_disassemble_stage(),
            intake_roles: default_intake_roles(),
        }
    }
}

impl PipelineConfig {
    /// Resolve an intake role to its mapping, if configured.
    pub fn intake_role(&self, role: &str) -> Option<&IntakeRole> {
        self.intake_roles.get(role)
    }

    fn validate_entries(&self) -> Result<(), String> {
        if self.terminal_stage.trim().is_empty() {
            return Err("pipeline.terminal_stage must not be empty".into());
        }
        if self.disassemble_stage.trim().is_empty() {
            return Err("pipeline.disassemble_stage must not be empty".into());
        }
        if self.intake_roles.is_empty() {
            return Err("pipeline.intake_roles must define at least one role".into());
        }
        for (role, mapping) in &self.intake_roles {
            if role.trim().is_empty() {
                return Err("pipeline.intake_roles contains an empty role name".into());
            }
            if mapping.initial_stage.trim().is_empty() {
                return Err(format!(
                    "pipeline.intake_roles.{}: initial_stage must not be empty",
                    role
                ));
            }
            if !VALID_ITEM_TYPES.contains(&mapping.item_type.as_str()) {
                return Err(format!(
                    "pipeline.intake_roles.{}: item_type must be one of {:?}, got {:?}",
                    role, VALID_ITEM_TYPES, mapping.item_type
                ));
            }
        }
        Ok(())
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
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
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Event channel capacity for the in-process event loop
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Pipeline routing configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Minimal constructor used by tests and embedders.
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            pipeline: PipelineConfig::default(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Constraints the validator derive cannot express.
    pub fn validate_additional_constraints(&self) -> Result<(), AppConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(AppConfigError::Invalid(
                "database_url must not be empty".into(),
            ));
        }
        if self.db_min_connections > self.db_max_connections {
            return Err(AppConfigError::Invalid(format!(
                "db_min_connections ({}) exceeds db_max_connections ({})",
                self.db_min_connections, self.db_max_connections
            )));
        }
        self.pipeline
            .validate_entries()
            .map_err(AppConfigError::Invalid)
    }
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_terminal_stage() -> String {
    DEFAULT_TERMINAL_STAGE.to_string()
}
fn default_disassemble_stage() -> String {
    DEFAULT_DISASSEMBLE_STAGE.to_string()
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
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_event_channel_capacity() -> usize {
    256
}

/// The two intake roles the source deployment ships with. Deployments add
/// or replace entries through `config/*.toml` or environment overrides.
fn default_intake_roles() -> HashMap<String, IntakeRole> {
    HashMap::from([
        (
            "Disassemble".to_string(),
            IntakeRole {
                item_type: "SERVICE".to_string(),
                initial_stage: "Disassemble".to_string(),
            },
        ),
        (
            "MPC Work".to_string(),
            IntakeRole {
                item_type: "NEW".to_string(),
                initial_stage: "MPC Work".to_string(),
            },
        ),
    ])
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Configuration validation failed: {0:?}")]
    Validation(validator::ValidationErrors),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Loads configuration from `config/default.toml`, the environment profile,
/// and `SERVICETRACK__`-prefixed environment variables, then validates it.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
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

    let config = Config::builder()
        .set_default("database_url", "sqlite://servicetrack.db?mode=rwc")?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("SERVICETRACK").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {}", e);
        e
    })?;

    Ok(app_config)
}
