use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub tracking: TrackingLimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Name of the session cookie the auth chain accepts.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
}

/// Server-side tracking pipeline limits.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingLimitsConfig {
    /// Minimum spacing between accepted samples per (user, device).
    #[serde(default = "default_min_sample_spacing")]
    pub min_sample_spacing_secs: i64,

    /// Most-recent sample count the history pruner keeps per user.
    #[serde(default = "default_history_keep_samples")]
    pub history_keep_samples: i64,

    /// Battery level at or below which a battery_low alert fires.
    #[serde(default = "default_low_battery_threshold")]
    pub low_battery_threshold: i32,

    /// Suppression window between battery_low alerts per user.
    #[serde(default = "default_battery_alert_window")]
    pub battery_alert_window_secs: i64,

    /// Cap for the event listing endpoint.
    #[serde(default = "default_event_list_limit")]
    pub event_list_limit: i64,
}

impl Default for TrackingLimitsConfig {
    fn default() -> Self {
        Self {
            min_sample_spacing_secs: default_min_sample_spacing(),
            history_keep_samples: default_history_keep_samples(),
            low_battery_threshold: default_low_battery_threshold(),
            battery_alert_window_secs: default_battery_alert_window(),
            event_list_limit: default_event_list_limit(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_session_cookie() -> String {
    "fl_session".to_string()
}
fn default_min_sample_spacing() -> i64 {
    5
}
fn default_history_keep_samples() -> i64 {
    1000
}
fn default_low_battery_threshold() -> i32 {
    15
}
fn default_battery_alert_window() -> i64 {
    3600
}
fn default_event_list_limit() -> i64 {
    200
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with FL__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("FL").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::InvalidValue(
                "database.url must not be empty".into(),
            ));
        }
        if self.tracking.min_sample_spacing_secs < 0 {
            return Err(ConfigValidationError::InvalidValue(
                "tracking.min_sample_spacing_secs must be non-negative".into(),
            ));
        }
        if self.tracking.history_keep_samples < 1 {
            return Err(ConfigValidationError::InvalidValue(
                "tracking.history_keep_samples must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Socket address the server binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .expect("invalid server host/port configuration")
    }
}
