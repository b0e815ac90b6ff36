use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::{MatchingPolicy, ScoringPolicy};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default)]
    pub tolerances: ToleranceConfig,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            tolerances: ToleranceConfig::default(),
        }
    }
}

fn default_limit() -> usize {
    20
}

fn default_max_limit() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceConfig {
    #[serde(default = "default_min_size_factor")]
    pub min_size_factor: f64,
    #[serde(default = "default_max_price_factor")]
    pub max_price_factor: f64,
    #[serde(default = "default_point_zone_radius_m")]
    pub point_zone_radius_m: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            min_size_factor: default_min_size_factor(),
            max_price_factor: default_max_price_factor(),
            point_zone_radius_m: default_point_zone_radius_m(),
        }
    }
}

fn default_min_size_factor() -> f64 {
    0.8
}

fn default_max_price_factor() -> f64 {
    1.20
}

fn default_point_zone_radius_m() -> f64 {
    2000.0
}

impl ToleranceConfig {
    pub fn to_policy(&self) -> MatchingPolicy {
        MatchingPolicy {
            min_size_factor: self.min_size_factor,
            max_price_factor: self.max_price_factor,
            point_zone_radius_m: self.point_zone_radius_m,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub penalties: PenaltyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PenaltyConfig {
    #[serde(default = "default_size_overshoot_factor")]
    pub size_overshoot_factor: f64,
    #[serde(default = "default_size_penalty_cap")]
    pub size_penalty_cap: f64,
    #[serde(default = "default_size_penalty_slope")]
    pub size_penalty_slope: f64,
    #[serde(default = "default_over_budget_penalty_cap")]
    pub over_budget_penalty_cap: f64,
    #[serde(default = "default_over_budget_penalty_slope")]
    pub over_budget_penalty_slope: f64,
    #[serde(default = "default_under_budget_threshold")]
    pub under_budget_threshold: f64,
    #[serde(default = "default_under_budget_penalty_cap")]
    pub under_budget_penalty_cap: f64,
    #[serde(default = "default_under_budget_penalty_slope")]
    pub under_budget_penalty_slope: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            size_overshoot_factor: default_size_overshoot_factor(),
            size_penalty_cap: default_size_penalty_cap(),
            size_penalty_slope: default_size_penalty_slope(),
            over_budget_penalty_cap: default_over_budget_penalty_cap(),
            over_budget_penalty_slope: default_over_budget_penalty_slope(),
            under_budget_threshold: default_under_budget_threshold(),
            under_budget_penalty_cap: default_under_budget_penalty_cap(),
            under_budget_penalty_slope: default_under_budget_penalty_slope(),
        }
    }
}

fn default_size_overshoot_factor() -> f64 {
    1.5
}

fn default_size_penalty_cap() -> f64 {
    30.0
}

fn default_size_penalty_slope() -> f64 {
    30.0
}

fn default_over_budget_penalty_cap() -> f64 {
    40.0
}

fn default_over_budget_penalty_slope() -> f64 {
    400.0
}

fn default_under_budget_threshold() -> f64 {
    0.8
}

fn default_under_budget_penalty_cap() -> f64 {
    15.0
}

fn default_under_budget_penalty_slope() -> f64 {
    75.0
}

impl PenaltyConfig {
    pub fn to_policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            size_overshoot_factor: self.size_overshoot_factor,
            size_penalty_cap: self.size_penalty_cap,
            size_penalty_slope: self.size_penalty_slope,
            over_budget_penalty_cap: self.over_budget_penalty_cap,
            over_budget_penalty_slope: self.over_budget_penalty_slope,
            under_budget_threshold: self.under_budget_threshold,
            under_budget_penalty_cap: self.under_budget_penalty_cap,
            under_budget_penalty_slope: self.under_budget_penalty_slope,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ESTATE__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ESTATE__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        settings.try_deserialize::<Settings>()?.validated()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize::<Settings>()?.validated()
    }

    /// Reject tolerance values that would make every listing fail or pass
    fn validated(self) -> Result<Self, ConfigError> {
        let tolerances = &self.matching.tolerances;
        let positive = [
            ("matching.tolerances.min_size_factor", tolerances.min_size_factor),
            ("matching.tolerances.max_price_factor", tolerances.max_price_factor),
            ("matching.tolerances.point_zone_radius_m", tolerances.point_zone_radius_m),
        ];

        for (key, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Message(format!("{} must be a positive number, got {}", key, value)));
            }
        }

        if self.matching.default_limit == 0 || self.matching.max_limit < self.matching.default_limit {
            return Err(ConfigError::Message(
                "matching.default_limit must be between 1 and matching.max_limit".to_string(),
            ));
        }

        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("ESTATE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
