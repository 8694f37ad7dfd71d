//! Configuration loading and typed config structures for the Colony
//! simulation.
//!
//! The canonical configuration lives in `colony-config.yaml` at the project
//! root. Every field has a default, so a partial (or empty) file is valid.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use colony_types::Resource;

/// Environment variable that overrides `logging.level`.
pub const LOG_LEVEL_ENV: &str = "COLONY_LOG_LEVEL";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration. Mirrors `colony-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Settlement name and random seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Tick length and run bounds.
    #[serde(default)]
    pub time: TimeConfig,

    /// Shared power pool.
    #[serde(default)]
    pub power: PowerConfig,

    /// Starting resource stacks.
    #[serde(default)]
    pub stockpile: StockpileConfig,

    /// Starting workers.
    #[serde(default)]
    pub workforce: WorkforceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `COLONY_LOG_LEVEL` overrides `logging.level` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.logging.apply_env_overrides();
        Ok(config)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Settlement name used in logs.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducible worker rolls.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
        }
    }
}

/// Time configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeConfig {
    /// Simulated seconds per tick.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,

    /// Ticks in one in-game day.
    #[serde(default = "default_ticks_per_day")]
    pub ticks_per_day: u64,

    /// Stop after this many ticks.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            ticks_per_day: default_ticks_per_day(),
            max_ticks: default_max_ticks(),
        }
    }
}

/// Power pool configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PowerConfig {
    /// Maximum stored units.
    #[serde(default = "default_power_capacity")]
    pub capacity: f64,

    /// Units stored at start.
    #[serde(default = "default_power_initial")]
    pub initial_charge: f64,

    /// Units regenerated per simulated second.
    #[serde(default = "default_power_regen")]
    pub regen_per_second: f64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            capacity: default_power_capacity(),
            initial_charge: default_power_initial(),
            regen_per_second: default_power_regen(),
        }
    }
}

/// Stockpile configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StockpileConfig {
    /// Per-resource storage limit. `None` means unlimited.
    #[serde(default)]
    pub limit: Option<u32>,

    /// Starting stacks.
    #[serde(default = "default_initial_stacks")]
    pub initial: BTreeMap<Resource, u32>,
}

impl Default for StockpileConfig {
    fn default() -> Self {
        Self {
            limit: None,
            initial: default_initial_stacks(),
        }
    }
}

/// Workforce configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkforceConfig {
    /// Workers spawned at start.
    #[serde(default = "default_initial_workers")]
    pub initial_workers: u32,

    /// Lowest rolled speed multiplier.
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    /// Highest rolled speed multiplier.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
}

impl Default for WorkforceConfig {
    fn default() -> Self {
        Self {
            initial_workers: default_initial_workers(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format of the log lines.
    #[serde(default)]
    pub format: LogFormat,

    /// Emit a settlement summary every N ticks.
    #[serde(default = "default_summary_interval_ticks")]
    pub summary_interval_ticks: u64,
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LoggingConfig {
    /// Override the level with `COLONY_LOG_LEVEL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(LOG_LEVEL_ENV) {
            self.level = val;
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            summary_interval_ticks: default_summary_interval_ticks(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Hollow Creek".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_seconds() -> f64 {
    0.25
}

const fn default_ticks_per_day() -> u64 {
    240
}

const fn default_max_ticks() -> u64 {
    480
}

const fn default_power_capacity() -> f64 {
    60.0
}

const fn default_power_initial() -> f64 {
    40.0
}

const fn default_power_regen() -> f64 {
    1.5
}

fn default_initial_stacks() -> BTreeMap<Resource, u32> {
    BTreeMap::from([
        (Resource::Wood, 20),
        (Resource::Seed, 6),
        (Resource::RawFood, 12),
    ])
}

const fn default_initial_workers() -> u32 {
    6
}

const fn default_min_speed() -> f64 {
    0.6
}

const fn default_max_speed() -> f64 {
    1.4
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_summary_interval_ticks() -> u64 {
    20
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.time.ticks_per_day, 240);
        assert_eq!(config.workforce.initial_workers, 6);
        assert_eq!(config.stockpile.initial.get(&Resource::Seed), Some(&6));
        assert!(config.stockpile.limit.is_none());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
world:
  name: Test Hamlet
  seed: 7
time:
  tick_seconds: 0.5
  ticks_per_day: 48
  max_ticks: 96
power:
  capacity: 15.0
  initial_charge: 15.0
  regen_per_second: 0.0
stockpile:
  limit: 100
  initial:
    wood: 3
    raw_food: 9
workforce:
  initial_workers: 2
  min_speed: 1.0
  max_speed: 1.0
logging:
  level: debug
  format: json
  summary_interval_ticks: 4
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.world.name, "Test Hamlet");
        assert_eq!(config.time.max_ticks, 96);
        assert!((config.power.capacity - 15.0).abs() < f64::EPSILON);
        assert_eq!(config.stockpile.limit, Some(100));
        assert_eq!(config.stockpile.initial.get(&Resource::RawFood), Some(&9));
        assert_eq!(config.stockpile.initial.get(&Resource::Seed), None);
        assert_eq!(config.workforce.initial_workers, 2);
        assert_eq!(config.logging.summary_interval_ticks, 4);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn log_format_defaults_to_text_and_rejects_unknown() {
        assert_eq!(SimulationConfig::default().logging.format, LogFormat::Text);
        let result = SimulationConfig::parse("logging:\n  format: xml\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = SimulationConfig::parse("power:\n  capacity: 5.0\n").unwrap();
        assert!((config.power.capacity - 5.0).abs() < f64::EPSILON);
        assert!((config.power.initial_charge - 40.0).abs() < f64::EPSILON);
        assert_eq!(config.world, WorldConfig::default());
    }

    #[test]
    fn unknown_resource_is_a_yaml_error() {
        let result = SimulationConfig::parse("stockpile:\n  initial:\n    gold: 3\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = SimulationConfig::from_file(Path::new("/nonexistent/colony-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
