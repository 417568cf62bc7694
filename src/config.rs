//! Configuration for the analysis engine
//!
//! Supports loading configuration from:
//! - Default values (the thresholds the detectors were tuned with)
//! - Config file (planalyze.toml)
//! - Environment variables (PLANALYZE_*)
//!
//! ## Example config file (planalyze.toml):
//! ```toml
//! [thresholds]
//! bottleneck_factor = 1.5
//! near_critical_slack = 2.0
//! overload_task_count = 3
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main configuration for the analysis engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Detector and scheduling thresholds
    #[serde(default)]
    pub thresholds: Thresholds,
}

/// Tunable thresholds shared by the scheduling engine and risk detectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// A task is a bottleneck when duration > factor × mean duration.
    #[serde(default = "default_bottleneck_factor")]
    pub bottleneck_factor: f64,

    /// Non-critical tasks with 0 < slack ≤ this are near-critical.
    #[serde(default = "default_near_critical_slack")]
    pub near_critical_slack: f64,

    /// A resource on more than this many tasks is overloaded.
    #[serde(default = "default_overload_task_count")]
    pub overload_task_count: usize,

    /// Overloads above this task count get a per-resource recommendation.
    #[serde(default = "default_severe_overload_count")]
    pub severe_overload_count: usize,

    /// Dependency chains longer than this are flagged.
    #[serde(default = "default_long_chain_length")]
    pub long_chain_length: usize,

    /// Complex tasks shorter than this are timeline risks.
    #[serde(default = "default_short_duration")]
    pub short_duration: f64,

    /// "Complex" means more than this many dependencies or resources.
    #[serde(default = "default_complexity_threshold")]
    pub complexity_threshold: usize,
}

fn default_bottleneck_factor() -> f64 {
    1.5
}

fn default_near_critical_slack() -> f64 {
    2.0
}

fn default_overload_task_count() -> usize {
    3
}

fn default_severe_overload_count() -> usize {
    5
}

fn default_long_chain_length() -> usize {
    5
}

fn default_short_duration() -> f64 {
    3.0
}

fn default_complexity_threshold() -> usize {
    2
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            bottleneck_factor: default_bottleneck_factor(),
            near_critical_slack: default_near_critical_slack(),
            overload_task_count: default_overload_task_count(),
            severe_overload_count: default_severe_overload_count(),
            long_chain_length: default_long_chain_length(),
            short_duration: default_short_duration(),
            complexity_threshold: default_complexity_threshold(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["planalyze.toml", ".planalyze.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("PLANALYZE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_thresholds_match_detector_constants() {
        let t = Thresholds::default();
        assert_eq!(t.bottleneck_factor, 1.5);
        assert_eq!(t.near_critical_slack, 2.0);
        assert_eq!(t.overload_task_count, 3);
        assert_eq!(t.severe_overload_count, 5);
        assert_eq!(t.long_chain_length, 5);
        assert_eq!(t.short_duration, 3.0);
        assert_eq!(t.complexity_threshold, 2);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[thresholds]\nbottleneck_factor = 2.0\nlong_chain_length = 8").unwrap();

        let config = AnalysisConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.thresholds.bottleneck_factor, 2.0);
        assert_eq!(config.thresholds.long_chain_length, 8);
        // untouched keys keep their defaults
        assert_eq!(config.thresholds.overload_task_count, 3);
    }
}
