// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Monitoring configuration for an evaluation session.
///
/// Every section is optional; an empty document gives a runtime with no
/// monitors and the default tracing filter.
///
/// # Example
/// ```yaml
/// monitors:
///   logging:
///     enabled: true
///     ancestry: true
///   performance:
///     enabled: true
///     kinds: [compute, hash]
/// tracing:
///   filter: "the_plugwood=debug"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitors: MonitorsConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonitorsConfig {
    #[serde(default)]
    pub logging: LoggingMonitorConfig,
    #[serde(default)]
    pub performance: PerformanceMonitorConfig,
}

/// Settings for [`crate::monitor::LoggingMonitor`].
#[derive(Debug, Default, Deserialize)]
pub struct LoggingMonitorConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Include the ancestor chain in start events
    #[serde(default)]
    pub ancestry: bool,
}

/// Settings for [`crate::monitor::PerformanceMonitor`].
#[derive(Debug, Default, Deserialize)]
pub struct PerformanceMonitorConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Process kinds to record. All kinds when absent.
    #[serde(default)]
    pub kinds: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TracingConfig {
    /// `EnvFilter` directive, e.g. `the_plugwood=debug`
    #[serde(default)]
    pub filter: Option<String>,
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load a config from a YAML file and reject it if validation fails.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Validation)?;
    Ok(cfg)
}
