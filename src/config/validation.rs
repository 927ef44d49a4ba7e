// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::PERFORMANCE_MONITOR;
use crate::config::Config;
use crate::errors::ValidationError;

/// Check a loaded config for values that parse but can't be used.
///
/// All problems are collected so they can be reported together.
///
/// # Example
/// ```
/// use the_plugwood::config::{validate_config, Config};
///
/// let config = Config::default();
/// assert!(validate_config(&config).is_ok());
/// ```
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(filter) = &config.tracing.filter {
        if filter.trim().is_empty() {
            errors.push(ValidationError::EmptyTracingFilter);
        }
    }

    if let Some(kinds) = &config.monitors.performance.kinds {
        if kinds.iter().any(|kind| kind.trim().is_empty()) {
            errors.push(ValidationError::BlankProcessKind {
                monitor: PERFORMANCE_MONITOR.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
