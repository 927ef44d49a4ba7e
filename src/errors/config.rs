// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for loading and validating monitoring configuration.

use thiserror::Error;

/// A single configuration validation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// `tracing.filter` was present but blank
    EmptyTracingFilter,
    /// A monitor's process kind filter contains a blank entry
    BlankProcessKind {
        /// The monitor section name
        monitor: String,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyTracingFilter => {
                write!(f, "tracing.filter must not be empty")
            }
            ValidationError::BlankProcessKind { monitor } => {
                write!(f, "Monitor '{}' lists a blank process kind", monitor)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors that can occur while loading a config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
