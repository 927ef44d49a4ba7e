// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for monitor registration.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A monitor was added to a registry.
///
/// # Log Level
/// `debug!` - Registration happens at setup time and in tests
pub struct MonitorRegistered {
    pub monitor_count: usize,
    pub already_registered: bool,
}

impl Display for MonitorRegistered {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.already_registered {
            write!(
                f,
                "Monitor already registered ({} active)",
                self.monitor_count
            )
        } else {
            write!(f, "Monitor registered ({} active)", self.monitor_count)
        }
    }
}

impl StructuredLog for MonitorRegistered {
    fn log(&self) {
        tracing::debug!(
            monitor_count = self.monitor_count,
            already_registered = self.already_registered,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "monitor_registered",
            span_name = name,
            monitor_count = self.monitor_count,
        )
    }
}

/// A monitor was removed from a registry.
///
/// # Log Level
/// `debug!` - Registration happens at setup time and in tests
pub struct MonitorDeregistered {
    pub monitor_count: usize,
    pub was_registered: bool,
}

impl Display for MonitorDeregistered {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.was_registered {
            write!(f, "Monitor deregistered ({} active)", self.monitor_count)
        } else {
            write!(
                f,
                "Monitor was not registered ({} active)",
                self.monitor_count
            )
        }
    }
}

impl StructuredLog for MonitorDeregistered {
    fn log(&self) {
        tracing::debug!(
            monitor_count = self.monitor_count,
            was_registered = self.was_registered,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "monitor_deregistered",
            span_name = name,
            monitor_count = self.monitor_count,
        )
    }
}
