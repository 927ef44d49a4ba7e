// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::{Monitor, MonitorRegistry};

/// Keeps monitors registered for as long as the scope lives.
///
/// Only monitors that weren't already registered are registered by the scope,
/// and only those are deregistered when it drops, so scopes nest.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use the_plugwood::background::BackgroundTasks;
/// use the_plugwood::monitor::{MonitorRegistry, MonitorScope, PerformanceMonitor};
///
/// let registry = Arc::new(MonitorRegistry::new(BackgroundTasks::new()));
/// let monitor = Arc::new(PerformanceMonitor::new());
/// {
///     let _scope = MonitorScope::new(registry.clone(), monitor.clone());
///     assert!(registry.monitor_registered(&*monitor));
/// }
/// assert!(!registry.monitor_registered(&*monitor));
/// ```
#[must_use = "monitors are deregistered as soon as the scope is dropped"]
pub struct MonitorScope {
    registry: Arc<MonitorRegistry>,
    registered: Vec<Arc<dyn Monitor>>,
}

impl MonitorScope {
    pub fn new(registry: Arc<MonitorRegistry>, monitor: Arc<dyn Monitor>) -> Self {
        Self::with_monitors(registry, vec![monitor])
    }

    pub fn with_monitors(registry: Arc<MonitorRegistry>, monitors: Vec<Arc<dyn Monitor>>) -> Self {
        let mut registered = Vec::with_capacity(monitors.len());
        for monitor in monitors {
            if !registry.monitor_registered(&*monitor) {
                registry.register_monitor(monitor.clone());
                registered.push(monitor);
            }
        }
        Self {
            registry,
            registered,
        }
    }
}

impl Drop for MonitorScope {
    fn drop(&mut self) {
        for monitor in self.registered.drain(..) {
            self.registry.deregister_monitor(&*monitor);
        }
    }
}
