// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::background::BackgroundTasks;
use crate::config::Config;
use crate::monitor::{LoggingMonitor, MonitorRegistry, PerformanceMonitor};
use crate::process::{ThreadState, ThreadStateScope};

/// Monitoring runtime builder - wires a registry, a task pool and the
/// configured monitors together.
///
/// The registry it builds is isolated from [`MonitorRegistry::global`], so
/// processes only report to it on threads that have entered the runtime.
///
/// # Examples
///
/// ```
/// use the_plugwood::config::{Config, RuntimeBuilder};
/// use the_plugwood::graph::{Direction, MemoryNode};
/// use the_plugwood::process::Process;
///
/// let mut config = Config::default();
/// config.monitors.performance.enabled = true;
///
/// let runtime = RuntimeBuilder::from_config(&config);
/// let node = MemoryNode::new("blur");
/// let out = node.add_plug("out", Direction::Out);
///
/// {
///     let _scope = runtime.enter();
///     Process::run("compute", out, None, |_| Ok(())).unwrap();
/// }
///
/// let stats = runtime.performance().unwrap().plug_statistics("blur.out");
/// assert_eq!(stats["compute"].count, 1);
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build a runtime with the monitors enabled in `cfg` registered.
    pub fn from_config(cfg: &Config) -> Runtime {
        let tasks = BackgroundTasks::new();
        let registry = Arc::new(MonitorRegistry::new(tasks.clone()));

        let logging = cfg.monitors.logging.enabled.then(|| {
            Arc::new(LoggingMonitor::with_ancestry(
                cfg.monitors.logging.ancestry,
            ))
        });
        let performance = cfg.monitors.performance.enabled.then(|| {
            Arc::new(match &cfg.monitors.performance.kinds {
                Some(kinds) => PerformanceMonitor::with_kinds(kinds.iter().cloned()),
                None => PerformanceMonitor::new(),
            })
        });

        if let Some(monitor) = &logging {
            registry.register_monitor(monitor.clone());
        }
        if let Some(monitor) = &performance {
            registry.register_monitor(monitor.clone());
        }

        Runtime {
            registry,
            tasks,
            logging,
            performance,
        }
    }
}

/// A registry with its task pool and configured monitors.
pub struct Runtime {
    registry: Arc<MonitorRegistry>,
    tasks: Arc<BackgroundTasks>,
    logging: Option<Arc<LoggingMonitor>>,
    performance: Option<Arc<PerformanceMonitor>>,
}

impl Runtime {
    pub fn registry(&self) -> &Arc<MonitorRegistry> {
        &self.registry
    }

    /// Pool the registry quiesces on registration changes.
    pub fn tasks(&self) -> &Arc<BackgroundTasks> {
        &self.tasks
    }

    pub fn logging(&self) -> Option<&Arc<LoggingMonitor>> {
        self.logging.as_ref()
    }

    pub fn performance(&self) -> Option<&Arc<PerformanceMonitor>> {
        self.performance.as_ref()
    }

    /// The calling thread's state, reporting to this runtime's registry.
    pub fn thread_state(&self) -> ThreadState {
        ThreadState::capture().with_monitors(self.registry.clone())
    }

    /// Report processes on this thread to the runtime's registry until the
    /// returned scope is dropped.
    pub fn enter(&self) -> ThreadStateScope {
        self.thread_state().enter()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("registry", &self.registry)
            .field("logging", &self.logging.is_some())
            .field("performance", &self.performance.is_some())
            .finish()
    }
}
