// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-plug process counts and timings.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::Monitor;
use crate::process::{ProcessId, ProcessInfo};

/// Accumulated figures for one (plug, kind) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub count: u64,
    pub total_nanos: u64,
}

impl Statistics {
    pub fn total_duration(&self) -> Duration {
        Duration::from_nanos(self.total_nanos)
    }

    fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total_nanos = self
            .total_nanos
            .saturating_add(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX));
    }
}

/// Plug name -> process kind -> statistics.
pub type Report = BTreeMap<String, BTreeMap<String, Statistics>>;

/// Counts processes and their wall-clock time, keyed by plug and kind.
///
/// Timings are inclusive: a process's duration includes its children.
#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    kinds: Option<HashSet<String>>,
    running: Mutex<HashMap<ProcessId, Instant>>,
    report: Mutex<Report>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only measure processes of the given kinds. An empty list measures
    /// everything.
    pub fn with_kinds<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kinds: HashSet<String> = kinds.into_iter().map(Into::into).collect();
        Self {
            kinds: (!kinds.is_empty()).then_some(kinds),
            ..Self::default()
        }
    }

    fn measures(&self, kind: &str) -> bool {
        self.kinds.as_ref().map_or(true, |kinds| kinds.contains(kind))
    }

    pub fn report(&self) -> Report {
        self.report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Statistics for one plug, by kind.
    pub fn plug_statistics(&self, plug: &str) -> BTreeMap<String, Statistics> {
        self.report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(plug)
            .cloned()
            .unwrap_or_default()
    }

    /// Totals across all plugs, by kind.
    pub fn combined_statistics(&self) -> BTreeMap<String, Statistics> {
        let mut combined: BTreeMap<String, Statistics> = BTreeMap::new();
        for by_kind in self.report().values() {
            for (kind, stats) in by_kind {
                let total = combined.entry(kind.clone()).or_default();
                total.count += stats.count;
                total.total_nanos = total.total_nanos.saturating_add(stats.total_nanos);
            }
        }
        combined
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.report())
    }

    pub fn clear(&self) {
        self.report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Monitor for PerformanceMonitor {
    fn process_started(&self, process: &ProcessInfo) {
        if !self.measures(process.kind()) {
            return;
        }
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(process.id(), Instant::now());
    }

    fn process_finished(&self, process: &ProcessInfo) {
        // Processes that started before registration have no start time.
        let Some(started) = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&process.id())
        else {
            return;
        };

        self.report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(process.plug().name().to_string())
            .or_default()
            .entry(process.kind().to_string())
            .or_default()
            .record(started.elapsed());
    }

    fn deregistered(&self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::BackgroundTasks;
    use crate::graph::{Direction, MemoryPlug, Plug};
    use crate::monitor::MonitorRegistry;
    use crate::process::{Process, ThreadState};
    use std::sync::Arc;

    fn run_with(monitor: Arc<PerformanceMonitor>, f: impl FnOnce()) {
        let registry = Arc::new(MonitorRegistry::new(BackgroundTasks::new()));
        registry.register_monitor(monitor);
        let _scope = ThreadState::default().with_monitors(registry).enter();
        f();
    }

    #[test]
    fn test_counts_per_plug_and_kind() {
        let monitor = Arc::new(PerformanceMonitor::new());
        let a: Arc<dyn Plug> = MemoryPlug::new("a", Direction::Out);
        let b: Arc<dyn Plug> = MemoryPlug::new("b", Direction::Out);

        run_with(monitor.clone(), || {
            for _ in 0..3 {
                drop(Process::new("compute", a.clone(), None).unwrap());
            }
            drop(Process::new("hash", a.clone(), None).unwrap());
            drop(Process::new("compute", b.clone(), None).unwrap());
        });

        let a_stats = monitor.plug_statistics("a");
        assert_eq!(a_stats["compute"].count, 3);
        assert_eq!(a_stats["hash"].count, 1);
        assert_eq!(monitor.plug_statistics("b")["compute"].count, 1);
        assert_eq!(monitor.combined_statistics()["compute"].count, 4);
        assert!(monitor.plug_statistics("missing").is_empty());
    }

    #[test]
    fn test_kind_filter() {
        let monitor = Arc::new(PerformanceMonitor::with_kinds(["hash"]));
        let a: Arc<dyn Plug> = MemoryPlug::new("a", Direction::Out);

        run_with(monitor.clone(), || {
            drop(Process::new("compute", a.clone(), None).unwrap());
            drop(Process::new("hash", a.clone(), None).unwrap());
        });

        let stats = monitor.plug_statistics("a");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats["hash"].count, 1);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let monitor = Arc::new(PerformanceMonitor::new());
        let a: Arc<dyn Plug> = MemoryPlug::new("a", Direction::Out);
        run_with(monitor.clone(), || {
            drop(Process::new("compute", a.clone(), None).unwrap());
        });

        let json: serde_json::Value = serde_json::from_str(&monitor.to_json().unwrap()).unwrap();
        assert_eq!(json["a"]["compute"]["count"], 1);

        monitor.clear();
        assert!(monitor.report().is_empty());
    }

    #[test]
    fn test_deregistering_mid_process_drops_start_times() {
        let monitor = Arc::new(PerformanceMonitor::new());
        let registry = Arc::new(MonitorRegistry::new(BackgroundTasks::new()));
        let _scope = ThreadState::default().with_monitors(registry.clone()).enter();
        let a: Arc<dyn Plug> = MemoryPlug::new("a", Direction::Out);

        for _ in 0..100 {
            registry.register_monitor(monitor.clone());
            let process = Process::new("compute", a.clone(), None).unwrap();
            registry.deregister_monitor(&*monitor);
            drop(process);
        }

        assert!(monitor.running.lock().unwrap().is_empty());
        assert!(monitor.report().is_empty());
    }

    #[test]
    fn test_finish_after_reregistration_is_ignored() {
        let monitor = Arc::new(PerformanceMonitor::new());
        let registry = Arc::new(MonitorRegistry::new(BackgroundTasks::new()));
        let _scope = ThreadState::default().with_monitors(registry.clone()).enter();
        let a: Arc<dyn Plug> = MemoryPlug::new("a", Direction::Out);

        registry.register_monitor(monitor.clone());
        let process = Process::new("compute", a.clone(), None).unwrap();
        registry.deregister_monitor(&*monitor);
        registry.register_monitor(monitor.clone());
        drop(process);

        assert!(monitor.plug_statistics("a").is_empty());
        assert!(monitor.running.lock().unwrap().is_empty());
    }
}
