// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observers of process activity.
//!
//! A [`Monitor`] registered with a [`MonitorRegistry`] is told about every
//! process created under that registry, on whichever thread the process runs.
//! Callbacks may inspect the live process tree through
//! [`Process::current`](crate::process::Process::current) and
//! [`ProcessInfo::parent`].
//!
//! Monitors must not rely on being called in any particular order relative to
//! each other.

pub mod logging;
pub mod performance;
pub mod registry;
pub mod scope;

pub use logging::LoggingMonitor;
pub use performance::{PerformanceMonitor, Statistics};
pub use registry::MonitorRegistry;
pub use scope::MonitorScope;

use crate::process::ProcessInfo;

/// Capability notified of process start and finish.
pub trait Monitor: Send + Sync {
    fn process_started(&self, process: &ProcessInfo);
    fn process_finished(&self, process: &ProcessInfo);

    /// Called after the monitor has been removed from a registry. Processes
    /// still running at that point finish without telling this monitor, so
    /// any per-process state kept for them should be dropped here.
    fn deregistered(&self) {}
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::Monitor;
    use crate::process::{ProcessId, ProcessInfo};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Event {
        Started(ProcessId),
        Finished(ProcessId),
    }

    /// Records every notification it receives.
    #[derive(Default)]
    pub struct RecordingMonitor {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingMonitor {
        pub fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        pub fn started_count(&self) -> usize {
            self.events()
                .iter()
                .filter(|e| matches!(e, Event::Started(_)))
                .count()
        }
    }

    impl Monitor for RecordingMonitor {
        fn process_started(&self, process: &ProcessInfo) {
            self.events.lock().unwrap().push(Event::Started(process.id()));
        }

        fn process_finished(&self, process: &ProcessInfo) {
            self.events.lock().unwrap().push(Event::Finished(process.id()));
        }
    }
}
