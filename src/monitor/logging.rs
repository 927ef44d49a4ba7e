// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::Monitor;
use crate::observability::messages::process::{ProcessFinished, ProcessStarted};
use crate::observability::messages::StructuredLog;
use crate::process::ProcessInfo;

/// Logs every process start and finish through `tracing` at debug level.
///
/// With `ancestry` enabled the start event also carries the chain of plugs
/// that led to the process, outermost first, e.g. `root.out > mid.out > leaf.out`.
#[derive(Debug, Default)]
pub struct LoggingMonitor {
    ancestry: bool,
}

impl LoggingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ancestry(ancestry: bool) -> Self {
        Self { ancestry }
    }
}

/// Plug names from the root process down to `process`.
pub fn ancestry(process: &ProcessInfo) -> String {
    let mut names: Vec<&str> = process.ancestors().map(|p| p.plug().name()).collect();
    names.reverse();
    names.push(process.plug().name());
    names.join(" > ")
}

impl Monitor for LoggingMonitor {
    fn process_started(&self, process: &ProcessInfo) {
        let chain = self.ancestry.then(|| ancestry(process));
        ProcessStarted {
            id: process.id().0,
            kind: process.kind(),
            plug: process.plug().name(),
            depth: process.depth(),
            ancestry: chain.as_deref(),
        }
        .log();
    }

    fn process_finished(&self, process: &ProcessInfo) {
        ProcessFinished {
            id: process.id().0,
            kind: process.kind(),
            plug: process.plug().name(),
        }
        .log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::BackgroundTasks;
    use crate::graph::{Direction, MemoryNode, Plug};
    use crate::monitor::MonitorRegistry;
    use crate::process::{Process, ThreadState};
    use std::sync::Arc;

    #[test]
    fn test_ancestry_lists_plugs_outermost_first() {
        let registry = Arc::new(MonitorRegistry::new(BackgroundTasks::new()));
        registry.register_monitor(Arc::new(LoggingMonitor::with_ancestry(true)));
        let _scope = ThreadState::default().with_monitors(registry).enter();

        let node = MemoryNode::new("n");
        let root: Arc<dyn Plug> = node.add_plug("root", Direction::Out);
        let leaf: Arc<dyn Plug> = node.add_plug("leaf", Direction::Out);

        let _root = Process::new("compute", root, None).unwrap();
        let leaf = Process::new("compute", leaf, None).unwrap();

        assert_eq!(ancestry(&leaf), "n.root > n.leaf");
    }
}
