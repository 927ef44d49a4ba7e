// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The set of active monitors.
//!
//! Every process creation and destruction reads the registry, so reads are
//! kept cheap: the member list is an immutable snapshot behind an `RwLock`
//! that readers clone and release before calling any monitor. Writes are
//! rare and are preceded by cancelling every running background evaluation,
//! so a monitor is never attached halfway through an asynchronous update it
//! didn't ask to see.
//!
//! Once any monitor is registered, every process creation and destruction
//! takes the read lock briefly to clone the snapshot `Arc`. With no monitors
//! registered an atomic length check skips the lock entirely.
//!
//! Registration waits for background work to unwind. Don't call it from a
//! process that a background task is evaluating.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::Monitor;
use crate::background::{BackgroundTaskControl, BackgroundTasks};
use crate::observability::messages::monitor::{MonitorDeregistered, MonitorRegistered};
use crate::observability::messages::StructuredLog;
use crate::process::ProcessInfo;

type Members = Arc<Vec<Arc<dyn Monitor>>>;

/// Monitors ordered by address, unique by identity.
pub struct MonitorRegistry {
    members: RwLock<Members>,
    len: AtomicUsize,
    tasks: Arc<dyn BackgroundTaskControl>,
}

static GLOBAL: OnceLock<Arc<MonitorRegistry>> = OnceLock::new();

fn address(monitor: &dyn Monitor) -> usize {
    monitor as *const _ as *const () as usize
}

impl MonitorRegistry {
    /// Registry that quiesces `tasks` before every change.
    pub fn new(tasks: Arc<dyn BackgroundTaskControl>) -> Self {
        Self {
            members: RwLock::new(Arc::new(Vec::new())),
            len: AtomicUsize::new(0),
            tasks,
        }
    }

    /// The process-wide registry, quiescing the global background task pool.
    pub fn global() -> &'static Arc<MonitorRegistry> {
        GLOBAL.get_or_init(|| {
            let tasks: Arc<dyn BackgroundTaskControl> = BackgroundTasks::global().clone();
            Arc::new(MonitorRegistry::new(tasks))
        })
    }

    /// Add `monitor`. Registering a monitor twice has no further effect.
    pub fn register_monitor(&self, monitor: Arc<dyn Monitor>) {
        self.tasks.cancel_all_tasks();

        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        let key = address(&*monitor);
        let already_registered = match members.binary_search_by_key(&key, |m| address(&**m)) {
            Ok(_) => true,
            Err(position) => {
                let mut next = (**members).clone();
                next.insert(position, monitor);
                self.len.store(next.len(), Ordering::Release);
                *members = Arc::new(next);
                false
            }
        };

        MonitorRegistered {
            monitor_count: members.len(),
            already_registered,
        }
        .log();
    }

    /// Remove `monitor`. Removing one that isn't registered is a no-op.
    pub fn deregister_monitor(&self, monitor: &dyn Monitor) {
        self.tasks.cancel_all_tasks();

        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        let key = address(monitor);
        let was_registered = match members.binary_search_by_key(&key, |m| address(&**m)) {
            Ok(position) => {
                let mut next = (**members).clone();
                next.remove(position);
                self.len.store(next.len(), Ordering::Release);
                *members = Arc::new(next);
                true
            }
            Err(_) => false,
        };
        let monitor_count = members.len();
        drop(members);

        if was_registered {
            monitor.deregistered();
        }

        MonitorDeregistered {
            monitor_count,
            was_registered,
        }
        .log();
    }

    /// Membership query. Doesn't quiesce, so the answer may be stale if
    /// another thread is registering at the same time.
    pub fn monitor_registered(&self, monitor: &dyn Monitor) -> bool {
        let key = address(monitor);
        self.snapshot()
            .is_some_and(|members| members.binary_search_by_key(&key, |m| address(&**m)).is_ok())
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Option<Members> {
        if self.is_empty() {
            return None;
        }
        Some(
            self.members
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        )
    }

    pub(crate) fn notify_started(&self, process: &ProcessInfo) {
        if let Some(members) = self.snapshot() {
            for monitor in members.iter() {
                monitor.process_started(process);
            }
        }
    }

    pub(crate) fn notify_finished(&self, process: &ProcessInfo) {
        if let Some(members) = self.snapshot() {
            for monitor in members.iter() {
                monitor.process_finished(process);
            }
        }
    }
}

impl std::fmt::Debug for MonitorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorRegistry")
            .field("monitor_count", &self.len())
            .finish()
    }
}
