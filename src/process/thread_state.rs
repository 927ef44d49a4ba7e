// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-thread process stack and the explicit hand-off between threads.
//!
//! Every thread has a current [`ThreadState`]: the innermost live process,
//! the evaluation context and the monitor registry new processes report to.
//! Nothing is inherited implicitly when work moves to another thread. The
//! dispatching code captures its state and enters it on the worker:
//!
//! ```
//! use the_plugwood::process::ThreadState;
//!
//! let state = ThreadState::capture();
//! std::thread::spawn(move || {
//!     let _scope = state.enter();
//!     // Processes created here have the dispatching process as parent.
//! })
//! .join()
//! .unwrap();
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{error_source, ProcessInfo};
use crate::context::Context;
use crate::graph::Plug;
use crate::monitor::MonitorRegistry;

thread_local! {
    static LOCAL: RefCell<LocalState> = RefCell::new(LocalState::default());
}

#[derive(Default)]
struct LocalState {
    state: ThreadState,
    /// Processes created on this thread inside the current scope.
    depth: usize,
}

/// The ancestry token carried across thread boundaries.
#[derive(Clone)]
pub struct ThreadState {
    process: Option<Arc<ProcessInfo>>,
    context: Arc<Context>,
    monitors: Arc<MonitorRegistry>,
}

impl Default for ThreadState {
    fn default() -> Self {
        Self {
            process: None,
            context: Arc::new(Context::default()),
            monitors: MonitorRegistry::global().clone(),
        }
    }
}

impl std::fmt::Debug for ThreadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadState")
            .field("process", &self.process.as_ref().map(|p| p.id()))
            .field("context", &self.context)
            .field("monitor_count", &self.monitors.len())
            .finish()
    }
}

impl ThreadState {
    /// Copy of the calling thread's current state.
    pub fn capture() -> Self {
        LOCAL.with(|local| local.borrow().state.clone())
    }

    pub fn process(&self) -> Option<&Arc<ProcessInfo>> {
        self.process.as_ref()
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn monitors(&self) -> &Arc<MonitorRegistry> {
        &self.monitors
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Arc::new(context);
        self
    }

    /// Report processes created under this state to `monitors` instead of
    /// the global registry.
    pub fn with_monitors(mut self, monitors: Arc<MonitorRegistry>) -> Self {
        self.monitors = monitors;
        self
    }

    /// Install this state on the calling thread until the scope is dropped.
    ///
    /// The scope also starts a fresh error tree: failures inside it are
    /// attributed independently of whatever was unwinding on this thread
    /// before, and the previous origin is restored on exit.
    pub fn enter(self) -> ThreadStateScope {
        let previous = LOCAL.with(|local| {
            std::mem::replace(
                &mut *local.borrow_mut(),
                LocalState {
                    state: self,
                    depth: 0,
                },
            )
        });
        let previous_source = error_source::replace(None);
        ThreadStateScope {
            previous: Some((previous, previous_source)),
            _not_send: PhantomData,
        }
    }
}

/// Restores the previous thread state when dropped.
#[must_use = "the state is only installed while the scope is alive"]
pub struct ThreadStateScope {
    previous: Option<(LocalState, Option<Arc<dyn Plug>>)>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ThreadStateScope {
    fn drop(&mut self) {
        if let Some((previous, previous_source)) = self.previous.take() {
            LOCAL.with(|local| *local.borrow_mut() = previous);
            error_source::replace(previous_source);
        }
    }
}

pub(crate) fn current_process() -> Option<Arc<ProcessInfo>> {
    LOCAL.with(|local| local.borrow().state.process.clone())
}

/// Parent, context and registry for a process about to be created.
pub(crate) fn creation_state() -> (Option<Arc<ProcessInfo>>, Arc<Context>, Arc<MonitorRegistry>) {
    LOCAL.with(|local| {
        let local = local.borrow();
        (
            local.state.process.clone(),
            local.state.context.clone(),
            local.state.monitors.clone(),
        )
    })
}

/// Make `process` current. Returns true if it is the outermost process of
/// this thread's tree.
pub(crate) fn link(process: &Arc<ProcessInfo>) -> bool {
    LOCAL.with(|local| {
        let mut local = local.borrow_mut();
        local.state.process = Some(process.clone());
        local.depth += 1;
        local.depth == 1
    })
}

/// Restore the parent of `process` as current.
pub(crate) fn unlink(process: &ProcessInfo) {
    LOCAL.with(|local| {
        let mut local = local.borrow_mut();
        debug_assert!(
            local
                .state
                .process
                .as_ref()
                .is_some_and(|current| std::ptr::eq(Arc::as_ptr(current), process)),
            "processes must be dropped in reverse order of creation"
        );
        local.state.process = process.parent().cloned();
        local.depth = local.depth.saturating_sub(1);
    })
}
