// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tracked evaluation steps.
//!
//! A [`Process`] is created immediately before a plug is computed and dropped
//! immediately after. While alive it is the calling thread's current process,
//! so nested computations can walk their ancestry, monitors are told about
//! its start and finish, and failures passing through it are reported to the
//! nodes downstream.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use the_plugwood::errors::ProcessError;
//! use the_plugwood::graph::{Direction, MemoryNode, Plug};
//! use the_plugwood::process::Process;
//!
//! let node = MemoryNode::new("divide");
//! let out: Arc<dyn Plug> = node.add_plug("out", Direction::Out);
//!
//! let result: Result<i32, ProcessError> = Process::run("compute", out.clone(), None, |process| {
//!     assert_eq!(process.kind(), "compute");
//!     Err(ProcessError::computation("division by zero"))
//! });
//!
//! assert!(result.is_err());
//! assert_eq!(node.errors()[0].message, "division by zero");
//! ```

pub mod cancellation;
pub mod error_source;
pub mod thread_state;

use std::any::Any;
use std::marker::PhantomData;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::context::Context;
use crate::errors::ProcessError;
use crate::graph::Plug;
use crate::monitor::MonitorRegistry;
use crate::observability::messages::process::{ProcessCancelled, ProcessErrorEmitted};
use crate::observability::messages::StructuredLog;

pub use error_source::{emit_error, error_source};
pub use thread_state::{ThreadState, ThreadStateScope};

/// Message reported for panics whose payload isn't a string.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

static NEXT_PROCESS_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique process identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u64);

impl ProcessId {
    fn next() -> Self {
        Self(NEXT_PROCESS_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What monitors and descendants see of a process.
pub struct ProcessInfo {
    id: ProcessId,
    kind: &'static str,
    plug: Arc<dyn Plug>,
    downstream: Arc<dyn Plug>,
    parent: Option<Arc<ProcessInfo>>,
    context: Arc<Context>,
}

impl ProcessInfo {
    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The plug being computed.
    pub fn plug(&self) -> &Arc<dyn Plug> {
        &self.plug
    }

    /// The plug that requested the computation. Same as `plug` unless a
    /// distinct consumer triggered it.
    pub fn downstream(&self) -> &Arc<dyn Plug> {
        &self.downstream
    }

    pub fn parent(&self) -> Option<&Arc<ProcessInfo>> {
        self.parent.as_ref()
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Iterate over the ancestors, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Arc<ProcessInfo>> {
        std::iter::successors(self.parent.as_ref(), |p| p.parent.as_ref())
    }

    /// Number of ancestors.
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Report `message` to the nodes between `downstream` and `plug`, naming
    /// this thread's recorded error source as the origin.
    pub fn emit_error(&self, message: &str) -> usize {
        let source = error_source::error_source();
        let notified = emit_error(&self.plug, &self.downstream, source.as_ref(), message);
        ProcessErrorEmitted {
            kind: self.kind,
            plug: self.plug.name(),
            source: source.as_ref().map(|s| s.name()),
            message,
            notified,
        }
        .log();
        notified
    }
}

impl std::fmt::Debug for ProcessInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessInfo")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("plug", &self.plug.name())
            .field("downstream", &self.downstream.name())
            .field("parent", &self.parent.as_ref().map(|p| p.id))
            .finish()
    }
}

/// Scope guard for one evaluation step.
///
/// Not `Send`: a process is dropped on the thread that created it, after all
/// of its children.
pub struct Process {
    info: Arc<ProcessInfo>,
    monitors: Arc<MonitorRegistry>,
    thread_root: bool,
    announced: bool,
    _not_send: PhantomData<*const ()>,
}

impl Process {
    /// Start tracking a computation of `plug`.
    ///
    /// Fails with [`ProcessError::Cancelled`] before anything is linked or
    /// announced if the current context has been cancelled. `downstream`
    /// defaults to `plug`.
    pub fn new(
        kind: &'static str,
        plug: Arc<dyn Plug>,
        downstream: Option<Arc<dyn Plug>>,
    ) -> Result<Self, ProcessError> {
        debug_assert!(!kind.is_empty(), "process kind must not be empty");

        let (parent, context, monitors) = thread_state::creation_state();
        if let Err(error) = cancellation::check(context.canceller()) {
            ProcessCancelled {
                kind,
                plug: plug.name(),
            }
            .log();
            return Err(error);
        }

        let info = Arc::new(ProcessInfo {
            id: ProcessId::next(),
            kind,
            downstream: downstream.unwrap_or_else(|| plug.clone()),
            plug,
            parent,
            context,
        });
        let thread_root = thread_state::link(&info);

        // If a monitor panics from here on, dropping the guard still unlinks.
        let mut process = Process {
            info,
            monitors,
            thread_root,
            announced: false,
            _not_send: PhantomData,
        };
        process.monitors.notify_started(&process.info);
        process.announced = true;
        Ok(process)
    }

    /// Run `body` inside a new process.
    ///
    /// Errors returned by `body` go through [`Process::handle_error`]; panics
    /// go through [`Process::handle_panic`] and then keep unwinding once the
    /// process has been dropped.
    pub fn run<T, F>(
        kind: &'static str,
        plug: Arc<dyn Plug>,
        downstream: Option<Arc<dyn Plug>>,
        body: F,
    ) -> Result<T, ProcessError>
    where
        F: FnOnce(&Process) -> Result<T, ProcessError>,
    {
        let process = Process::new(kind, plug, downstream)?;
        match panic::catch_unwind(AssertUnwindSafe(|| body(&process))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(process.handle_error(error)),
            Err(payload) => {
                process.handle_panic(payload.as_ref());
                drop(process);
                panic::resume_unwind(payload)
            }
        }
    }

    /// The calling thread's current process.
    pub fn current() -> Option<Arc<ProcessInfo>> {
        thread_state::current_process()
    }

    pub fn info(&self) -> &Arc<ProcessInfo> {
        &self.info
    }

    /// Bookkeeping for a failure leaving this process.
    ///
    /// Cancellation passes through untouched. Any other failure records this
    /// process's plug as the origin if nothing on this thread has claimed it
    /// yet, is reported downstream, and is handed back unchanged for the
    /// caller to propagate.
    pub fn handle_error(&self, error: ProcessError) -> ProcessError {
        match &error {
            ProcessError::Cancelled => {}
            ProcessError::Computation(message) => self.report_failure(message),
        }
        error
    }

    /// Same as [`Process::handle_error`] for a panic payload.
    pub fn handle_panic(&self, payload: &(dyn Any + Send)) {
        self.report_failure(&panic_message(payload));
    }

    fn report_failure(&self, message: &str) {
        error_source::attribute(&self.info.plug);
        self.info.emit_error(message);
    }
}

impl Deref for Process {
    type Target = ProcessInfo;

    fn deref(&self) -> &ProcessInfo {
        &self.info
    }
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Process").field(&self.info).finish()
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        // Runs even if a monitor panics in `process_finished`.
        let _unlink = Unlink {
            info: &self.info,
            thread_root: self.thread_root,
        };
        if self.announced {
            self.monitors.notify_finished(&self.info);
        }
    }
}

/// Restores the parent as current when dropped.
struct Unlink<'a> {
    info: &'a ProcessInfo,
    thread_root: bool,
}

impl Drop for Unlink<'_> {
    fn drop(&mut self) {
        if self.thread_root {
            error_source::clear();
        }
        thread_state::unlink(self.info);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        UNKNOWN_ERROR_MESSAGE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::BackgroundTasks;
    use crate::graph::{same_plug, Direction, MemoryNode, MemoryPlug};
    use crate::monitor::test_support::{Event, RecordingMonitor};
    use crate::monitor::Monitor;
    use tokio_util::sync::CancellationToken;

    fn isolated() -> (Arc<MonitorRegistry>, Arc<RecordingMonitor>, ThreadStateScope) {
        let registry = Arc::new(MonitorRegistry::new(BackgroundTasks::new()));
        let monitor = Arc::new(RecordingMonitor::default());
        registry.register_monitor(monitor.clone());
        let scope = ThreadState::default().with_monitors(registry.clone()).enter();
        (registry, monitor, scope)
    }

    fn plug(name: &str) -> Arc<dyn Plug> {
        MemoryPlug::new(name, Direction::Out)
    }

    #[test]
    fn test_current_tracks_construction_and_drop() {
        let (_registry, _monitor, _scope) = isolated();
        assert!(Process::current().is_none());

        let outer = Process::new("compute", plug("a"), None).unwrap();
        let current = Process::current().expect("outer should be current");
        assert_eq!(current.id(), outer.id());
        assert!(outer.parent().is_none());

        {
            let inner = Process::new("compute", plug("b"), None).unwrap();
            assert_eq!(Process::current().map(|p| p.id()), Some(inner.id()));
            assert_eq!(inner.parent().map(|p| p.id()), Some(outer.id()));
            assert_eq!(inner.depth(), 1);
        }

        assert_eq!(Process::current().map(|p| p.id()), Some(outer.id()));
        drop(outer);
        assert!(Process::current().is_none());
    }

    #[test]
    fn test_downstream_defaults_to_plug() {
        let (_registry, _monitor, _scope) = isolated();
        let target = plug("target");
        let consumer = plug("consumer");

        let process = Process::new("compute", target.clone(), None).unwrap();
        assert!(same_plug(process.downstream(), &target));
        drop(process);

        let process = Process::new("compute", target.clone(), Some(consumer.clone())).unwrap();
        assert!(same_plug(process.plug(), &target));
        assert!(same_plug(process.downstream(), &consumer));
    }

    #[test]
    fn test_notifications_are_lifo() {
        let (_registry, monitor, _scope) = isolated();

        let a = Process::new("compute", plug("a"), None).unwrap();
        let b = Process::new("compute", plug("b"), None).unwrap();
        let c = Process::new("hash", plug("c"), None).unwrap();
        let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());
        drop(c);
        drop(b);
        drop(a);

        assert_eq!(
            monitor.events(),
            vec![
                Event::Started(a_id),
                Event::Started(b_id),
                Event::Started(c_id),
                Event::Finished(c_id),
                Event::Finished(b_id),
                Event::Finished(a_id),
            ]
        );
    }

    #[test]
    fn test_cancelled_context_leaves_no_trace() {
        let (_registry, monitor, _scope) = isolated();
        let outer = Process::new("compute", plug("outer"), None).unwrap();
        let events_before = monitor.events().len();

        let token = CancellationToken::new();
        token.cancel();
        let _cancelled = ThreadState::capture()
            .with_context(Context::with_canceller(token))
            .enter();

        let result = Process::new("compute", plug("inner"), None);
        assert_eq!(result.err(), Some(ProcessError::Cancelled));
        assert_eq!(Process::current().map(|p| p.id()), Some(outer.id()));
        assert_eq!(monitor.events().len(), events_before);
    }

    #[test]
    fn test_error_origin_is_innermost_plug() {
        let (_registry, _monitor, _scope) = isolated();
        let node_a = MemoryNode::new("a");
        let node_b = MemoryNode::new("b");
        let node_c = MemoryNode::new("c");
        let a: Arc<dyn Plug> = node_a.add_plug("out", Direction::Out);
        let b: Arc<dyn Plug> = node_b.add_plug("out", Direction::Out);
        let c: Arc<dyn Plug> = node_c.add_plug("out", Direction::Out);

        let result: Result<(), ProcessError> = Process::run("compute", a.clone(), None, |_| {
            Process::run("compute", b.clone(), None, |_| {
                let inner: Result<(), ProcessError> = Process::run("compute", c.clone(), None, |_| {
                    Err(ProcessError::computation("bad input"))
                });
                let source = error_source().expect("origin recorded by c");
                assert!(same_plug(&source, &c));
                inner
            })
        });

        assert_eq!(result, Err(ProcessError::computation("bad input")));
        for node in [&node_a, &node_b, &node_c] {
            let errors = node.errors();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].source.as_deref(), Some("c.out"));
            assert_eq!(errors[0].message, "bad input");
        }
        assert!(error_source().is_none());
    }

    #[test]
    fn test_error_source_survives_until_root_drops() {
        let (_registry, _monitor, _scope) = isolated();
        let root = Process::new("compute", plug("root"), None).unwrap();
        let failing = plug("failing");

        let _ = Process::run("compute", failing.clone(), None, |_| -> Result<(), _> {
            Err(ProcessError::computation("nope"))
        });
        assert!(error_source().is_some_and(|s| same_plug(&s, &failing)));

        drop(root);
        assert!(error_source().is_none());
    }

    #[test]
    fn test_cancellation_is_not_reported() {
        let (_registry, _monitor, _scope) = isolated();
        let node = MemoryNode::new("n");
        let out: Arc<dyn Plug> = node.add_plug("out", Direction::Out);

        let process = Process::new("compute", out, None).unwrap();
        let error = process.handle_error(ProcessError::Cancelled);

        assert_eq!(error, ProcessError::Cancelled);
        assert!(error_source().is_none());
        assert!(node.errors().is_empty());
    }

    #[test]
    fn test_panic_is_reported_and_resumed() {
        let (_registry, monitor, _scope) = isolated();
        let node = MemoryNode::new("n");
        let out: Arc<dyn Plug> = node.add_plug("out", Direction::Out);

        let caught = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: Result<(), ProcessError> =
                Process::run("compute", out.clone(), None, |_| panic!("exploded"));
        }));

        assert!(caught.is_err());
        assert_eq!(node.errors()[0].message, "exploded");
        assert!(Process::current().is_none());
        assert!(error_source().is_none());
        assert!(matches!(monitor.events().last(), Some(Event::Finished(_))));
    }

    #[test]
    fn test_non_string_panic_payload_uses_unknown_error() {
        assert_eq!(panic_message(&42_u32), UNKNOWN_ERROR_MESSAGE);
        assert_eq!(panic_message(&"text"), "text");
        assert_eq!(panic_message(&String::from("owned")), "owned");
    }

    #[test]
    fn test_ancestors_are_innermost_first() {
        let (_registry, _monitor, _scope) = isolated();
        let a = Process::new("compute", plug("a"), None).unwrap();
        let b = Process::new("compute", plug("b"), None).unwrap();
        let c = Process::new("compute", plug("c"), None).unwrap();

        let ids: Vec<ProcessId> = c.ancestors().map(|p| p.id()).collect();
        assert_eq!(ids, vec![b.id(), a.id()]);
    }

    /// Panics in whichever callbacks it is told to.
    struct PanickingMonitor {
        on_start: bool,
        on_finish: bool,
    }

    impl Monitor for PanickingMonitor {
        fn process_started(&self, _process: &ProcessInfo) {
            if self.on_start {
                panic!("monitor failed on start");
            }
        }

        fn process_finished(&self, _process: &ProcessInfo) {
            if self.on_finish {
                panic!("monitor failed on finish");
            }
        }
    }

    #[test]
    fn test_monitor_panic_on_start_unlinks_without_finish() {
        let (registry, monitor, _scope) = isolated();
        let outer = Process::new("compute", plug("outer"), None).unwrap();
        registry.register_monitor(Arc::new(PanickingMonitor {
            on_start: true,
            on_finish: false,
        }));
        let events_before = monitor.events().len();

        let caught = panic::catch_unwind(AssertUnwindSafe(|| {
            Process::new("compute", plug("inner"), None).map(drop)
        }));

        assert!(caught.is_err());
        assert_eq!(Process::current().map(|p| p.id()), Some(outer.id()));
        assert!(monitor.events()[events_before..]
            .iter()
            .all(|e| matches!(e, Event::Started(_))));
    }

    #[test]
    fn test_monitor_panic_on_finish_still_unlinks() {
        let (registry, _monitor, _scope) = isolated();
        registry.register_monitor(Arc::new(PanickingMonitor {
            on_start: false,
            on_finish: true,
        }));
        let outer = Process::new("compute", plug("outer"), None).unwrap();

        let caught = panic::catch_unwind(AssertUnwindSafe(|| {
            let inner = Process::new("compute", plug("inner"), None).unwrap();
            drop(inner);
        }));
        assert!(caught.is_err());
        assert_eq!(Process::current().map(|p| p.id()), Some(outer.id()));

        let mut sibling_info = None;
        let caught = panic::catch_unwind(AssertUnwindSafe(|| {
            let sibling = Process::new("compute", plug("sibling"), None).unwrap();
            sibling_info = Some(sibling.info().clone());
        }));
        assert!(caught.is_err());
        let sibling_info = sibling_info.expect("sibling was created");
        assert_eq!(sibling_info.parent().map(|p| p.id()), Some(outer.id()));
        assert_eq!(sibling_info.depth(), 1);

        // The thread root also clears the error source when its finish panics.
        assert!(error_source::attribute(outer.plug()));
        let caught = panic::catch_unwind(AssertUnwindSafe(move || drop(outer)));
        assert!(caught.is_err());
        assert!(Process::current().is_none());
        assert!(error_source().is_none());
    }
}
