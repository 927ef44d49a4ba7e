// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Asynchronous evaluations running on their own threads.
//!
//! A background task runs a closure on a dedicated thread under the
//! dispatching thread's [`ThreadState`], with a fresh canceller in its
//! context. Processes created by the task therefore see the dispatcher as
//! their ancestor and stop at their next process boundary once the task is
//! cancelled.
//!
//! [`BackgroundTasks::cancel_all_tasks`] is how the monitor registry
//! quiesces evaluation before changing its members.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::errors::ProcessError;
use crate::observability::messages::background::{
    BackgroundTaskFinished, BackgroundTaskStarted, BackgroundTasksQuiesced,
};
use crate::observability::messages::StructuredLog;
use crate::process::ThreadState;

/// Something that can stop all in-flight background evaluation.
pub trait BackgroundTaskControl: Send + Sync {
    /// Cancel every running task and wait until each has fully unwound.
    fn cancel_all_tasks(&self);
}

/// Lifecycle of a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Completed,
    Cancelled,
    Errored,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Errored => "errored",
        }
    }
}

struct TaskState {
    status: TaskStatus,
    error: Option<String>,
}

struct TaskShared {
    id: u64,
    subject: String,
    canceller: CancellationToken,
    thread: OnceLock<ThreadId>,
    state: Mutex<TaskState>,
    finished: Condvar,
}

impl TaskShared {
    fn status(&self) -> TaskStatus {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    fn finish(&self, status: TaskStatus, error: Option<String>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.status = status;
        state.error = error;
        self.finished.notify_all();
    }

    fn wait(&self) -> TaskStatus {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.finished
            .wait_while(state, |s| s.status == TaskStatus::Running)
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    fn wait_timeout(&self, timeout: Duration) -> Option<TaskStatus> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (state, _) = self
            .finished
            .wait_timeout_while(state, timeout, |s| s.status == TaskStatus::Running)
            .unwrap_or_else(PoisonError::into_inner);
        (state.status != TaskStatus::Running).then_some(state.status)
    }

    fn on_current_thread(&self) -> bool {
        self.thread.get() == Some(&thread::current().id())
    }
}

/// Pool of running background tasks.
pub struct BackgroundTasks {
    active: Mutex<Vec<Arc<TaskShared>>>,
    next_id: AtomicU64,
}

static GLOBAL: OnceLock<Arc<BackgroundTasks>> = OnceLock::new();

impl BackgroundTasks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            active: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// The pool the global monitor registry quiesces.
    pub fn global() -> &'static Arc<BackgroundTasks> {
        GLOBAL.get_or_init(BackgroundTasks::new)
    }

    /// Run `f` on a new thread under the calling thread's state.
    ///
    /// `f` receives the task's canceller, which is also the canceller of the
    /// task's context. If the dispatching context has a canceller, the task's
    /// is a child of it.
    pub fn spawn<F>(self: &Arc<Self>, subject: impl Into<String>, f: F) -> std::io::Result<BackgroundTask>
    where
        F: FnOnce(&CancellationToken) -> Result<(), ProcessError> + Send + 'static,
    {
        let state = ThreadState::capture();
        let canceller = state
            .context()
            .canceller()
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        let state = state.with_context(Context::with_canceller(canceller.clone()));

        let shared = Arc::new(TaskShared {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            subject: subject.into(),
            canceller,
            thread: OnceLock::new(),
            state: Mutex::new(TaskState {
                status: TaskStatus::Running,
                error: None,
            }),
            finished: Condvar::new(),
        });

        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(shared.clone());

        let pool = self.clone();
        let task = shared.clone();
        let spawned = thread::Builder::new()
            .name(format!("background-{}", shared.id))
            .spawn(move || {
                let _ = task.thread.set(thread::current().id());
                BackgroundTaskStarted {
                    id: task.id,
                    subject: &task.subject,
                }
                .log();

                let outcome = {
                    let _scope = state.enter();
                    panic::catch_unwind(AssertUnwindSafe(|| f(&task.canceller)))
                };
                let (status, error) = match outcome {
                    Ok(Ok(())) => (TaskStatus::Completed, None),
                    Ok(Err(ProcessError::Cancelled)) => (TaskStatus::Cancelled, None),
                    Ok(Err(error)) => (TaskStatus::Errored, Some(error.to_string())),
                    Err(_) => (TaskStatus::Errored, Some("background task panicked".to_string())),
                };

                BackgroundTaskFinished {
                    id: task.id,
                    subject: &task.subject,
                    status: status.as_str(),
                    error: error.as_deref(),
                }
                .log();

                pool.remove(task.id);
                task.finish(status, error);
            });

        if let Err(error) = spawned {
            self.remove(shared.id);
            return Err(error);
        }

        Ok(BackgroundTask { shared })
    }

    /// Number of tasks still running.
    pub fn active_count(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn remove(&self, id: u64) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|task| task.id != id);
    }
}

impl std::fmt::Debug for BackgroundTasks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundTasks")
            .field("active_count", &self.active_count())
            .finish()
    }
}

impl BackgroundTaskControl for BackgroundTasks {
    fn cancel_all_tasks(&self) {
        let tasks: Vec<Arc<TaskShared>> = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for task in &tasks {
            task.canceller.cancel();
        }

        // A task quiescing the pool can't wait for itself.
        let mut skipped = 0;
        for task in &tasks {
            if task.on_current_thread() {
                skipped += 1;
                continue;
            }
            task.wait();
        }

        BackgroundTasksQuiesced {
            cancelled: tasks.len(),
            skipped,
        }
        .log();
    }
}

/// Handle to a running background task. Dropping it cancels the task and
/// waits for it to finish.
pub struct BackgroundTask {
    shared: Arc<TaskShared>,
}

impl BackgroundTask {
    pub fn subject(&self) -> &str {
        &self.shared.subject
    }

    pub fn status(&self) -> TaskStatus {
        self.shared.status()
    }

    /// Error message if the task ended with [`TaskStatus::Errored`].
    pub fn error(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .error
            .clone()
    }

    /// Request cancellation without waiting.
    pub fn cancel(&self) {
        self.shared.canceller.cancel();
    }

    /// Block until the task has finished.
    pub fn wait(&self) -> TaskStatus {
        self.shared.wait()
    }

    /// Block for at most `timeout`. Returns `None` if still running.
    pub fn wait_for(&self, timeout: Duration) -> Option<TaskStatus> {
        self.shared.wait_timeout(timeout)
    }

    pub fn cancel_and_wait(&self) -> TaskStatus {
        self.cancel();
        self.wait()
    }
}

impl std::fmt::Debug for BackgroundTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundTask")
            .field("id", &self.shared.id)
            .field("subject", &self.shared.subject)
            .field("status", &self.status())
            .finish()
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        if self.shared.on_current_thread() {
            self.cancel();
        } else {
            self.cancel_and_wait();
        }
    }
}
