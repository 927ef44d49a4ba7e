// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Helpers that run work on other threads without losing process ancestry.
//!
//! Each helper captures the calling thread's [`ThreadState`] and enters it on
//! the worker before running the closure, so processes created by the work
//! report the dispatching process as their parent, see its context, and
//! notify the same monitor registry.

use std::thread;

use crate::process::ThreadState;

/// Apply `f` to each item on its own scoped thread and collect the results
/// in input order.
///
/// A panic in any worker is re-raised on the calling thread after all
/// workers have finished.
///
/// # Example
/// ```
/// use the_plugwood::engine::dispatch::parallel_map;
/// use the_plugwood::graph::{Direction, MemoryPlug};
/// use the_plugwood::process::Process;
///
/// let root = MemoryPlug::new("root", Direction::Out);
/// let process = Process::new("compute", root, None).unwrap();
/// let root_id = process.id();
///
/// let parents = parallel_map(vec![1, 2, 3], |_| {
///     Process::current().map(|p| p.id())
/// });
/// assert!(parents.iter().all(|p| *p == Some(root_id)));
/// ```
pub fn parallel_map<I, T, R, F>(items: I, f: F) -> Vec<R>
where
    I: IntoIterator<Item = T>,
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let state = ThreadState::capture();
    let f = &f;

    thread::scope(|scope| {
        let handles: Vec<_> = items
            .into_iter()
            .map(|item| {
                let state = state.clone();
                scope.spawn(move || {
                    let _scope = state.enter();
                    f(item)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(payload) => std::panic::resume_unwind(payload),
            })
            .collect()
    })
}

/// Run `f` on tokio's blocking pool under the calling thread's state.
///
/// # Example
/// ```
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// use the_plugwood::engine::dispatch::spawn_blocking;
/// use the_plugwood::process::Process;
///
/// let has_parent = spawn_blocking(|| Process::current().is_some()).await.unwrap();
/// assert!(!has_parent);
/// # });
/// ```
pub fn spawn_blocking<F, R>(f: F) -> tokio::task::JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let state = ThreadState::capture();
    tokio::task::spawn_blocking(move || {
        let _scope = state.enter();
        f()
    })
}
