// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Plug graph abstractions consumed by process tracking.
//!
//! The graph itself is owned elsewhere. Processes only need to know a plug's
//! direction, its owning node, and the plug it receives its value from, and
//! nodes only need a channel for error notifications.
//!
//! `memory` provides a small in-process implementation used by the tests and
//! the demo binary.

pub mod memory;

use std::sync::Arc;

pub use memory::{MemoryNode, MemoryPlug, PlugErrorRecord};

/// Direction of a plug on its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// A typed port on a node.
pub trait Plug: Send + Sync {
    /// Full name, used in logs and error reports.
    fn name(&self) -> &str;

    fn direction(&self) -> Direction;

    /// The node owning this plug, if it has one.
    fn node(&self) -> Option<Arc<dyn Node>>;

    /// The plug this one receives its value from, if connected.
    fn input(&self) -> Option<Arc<dyn Plug>>;
}

/// A graph node, as far as error reporting is concerned.
pub trait Node: Send + Sync {
    fn name(&self) -> &str;

    /// Error channel. `plug` is the output plug being notified, `source` is
    /// the plug where the failure originated.
    fn plug_error(&self, plug: &Arc<dyn Plug>, source: Option<&Arc<dyn Plug>>, message: &str);
}

/// Identity comparison for plugs, ignoring vtable pointers.
pub fn same_plug(a: &Arc<dyn Plug>, b: &Arc<dyn Plug>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
