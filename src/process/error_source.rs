// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Origin tracking and downstream reporting of process failures.
//!
//! Each thread-of-control remembers the plug where the first failure of its
//! current process tree was observed. Every process the failure unwinds
//! through then reports it downstream, always naming that first plug as
//! the source.
//!
//! Attribution is per thread. A failure fanned out to sibling tasks on other
//! threads gets attributed independently on each of them.

use std::cell::RefCell;
use std::sync::Arc;

use crate::graph::{same_plug, Direction, Plug};

thread_local! {
    static ERROR_SOURCE: RefCell<Option<Arc<dyn Plug>>> = const { RefCell::new(None) };
}

/// The origin plug of the failure currently unwinding on this thread, if any.
pub fn error_source() -> Option<Arc<dyn Plug>> {
    ERROR_SOURCE.with(|slot| slot.borrow().clone())
}

/// Record `plug` as the origin unless one is already recorded.
/// Returns true if `plug` became the origin.
pub(crate) fn attribute(plug: &Arc<dyn Plug>) -> bool {
    ERROR_SOURCE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            *slot = Some(plug.clone());
            true
        } else {
            false
        }
    })
}

pub(crate) fn clear() {
    ERROR_SOURCE.with(|slot| slot.borrow_mut().take());
}

/// Swap the slot contents, returning the previous origin.
pub(crate) fn replace(source: Option<Arc<dyn Plug>>) -> Option<Arc<dyn Plug>> {
    ERROR_SOURCE.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), source))
}

/// Notify the nodes along the path from `downstream` back to `plug`.
///
/// Starting at `downstream`, every output plug that has a node gets
/// `(plug, source, message)` on the node's error channel. The walk follows
/// input connections and stops once `plug` has been visited (or the chain
/// runs out). Returns the number of notifications sent.
pub fn emit_error(
    plug: &Arc<dyn Plug>,
    downstream: &Arc<dyn Plug>,
    source: Option<&Arc<dyn Plug>>,
    message: &str,
) -> usize {
    let mut notified = 0;
    let mut cursor = Some(downstream.clone());
    while let Some(current) = cursor {
        if current.direction() == Direction::Out {
            if let Some(node) = current.node() {
                node.plug_error(&current, source, message);
                notified += 1;
            }
        }
        cursor = if same_plug(&current, plug) {
            None
        } else {
            current.input()
        };
    }
    notified
}
