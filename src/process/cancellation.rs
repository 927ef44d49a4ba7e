// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cooperative cancellation check performed when a process starts.

use tokio_util::sync::CancellationToken;

use crate::errors::ProcessError;

/// Fails with [`ProcessError::Cancelled`] if `canceller` has been cancelled.
///
/// A missing canceller means the evaluation can't be cancelled. Long running
/// steps that want finer grained cancellation call this themselves with
/// `Process::context().canceller()`.
pub fn check(canceller: Option<&CancellationToken>) -> Result<(), ProcessError> {
    match canceller {
        Some(token) if token.is_cancelled() => Err(ProcessError::Cancelled),
        _ => Ok(()),
    }
}
