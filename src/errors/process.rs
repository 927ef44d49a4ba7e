// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while a process is being evaluated.

use thiserror::Error;

/// Failure of a single evaluation step.
///
/// `Cancelled` is a cooperative control-flow outcome and is never reported to
/// nodes. Everything else is a `Computation` failure, attributed to the plug
/// where it was first observed and reported downstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The evaluation context requested cancellation.
    #[error("Cancelled")]
    Cancelled,

    /// The step itself failed.
    #[error("{0}")]
    Computation(String),
}

impl ProcessError {
    /// Convenience constructor for computation failures.
    pub fn computation(message: impl Into<String>) -> Self {
        ProcessError::Computation(message.into())
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, ProcessError::Cancelled)
    }
}
