// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Evaluation context as seen by process tracking.
//!
//! The full context (variables, frame, etc.) lives with the evaluator. The
//! only thing processes consult is the canceller.

use tokio_util::sync::CancellationToken;

/// Environment a process is evaluated in.
#[derive(Debug, Clone, Default)]
pub struct Context {
    canceller: Option<CancellationToken>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose evaluations are cancelled when `canceller` is.
    pub fn with_canceller(canceller: CancellationToken) -> Self {
        Self {
            canceller: Some(canceller),
        }
    }

    pub fn canceller(&self) -> Option<&CancellationToken> {
        self.canceller.as_ref()
    }
}
