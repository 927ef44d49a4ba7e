// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for process lifecycle events.
//!
//! These fire for every computation, so all of them log at `debug!`.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A process started and was announced to monitors.
///
/// # Log Level
/// `debug!` - High-volume lifecycle event
///
/// # Example
/// ```
/// use the_plugwood::observability::messages::process::ProcessStarted;
///
/// let msg = ProcessStarted {
///     id: 7,
///     kind: "compute",
///     plug: "blur.out",
///     depth: 1,
///     ancestry: Some("grade.out > blur.out"),
/// };
///
/// assert_eq!(msg.to_string(), "Process 7 started: compute of blur.out (depth 1)");
/// ```
pub struct ProcessStarted<'a> {
    pub id: u64,
    pub kind: &'a str,
    pub plug: &'a str,
    pub depth: usize,
    pub ancestry: Option<&'a str>,
}

impl Display for ProcessStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process {} started: {} of {} (depth {})",
            self.id, self.kind, self.plug, self.depth
        )
    }
}

impl StructuredLog for ProcessStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            process_id = self.id,
            kind = self.kind,
            plug = self.plug,
            depth = self.depth,
            ancestry = self.ancestry,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "process",
            span_name = name,
            process_id = self.id,
            kind = self.kind,
            plug = self.plug,
            depth = self.depth,
        )
    }
}

/// A process finished and was announced to monitors.
///
/// # Log Level
/// `debug!` - High-volume lifecycle event
pub struct ProcessFinished<'a> {
    pub id: u64,
    pub kind: &'a str,
    pub plug: &'a str,
}

impl Display for ProcessFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process {} finished: {} of {}",
            self.id, self.kind, self.plug
        )
    }
}

impl StructuredLog for ProcessFinished<'_> {
    fn log(&self) {
        tracing::debug!(
            process_id = self.id,
            kind = self.kind,
            plug = self.plug,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "process_finished",
            span_name = name,
            process_id = self.id,
            kind = self.kind,
            plug = self.plug,
        )
    }
}

/// A process was refused because its context had been cancelled.
///
/// # Log Level
/// `debug!` - Expected outcome of cancelling an evaluation
///
/// # Example
/// ```
/// use the_plugwood::observability::messages::process::ProcessCancelled;
///
/// let msg = ProcessCancelled {
///     kind: "hash",
///     plug: "merge.out",
/// };
///
/// assert_eq!(msg.to_string(), "Cancelled hash of merge.out before it started");
/// ```
pub struct ProcessCancelled<'a> {
    pub kind: &'a str,
    pub plug: &'a str,
}

impl Display for ProcessCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cancelled {} of {} before it started",
            self.kind, self.plug
        )
    }
}

impl StructuredLog for ProcessCancelled<'_> {
    fn log(&self) {
        tracing::debug!(kind = self.kind, plug = self.plug, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "process_cancelled",
            span_name = name,
            kind = self.kind,
            plug = self.plug,
        )
    }
}

/// A process reported an error to the nodes downstream of it.
///
/// # Log Level
/// `debug!` - Each failing process in a chain logs one of these; the
/// caller decides whether the final error is worth more
pub struct ProcessErrorEmitted<'a> {
    pub kind: &'a str,
    pub plug: &'a str,
    pub source: Option<&'a str>,
    pub message: &'a str,
    pub notified: usize,
}

impl Display for ProcessErrorEmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Error in {} of {} (source: {}): {} [{} node(s) notified]",
            self.kind,
            self.plug,
            self.source.unwrap_or("unknown"),
            self.message,
            self.notified
        )
    }
}

impl StructuredLog for ProcessErrorEmitted<'_> {
    fn log(&self) {
        tracing::debug!(
            kind = self.kind,
            plug = self.plug,
            source = self.source,
            error = self.message,
            notified = self.notified,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "process_error",
            span_name = name,
            kind = self.kind,
            plug = self.plug,
            source = self.source,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_emitted_display_without_source() {
        let msg = ProcessErrorEmitted {
            kind: "compute",
            plug: "a.out",
            source: None,
            message: "boom",
            notified: 0,
        };
        assert_eq!(
            msg.to_string(),
            "Error in compute of a.out (source: unknown): boom [0 node(s) notified]"
        );
    }

    #[test]
    fn test_finished_display() {
        let msg = ProcessFinished {
            id: 3,
            kind: "hash",
            plug: "b.out",
        };
        assert_eq!(msg.to_string(), "Process 3 finished: hash of b.out");
    }
}
