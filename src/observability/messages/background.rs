// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for background task events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A background task thread started running.
///
/// # Log Level
/// `debug!` - Routine lifecycle event
pub struct BackgroundTaskStarted<'a> {
    pub id: u64,
    pub subject: &'a str,
}

impl Display for BackgroundTaskStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Background task {} started: {}", self.id, self.subject)
    }
}

impl StructuredLog for BackgroundTaskStarted<'_> {
    fn log(&self) {
        tracing::debug!(task_id = self.id, subject = self.subject, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "background_task",
            span_name = name,
            task_id = self.id,
            subject = self.subject,
        )
    }
}

/// A background task thread finished.
///
/// # Log Level
/// `warn!` when the task errored, `debug!` otherwise
///
/// # Example
/// ```
/// use the_plugwood::observability::messages::background::BackgroundTaskFinished;
///
/// let msg = BackgroundTaskFinished {
///     id: 4,
///     subject: "preview",
///     status: "errored",
///     error: Some("missing input"),
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Background task 4 (preview) errored: missing input"
/// );
/// ```
pub struct BackgroundTaskFinished<'a> {
    pub id: u64,
    pub subject: &'a str,
    pub status: &'a str,
    pub error: Option<&'a str>,
}

impl Display for BackgroundTaskFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.error {
            Some(error) => write!(
                f,
                "Background task {} ({}) {}: {}",
                self.id, self.subject, self.status, error
            ),
            None => write!(
                f,
                "Background task {} ({}) {}",
                self.id, self.subject, self.status
            ),
        }
    }
}

impl StructuredLog for BackgroundTaskFinished<'_> {
    fn log(&self) {
        if self.error.is_some() {
            tracing::warn!(
                task_id = self.id,
                subject = self.subject,
                status = self.status,
                error = self.error,
                "{}", self
            );
        } else {
            tracing::debug!(
                task_id = self.id,
                subject = self.subject,
                status = self.status,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "background_task_finished",
            span_name = name,
            task_id = self.id,
            status = self.status,
        )
    }
}

/// Background tasks were cancelled and waited on before a registry change.
///
/// # Log Level
/// `warn!` if any task had to be skipped because it was the one quiescing,
/// `debug!` otherwise
pub struct BackgroundTasksQuiesced {
    pub cancelled: usize,
    pub skipped: usize,
}

impl Display for BackgroundTasksQuiesced {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.skipped > 0 {
            write!(
                f,
                "Cancelled {} background task(s), {} still running on the quiescing thread",
                self.cancelled, self.skipped
            )
        } else {
            write!(f, "Cancelled {} background task(s)", self.cancelled)
        }
    }
}

impl StructuredLog for BackgroundTasksQuiesced {
    fn log(&self) {
        if self.skipped > 0 {
            tracing::warn!(
                cancelled = self.cancelled,
                skipped = self.skipped,
                "{}", self
            );
        } else {
            tracing::debug!(cancelled = self.cancelled, "{}", self);
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "background_quiesce",
            span_name = name,
            cancelled = self.cancelled,
        )
    }
}
