// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `process` - process lifecycle, cancellation and error emission
//! * `monitor` - monitor registration changes
//! * `background` - background task lifecycle and quiescing
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_plugwood::observability::messages::monitor::MonitorRegistered;
//!
//! let msg = MonitorRegistered {
//!     monitor_count: 2,
//!     already_registered: false,
//! };
//!
//! tracing::debug!("{}", msg);
//! ```

use tracing::Span;

pub mod background;
pub mod monitor;
pub mod process;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event.
    fn log(&self);

    /// A span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
