// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging for process tracking.
//!
//! Every diagnostic the crate emits goes through a message struct in
//! [`messages`] rather than an inline format string. Each message implements
//! `Display` for the human-readable text and [`messages::StructuredLog`] to
//! log itself with typed `tracing` fields.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::process` - process lifecycle, cancellation and error emission
//! * `messages::monitor` - monitor registration changes
//! * `messages::background` - background task lifecycle and quiescing
//!
//! # Usage
//!
//! ```rust
//! use the_plugwood::observability::messages::process::ProcessCancelled;
//! use the_plugwood::observability::messages::StructuredLog;
//!
//! let msg = ProcessCancelled {
//!     kind: "compute",
//!     plug: "blur.out",
//! };
//!
//! msg.log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

use crate::config::consts::DEFAULT_TRACING_FILTER;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins over `filter` when set; `filter` falls back to
/// [`DEFAULT_TRACING_FILTER`]. Installing twice is not an error, the second
/// call is ignored.
pub fn init_tracing(filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or(DEFAULT_TRACING_FILTER)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
