// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Filter used when neither `RUST_LOG` nor `tracing.filter` is set
pub const DEFAULT_TRACING_FILTER: &str = "the_plugwood=info";
/// Section name of the performance monitor, used in validation messages
pub const PERFORMANCE_MONITOR: &str = "performance";
