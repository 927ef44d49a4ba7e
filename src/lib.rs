// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod background; // cancellable background tasks
pub mod config;     // monitoring config + runtime
pub mod context;
pub mod engine;     // cross-thread dispatch helpers
pub mod errors;     // error handling
pub mod graph;      // plug/node collaborators
pub mod monitor;    // monitor trait + registry
pub mod observability;
pub mod process;    // process lifecycle + thread state
