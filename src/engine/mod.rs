// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod dispatch;

pub use dispatch::{parallel_map, spawn_blocking};
