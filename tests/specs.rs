// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end lane scenarios against real git repositories.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/lanes"]
mod lanes {
    mod capacity;
    mod lifecycle;
    mod reconcile;
    mod sharing;
}
