// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! sf-adapters: reference provider implementations (headless stream-JSON
//! subprocess, interactive PTY) and the desktop/log notification adapter.

pub mod headless;
pub mod interactive;
pub mod notify;
pub mod rate_limit;
pub mod registry;

pub use headless::SubprocessHeadlessProvider;
pub use interactive::PtyInteractiveProvider;
pub use notify::NotifyAdapter;
pub use registry::StaticProviderRegistry;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
