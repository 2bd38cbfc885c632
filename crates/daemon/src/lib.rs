// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring for the Stoneforge orchestration daemon: constructs the concrete
//! store/settings/registry, starts the dispatch, steward, and sync daemons,
//! and serves the CLI's IPC protocol over a Unix socket.
//!
//! This crate exposes the protocol, config, error, and state types for
//! `sf-cli` and for integration tests to build against; the bootstrap
//! sequence itself lives in `main.rs`.

pub mod config;
pub mod error;
pub mod executor;
pub mod listener;
pub mod protocol;
pub mod state;
pub mod steward_driver;

pub use config::{state_dir, DaemonSettings, ProcessConfig};
pub use error::{DaemonError, DaemonResult};
pub use executor::SessionStewardExecutor;
pub use listener::Listener;
pub use protocol::{buffered, read_request, read_response, write_request, write_response, ProtocolError, Request, Response};
pub use state::AppState;
pub use steward_driver::StewardDriver;
