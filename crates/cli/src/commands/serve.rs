// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sf serve` - dashboard server.
//!
//! The dashboard itself is out of scope for the orchestration core; this
//! daemon only exposes the IPC protocol a dashboard would consume. This
//! command exists for CLI surface parity and reports that explicitly.

use clap::Args;

use crate::exit_error::ExitError;

#[derive(Args)]
pub struct ServeArgs {
    /// Named dashboard to serve (e.g. "smithy")
    pub dashboard: Option<String>,
    #[arg(long, default_value_t = 4173)]
    pub port: u16,
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long)]
    pub no_open: bool,
}

pub fn run(args: ServeArgs) -> Result<(), ExitError> {
    let _ = args.no_open;
    Err(ExitError::new(
        3,
        format!(
            "sf serve {} is not part of the orchestration core; point a dashboard host at the daemon's IPC socket instead (requested bind: {}:{})",
            args.dashboard.as_deref().unwrap_or("<default>"),
            args.host,
            args.port
        ),
    ))
}
