// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sf init` - initialize a workspace's `.stoneforge/` state layout.

use clap::Args;

use crate::exit_error::ExitError;

#[derive(Args)]
pub struct InitArgs {
    /// Workspace directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,
}

pub fn run(args: InitArgs) -> Result<(), ExitError> {
    let root = args.path.join(".stoneforge");
    std::fs::create_dir_all(root.join(".worktrees")).map_err(io_error)?;
    std::fs::create_dir_all(root.join("sync")).map_err(io_error)?;
    // The storage engine is in-memory only (no WAL, no on-disk schema); we
    // still create a placeholder so `sf doctor` has a concrete path to check.
    let db_marker = root.join("stoneforge.db");
    if !db_marker.exists() {
        std::fs::write(&db_marker, b"").map_err(io_error)?;
    }
    println!("initialized workspace at {}", root.display());
    Ok(())
}

fn io_error(error: std::io::Error) -> ExitError {
    ExitError::new(1, error.to_string())
}
