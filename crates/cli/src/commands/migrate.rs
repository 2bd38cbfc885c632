// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sf migrate` - schema migrations.
//!
//! The storage engine is an in-memory store with no on-disk schema (see
//! `sf-storage`), so there is nothing to migrate yet; this command is a
//! placeholder for when a durable store lands.

use clap::Args;

use crate::exit_error::ExitError;

#[derive(Args)]
pub struct MigrateArgs {
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: MigrateArgs) -> Result<(), ExitError> {
    if args.dry_run {
        println!("no schema migrations pending (in-memory store carries no on-disk schema)");
    } else {
        println!("nothing to migrate");
    }
    Ok(())
}
