// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sf merge` - squash-merge a task's worktree branch into a destination
//! branch.
//!
//! Merging is plain git plumbing, not an orchestration-core concern;
//! `sf-core`'s `WorktreeManager` only allocates/releases worktree paths; it
//! has no merge logic. This shells out the same way the daemon's workspace
//! teardown does for `git worktree remove`.

use clap::Args;
use tokio::process::Command;

use crate::exit_error::ExitError;

#[derive(Args)]
pub struct MergeArgs {
    #[arg(long)]
    pub branch: String,
    #[arg(long)]
    pub into: String,
    #[arg(long, short = 'm')]
    pub message: String,
    /// Delete the source branch after a successful merge
    #[arg(long)]
    pub cleanup: bool,
}

pub async fn run(args: MergeArgs) -> Result<(), ExitError> {
    run_git(&["checkout", &args.into]).await?;
    run_git(&["merge", "--squash", &args.branch]).await?;
    run_git(&["commit", "-m", &args.message]).await?;
    if args.cleanup {
        run_git(&["branch", "-D", &args.branch]).await?;
    }
    println!("merged {} into {} (squash)", args.branch, args.into);
    Ok(())
}

async fn run_git(args: &[&str]) -> Result<(), ExitError> {
    let output = Command::new("git")
        .args(args)
        .output()
        .await
        .map_err(|error| ExitError::new(1, format!("failed to run git {args:?}: {error}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExitError::new(1, format!("git {args:?} failed: {}", stderr.trim())));
    }
    Ok(())
}
