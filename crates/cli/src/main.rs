// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sf`: command-line client for the Stoneforge orchestration daemon.

mod client;
mod client_queries;
mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};

use client::DaemonClient;
use exit_error::ExitError;
use output::OutputMode;

#[derive(Parser)]
#[command(name = "sf", version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")))]
struct Cli {
    /// Emit raw JSON instead of a human-readable table
    #[arg(long, global = true)]
    json: bool,
    /// Emit only ids (list commands) or raw content (show commands)
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a workspace's .stoneforge/ state layout
    Init(commands::init::InitArgs),
    /// Document management
    Doc(commands::doc::DocArgs),
    /// Workflow (task) management
    Workflow(commands::workflow::WorkflowArgs),
    /// Agent registry and session management
    Agent(commands::agent::AgentArgs),
    /// Squash-merge a worktree branch
    Merge(commands::merge::MergeArgs),
    /// Health checks against the daemon and workspace layout
    Doctor,
    /// Run pending schema migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Serve a dashboard host (out of core scope)
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mode = OutputMode { json: cli.json, quiet: cli.quiet };

    if let Err(error) = dispatch(cli.command, mode).await {
        eprintln!("error: {}", error.message);
        std::process::exit(error.code);
    }
}

async fn dispatch(command: Command, mode: OutputMode) -> Result<(), ExitError> {
    match command {
        Command::Init(args) => commands::init::run(args),
        Command::Doc(args) => {
            let mut client = DaemonClient::connect().await?;
            commands::doc::run(&mut client, args, mode).await
        }
        Command::Workflow(args) => {
            let mut client = DaemonClient::connect().await?;
            commands::workflow::run(&mut client, args, mode).await
        }
        Command::Agent(args) => {
            let mut client = DaemonClient::connect().await?;
            commands::agent::run(&mut client, args, mode).await
        }
        Command::Merge(args) => commands::merge::run(args).await,
        Command::Doctor => commands::doctor::run().await,
        Command::Migrate(args) => commands::migrate::run(args),
        Command::Serve(args) => commands::serve::run(args),
    }
}
