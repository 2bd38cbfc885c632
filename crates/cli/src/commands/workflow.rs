// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sf workflow` - task management commands.
//!
//! "Workflow" is the CLI-facing name for what the core models as a `Task`;
//! there is no separate workflow entity.

use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{print_task, print_tasks, OutputMode};

#[derive(Args)]
pub struct WorkflowArgs {
    #[command(subcommand)]
    pub command: WorkflowCommand,
}

#[derive(Subcommand)]
pub enum WorkflowCommand {
    /// Create a workflow (task)
    Create {
        title: String,
        #[arg(long = "type", default_value = "task")]
        task_type: String,
        #[arg(long, default_value = "3")]
        priority: u8,
        #[arg(long, default_value = "3")]
        complexity: u8,
    },
    /// List workflows
    List,
    /// Show a workflow
    Show { id: String },
    /// List the workflow's own record
    ///
    /// Tasks have no sub-task children in this model; this is an alias of
    /// `show` kept for CLI surface parity.
    Tasks { id: String },
    /// Show a workflow's status/progress summary
    Progress { id: String },
    /// Delete (tombstone) a workflow
    Delete {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Move a workflow to its next natural status (backlog -> open -> in_progress -> review -> closed)
    Promote { id: String },
    /// Garbage-collect old closed/tombstoned workflows
    Gc {
        #[arg(long, default_value_t = 30)]
        age: i64,
        #[arg(long)]
        dry_run: bool,
    },
}

pub async fn run(client: &mut DaemonClient, args: WorkflowArgs, mode: OutputMode) -> Result<(), ExitError> {
    match args.command {
        WorkflowCommand::Create { title, task_type, priority, complexity } => {
            let task = client.task_create(title, task_type, priority, complexity).await?;
            print_task(mode, &task);
        }
        WorkflowCommand::List => {
            let tasks = client.task_list().await?;
            print_tasks(mode, &tasks);
        }
        WorkflowCommand::Show { id } | WorkflowCommand::Tasks { id } => {
            let task = client.task_get(id.clone()).await?.ok_or_else(|| not_found(&id))?;
            print_task(mode, &task);
        }
        WorkflowCommand::Progress { id } => {
            let task = client.task_get(id.clone()).await?.ok_or_else(|| not_found(&id))?;
            if mode.json {
                print_task(mode, &task);
            } else {
                println!("{}: {} (priority {}, complexity {})", task.id, task.status, task.priority, task.complexity);
            }
        }
        WorkflowCommand::Delete { id, reason } => {
            client.task_delete(id, reason).await?;
            if !mode.quiet {
                println!("deleted");
            }
        }
        WorkflowCommand::Promote { id } => {
            let current = client.task_get(id.clone()).await?.ok_or_else(|| not_found(&id))?;
            let next = next_status(current.status);
            let task = client.task_transition(id, next.to_string()).await?;
            print_task(mode, &task);
        }
        WorkflowCommand::Gc { age, dry_run } => {
            let (would_delete, deleted) = client.task_gc(age, dry_run).await?;
            if mode.json {
                let value = serde_json::json!({ "would_delete": would_delete, "deleted": deleted });
                println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
            } else {
                let ids = if dry_run { &would_delete } else { &deleted };
                for id in ids {
                    println!("{id}");
                }
            }
        }
    }
    Ok(())
}

fn next_status(status: sf_core::TaskStatus) -> sf_core::TaskStatus {
    use sf_core::TaskStatus::*;
    match status {
        Backlog => Open,
        Open => InProgress,
        InProgress => Review,
        Review => Closed,
        Blocked => InProgress,
        Deferred => Open,
        Closed => Closed,
        Tombstone => Tombstone,
    }
}

fn not_found(id: &str) -> ExitError {
    ExitError::new(4, format!("workflow not found: {id}"))
}
