// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sf agent` - agent registry and session commands.

use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{print_agent, print_agents, OutputMode};

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List agents
    List,
    /// Show an agent
    Show { id: String },
    /// Register a new agent
    Register {
        name: String,
        #[arg(long, default_value = "worker")]
        role: String,
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        focus: Option<String>,
        #[arg(long)]
        trigger: Option<String>,
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Start an agent's session
    Start { id: String },
    /// Stop an agent's session
    Stop { id: String },
    /// Stream an agent's live session output
    ///
    /// Live streaming is not exposed over the daemon protocol; attach to
    /// `sf agent show <id>` and re-poll, or read the daemon log directly.
    Stream { id: String },
    /// Manually fire a steward agent, recording a `manual=true` history entry
    Execute { id: String },
}

pub async fn run(client: &mut DaemonClient, args: AgentArgs, mode: OutputMode) -> Result<(), ExitError> {
    match args.command {
        AgentCommand::List => {
            let agents = client.agent_list().await?;
            print_agents(mode, &agents);
        }
        AgentCommand::Show { id } => {
            let agent = client.agent_get(id.clone()).await?.ok_or_else(|| not_found(&id))?;
            print_agent(mode, &agent);
        }
        AgentCommand::Register { name, role, mode: worker_mode, focus, trigger, provider, model } => {
            let agent = client.agent_register(name, role, worker_mode, focus, trigger, provider, model).await?;
            print_agent(mode, &agent);
        }
        AgentCommand::Start { id } => {
            let agent = client.agent_start(id).await?;
            print_agent(mode, &agent);
        }
        AgentCommand::Stop { id } => {
            let agent = client.agent_stop(id).await?;
            print_agent(mode, &agent);
        }
        AgentCommand::Stream { id } => {
            return Err(ExitError::new(3, format!("agent {id}: live streaming is not available over the daemon protocol")));
        }
        AgentCommand::Execute { id } => {
            client.steward_execute(id).await?;
        }
    }
    Ok(())
}

fn not_found(id: &str) -> ExitError {
    ExitError::new(4, format!("agent not found: {id}"))
}
