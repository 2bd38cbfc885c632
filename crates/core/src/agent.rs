// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent entity: director, worker, or steward.

use crate::entity::EntityMeta;
use crate::id::{AgentId, SessionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Director,
    Worker,
    Steward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerMode {
    Ephemeral,
    Persistent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StewardFocus {
    Merge,
    Docs,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    Cron { schedule: String },
    Event { event: String, condition: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Suspended,
    Terminated,
}

/// Role-specific configuration, mirroring the `metadata` subtree described
/// for agent entities: workers carry a mode, stewards carry a focus and
/// trigger list, directors carry nothing extra.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleConfig {
    Director,
    Worker { worker_mode: WorkerMode },
    Steward { steward_focus: StewardFocus, triggers: Vec<Trigger> },
}

impl RoleConfig {
    pub fn role(&self) -> AgentRole {
        match self {
            RoleConfig::Director => AgentRole::Director,
            RoleConfig::Worker { .. } => AgentRole::Worker,
            RoleConfig::Steward { .. } => AgentRole::Steward,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub id: AgentId,
    pub name: String,
    pub role_config: RoleConfig,
    pub max_concurrent_tasks: u32,
    pub session_status: SessionStatus,
    pub session_id: Option<SessionId>,
    pub channel_id: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub reports_to: Option<AgentId>,
}

impl Agent {
    pub fn role(&self) -> AgentRole {
        self.role_config.role()
    }

    pub fn is_idle(&self) -> bool {
        self.session_status == SessionStatus::Idle
    }

    pub fn is_rate_limited(&self, limited_until: Option<chrono::DateTime<chrono::Utc>>, now: chrono::DateTime<chrono::Utc>) -> bool {
        limited_until.is_some_and(|until| now < until)
    }
}

crate::builder! {
    pub struct AgentBuilder => Agent {
        into { name: String = "worker-1" }
        set { id: AgentId = AgentId::new() }
        set { role_config: RoleConfig = RoleConfig::Worker { worker_mode: WorkerMode::Ephemeral } }
        set { max_concurrent_tasks: u32 = 1 }
        set { session_status: SessionStatus = SessionStatus::Idle }
        option { session_id: SessionId = None }
        option { channel_id: String = None }
        option { provider: String = None }
        option { model: String = None }
        option { reports_to: AgentId = None }
        computed { meta: EntityMeta = EntityMeta::new(self.id.to_string(), "agent", "system", chrono::Utc::now()) }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
