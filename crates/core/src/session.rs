// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session record: the durable front for one child agent process run.

use crate::error::{CoreError, CoreResult};
use crate::id::{AgentId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnMode {
    Headless,
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Starting,
    Running,
    Suspended,
    Terminating,
    Terminated,
}

fn allowed_session_transitions(from: SessionState) -> &'static [SessionState] {
    use SessionState::*;
    match from {
        Starting => &[Running, Terminated],
        Running => &[Suspended, Terminating, Terminated],
        Suspended => &[Running, Terminated],
        Terminating => &[Terminated],
        Terminated => &[],
    }
}

pub fn is_valid_session_transition(from: SessionState, to: SessionState) -> bool {
    allowed_session_transitions(from).contains(&to)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    /// Provider-assigned id used for resume; known once the provider
    /// announces a `system/init` event.
    pub provider_session_id: Option<String>,
    pub agent_id: AgentId,
    pub agent_role: crate::agent::AgentRole,
    pub spawn_mode: SpawnMode,
    pub pid: Option<u32>,
    pub state: SessionState,
    pub working_directory: std::path::PathBuf,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn new(
        agent_id: AgentId,
        agent_role: crate::agent::AgentRole,
        spawn_mode: SpawnMode,
        working_directory: std::path::PathBuf,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            provider_session_id: None,
            agent_id,
            agent_role,
            spawn_mode,
            pid: None,
            state: SessionState::Starting,
            working_directory,
            created_at: now,
            last_activity_at: now,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn transition(&mut self, to: SessionState, now: DateTime<Utc>) -> CoreResult<()> {
        if !is_valid_session_transition(self.state, to) {
            return Err(CoreError::invalid_status(
                format!("{:?}", self.state),
                format!("{to:?}"),
                allowed_session_transitions(self.state).iter().map(|s| format!("{s:?}")).collect(),
            ));
        }
        self.state = to;
        self.last_activity_at = now;
        if to == SessionState::Running && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if to == SessionState::Terminated {
            self.ended_at = Some(now);
        }
        Ok(())
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, SessionState::Starting | SessionState::Running | SessionState::Suspended)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
