// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task entity and its status transition table.

use crate::entity::EntityMeta;
use crate::error::{CoreError, CoreResult};
use crate::id::{AgentId, DocumentId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Blocked,
    Deferred,
    Review,
    Closed,
    Tombstone,
    Backlog,
}

crate::simple_display! {
    TaskStatus {
        Open => "open",
        InProgress => "in_progress",
        Blocked => "blocked",
        Deferred => "deferred",
        Review => "review",
        Closed => "closed",
        Tombstone => "tombstone",
        Backlog => "backlog",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Bug,
    Feature,
    Task,
    Chore,
}

/// Allowed outbound transitions for each status.
///
/// `STATUS_TRANSITIONS[OPEN]` includes `BACKLOG`, slightly broader than some
/// older docs implied; this table is authoritative.
pub fn allowed_transitions(from: TaskStatus) -> &'static [TaskStatus] {
    use TaskStatus::*;
    match from {
        Open => &[InProgress, Blocked, Deferred, Closed, Backlog],
        InProgress => &[Open, Blocked, Deferred, Closed],
        Blocked => &[Open, InProgress, Deferred, Closed],
        Deferred => &[Open, InProgress, Backlog],
        Review => &[Open, InProgress, Closed],
        Closed => &[Open],
        Backlog => &[Open, Deferred, Closed],
        Tombstone => &[],
    }
}

pub fn is_valid_status_transition(from: TaskStatus, to: TaskStatus) -> bool {
    from == to || allowed_transitions(from).contains(&to)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub priority: u8,
    pub complexity: u8,
    pub task_type: TaskType,
    pub description_ref: Option<DocumentId>,
    pub acceptance_criteria: Option<String>,
    pub close_reason: Option<String>,
    pub assignee: Option<AgentId>,
    pub owner: Option<AgentId>,
    pub deadline: Option<DateTime<Utc>>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    pub delete_reason: Option<String>,
}

impl Task {
    /// Apply a status transition, enforcing the table and the
    /// `closedAt` ↔ `status=closed` invariant. `now` is applied to both the
    /// touched envelope and `closedAt`/clearing thereof.
    pub fn transition_status(&mut self, to: TaskStatus, now: DateTime<Utc>) -> CoreResult<()> {
        if !is_valid_status_transition(self.status, to) {
            return Err(CoreError::invalid_status(
                self.status.to_string(),
                to.to_string(),
                allowed_transitions(self.status).iter().map(|s| s.to_string()).collect(),
            ));
        }
        let was = self.status;
        self.status = to;
        if was != to {
            if to == TaskStatus::Closed {
                self.closed_at = Some(now);
            } else {
                self.closed_at = None;
            }
        }
        self.meta.touch(now);
        Ok(())
    }

    pub fn close(&mut self, reason: Option<String>, now: DateTime<Utc>) -> CoreResult<()> {
        self.transition_status(TaskStatus::Closed, now)?;
        self.close_reason = reason;
        Ok(())
    }

    pub fn reopen(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.transition_status(TaskStatus::Open, now)?;
        self.close_reason = None;
        Ok(())
    }

    pub fn assign_to(&mut self, agent_id: AgentId, now: DateTime<Utc>) {
        self.assignee = Some(agent_id);
        self.meta.touch(now);
    }

    pub fn unassign(&mut self, now: DateTime<Utc>) {
        self.assignee = None;
        self.meta.touch(now);
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.transition_status(TaskStatus::InProgress, now)
    }

    /// Whether this task counts toward an agent's non-terminal, non-backlog
    /// workload.
    pub fn counts_toward_workload(&self) -> bool {
        !matches!(self.status, TaskStatus::Closed | TaskStatus::Tombstone | TaskStatus::Backlog)
    }

    /// Whether this task is eligible for dispatch matching.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, TaskStatus::Open | TaskStatus::InProgress)
            && self.scheduled_for.map(|t| t <= now).unwrap_or(true)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
