// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only event stream consumed from the Store's event log.

use crate::id::{AgentId, DocumentId, SessionId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Updated,
    Closed,
    Reopened,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "task:created")]
    TaskCreated { id: TaskId, created_at: DateTime<Utc> },
    #[serde(rename = "task:updated")]
    TaskUpdated { id: TaskId, updated_at: DateTime<Utc> },
    #[serde(rename = "task:closed")]
    TaskClosed { id: TaskId, updated_at: DateTime<Utc> },
    #[serde(rename = "task:reopened")]
    TaskReopened { id: TaskId, updated_at: DateTime<Utc> },
    #[serde(rename = "task:deleted")]
    TaskDeleted { id: TaskId, updated_at: DateTime<Utc> },
    #[serde(rename = "document:created")]
    DocumentCreated { id: DocumentId, created_at: DateTime<Utc> },
    #[serde(rename = "document:updated")]
    DocumentUpdated { id: DocumentId, updated_at: DateTime<Utc> },
    #[serde(rename = "agent:registered")]
    AgentRegistered { id: AgentId, created_at: DateTime<Utc> },
    #[serde(rename = "agent:deleted")]
    AgentDeleted { id: AgentId, updated_at: DateTime<Utc> },
    #[serde(rename = "session:started")]
    SessionStarted { id: SessionId, agent_id: AgentId, created_at: DateTime<Utc> },
    #[serde(rename = "session:ended")]
    SessionEnded { id: SessionId, agent_id: AgentId, updated_at: DateTime<Utc> },
    #[serde(rename = "steward:execution_started")]
    StewardExecutionStarted { agent_id: AgentId, created_at: DateTime<Utc> },
    #[serde(rename = "steward:execution_completed")]
    StewardExecutionCompleted { agent_id: AgentId, success: bool, updated_at: DateTime<Utc> },
    #[serde(rename = "steward:execution_failed")]
    StewardExecutionFailed { agent_id: AgentId, error: String, updated_at: DateTime<Utc> },
}

impl Event {
    pub fn element_id(&self) -> &str {
        match self {
            Event::TaskCreated { id, .. }
            | Event::TaskUpdated { id, .. }
            | Event::TaskClosed { id, .. }
            | Event::TaskReopened { id, .. }
            | Event::TaskDeleted { id, .. } => id.as_str(),
            Event::DocumentCreated { id, .. } | Event::DocumentUpdated { id, .. } => id.as_str(),
            Event::AgentRegistered { id, .. } | Event::AgentDeleted { id, .. } => id.as_str(),
            Event::SessionStarted { id, .. } | Event::SessionEnded { id, .. } => id.as_str(),
            Event::StewardExecutionStarted { agent_id, .. }
            | Event::StewardExecutionCompleted { agent_id, .. }
            | Event::StewardExecutionFailed { agent_id, .. } => agent_id.as_str(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::TaskCreated { .. }
            | Event::DocumentCreated { .. }
            | Event::AgentRegistered { .. }
            | Event::SessionStarted { .. }
            | Event::StewardExecutionStarted { .. } => EventKind::Created,
            Event::TaskUpdated { .. }
            | Event::DocumentUpdated { .. }
            | Event::SessionEnded { .. }
            | Event::StewardExecutionCompleted { .. }
            | Event::StewardExecutionFailed { .. } => EventKind::Updated,
            Event::TaskClosed { .. } => EventKind::Closed,
            Event::TaskReopened { .. } => EventKind::Reopened,
            Event::TaskDeleted { .. } | Event::AgentDeleted { .. } => EventKind::Deleted,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Event::TaskCreated { created_at, .. }
            | Event::DocumentCreated { created_at, .. }
            | Event::AgentRegistered { created_at, .. }
            | Event::SessionStarted { created_at, .. }
            | Event::StewardExecutionStarted { created_at, .. } => *created_at,
            Event::TaskUpdated { updated_at, .. }
            | Event::TaskClosed { updated_at, .. }
            | Event::TaskReopened { updated_at, .. }
            | Event::TaskDeleted { updated_at, .. }
            | Event::DocumentUpdated { updated_at, .. }
            | Event::AgentDeleted { updated_at, .. }
            | Event::SessionEnded { updated_at, .. }
            | Event::StewardExecutionCompleted { updated_at, .. }
            | Event::StewardExecutionFailed { updated_at, .. } => *updated_at,
        }
    }
}

/// Query filter over the Store's event log. Ordering is by `createdAt`
/// ascending regardless of which fields are set.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub element_id: Option<String>,
    pub event_kind: Option<EventKind>,
    pub after: Option<DateTime<Utc>>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(id) = &self.element_id {
            if event.element_id() != id {
                return false;
            }
        }
        if let Some(kind) = self.event_kind {
            if event.kind() != kind {
                return false;
            }
        }
        if let Some(after) = self.after {
            if event.created_at() <= after {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
