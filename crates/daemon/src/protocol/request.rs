// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use sf_core::{AdapterType, Event};

/// Request from CLI to daemon, one JSON object per line on the socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Ping,

    Hello {
        version: String,
    },

    Status,

    Shutdown,

    Event {
        event: Event,
    },

    TaskCreate {
        title: String,
        task_type: String,
        priority: u8,
        complexity: u8,
    },

    TaskList,

    TaskGet {
        id: String,
    },

    TaskTransition {
        id: String,
        status: String,
    },

    TaskAssign {
        id: String,
        agent_id: String,
    },

    TaskDelete {
        id: String,
        reason: Option<String>,
    },

    TaskGc {
        age_days: i64,
        dry_run: bool,
    },

    DocCreate {
        content_type: String,
        content: String,
        category: String,
    },

    DocList,

    DocGet {
        id: String,
    },

    DocUpdate {
        id: String,
        content: String,
    },

    DocHistory {
        id: String,
    },

    DocRollback {
        id: String,
        target_version: u64,
    },

    DocSearch {
        query: String,
    },

    DocArchive {
        id: String,
    },

    DocUnarchive {
        id: String,
    },

    AgentRegister {
        name: String,
        role: String,
        mode: Option<String>,
        focus: Option<String>,
        trigger: Option<String>,
        provider: Option<String>,
        model: Option<String>,
    },

    AgentList,

    AgentGet {
        id: String,
    },

    AgentStart {
        id: String,
    },

    AgentStop {
        id: String,
    },

    SyncNow {
        provider: String,
        project: String,
        adapter_type: AdapterType,
    },

    /// Manually fires one steward (S7); the history entry this produces is
    /// stamped `manual=true`, distinct from its cron/event triggers.
    ExecuteSteward {
        id: String,
    },

    #[serde(other)]
    Unknown,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
