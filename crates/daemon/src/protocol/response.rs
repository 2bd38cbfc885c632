// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use sf_core::{Agent, Document, Task};

/// Response from daemon to CLI, one JSON object per line on the socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Ok,

    Hello {
        version: String,
    },

    Status {
        uptime_secs: u64,
        tasks_active: usize,
        sessions_active: usize,
        dispatch_running: bool,
        steward_running: bool,
    },

    ShuttingDown,

    Task {
        task: Box<Task>,
    },

    Tasks {
        tasks: Vec<Task>,
    },

    Document {
        document: Box<Document>,
    },

    Documents {
        documents: Vec<Document>,
    },

    Agent {
        agent: Box<Agent>,
    },

    Agents {
        agents: Vec<Agent>,
    },

    GcResult {
        would_delete: Vec<String>,
        deleted: Vec<String>,
    },

    SyncSummary {
        pushed: usize,
        pulled: usize,
        created: usize,
        skipped: usize,
        conflicts: usize,
        errors: usize,
    },

    NotFound {
        kind: String,
        id: String,
    },

    Error {
        code: String,
        message: String,
    },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
