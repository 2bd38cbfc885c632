// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed query/command methods for `DaemonClient`, one per `Request` variant.

use sf_core::{AdapterType, Agent, Document, Event, Task};
use sf_daemon::{Request, Response};

use crate::client::{ClientError, DaemonClient};

impl DaemonClient {
    pub async fn hello(&mut self) -> Result<String, ClientError> {
        let version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")).to_string();
        match self.send(&Request::Hello { version }).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    pub async fn ping(&mut self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Ok => Ok(()),
            other => Self::reject(other),
        }
    }

    pub async fn status(&mut self) -> Result<(u64, usize, usize, bool, bool), ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status { uptime_secs, tasks_active, sessions_active, dispatch_running, steward_running } => {
                Ok((uptime_secs, tasks_active, sessions_active, dispatch_running, steward_running))
            }
            other => Self::reject(other),
        }
    }

    pub async fn shutdown(&mut self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }

    pub async fn publish_event(&mut self, event: Event) -> Result<(), ClientError> {
        match self.send(&Request::Event { event }).await? {
            Response::Ok => Ok(()),
            other => Self::reject(other),
        }
    }

    pub async fn task_create(&mut self, title: String, task_type: String, priority: u8, complexity: u8) -> Result<Task, ClientError> {
        let request = Request::TaskCreate { title, task_type, priority, complexity };
        match self.send(&request).await? {
            Response::Task { task } => Ok(*task),
            other => Self::reject(other),
        }
    }

    pub async fn task_list(&mut self) -> Result<Vec<Task>, ClientError> {
        match self.send(&Request::TaskList).await? {
            Response::Tasks { tasks } => Ok(tasks),
            other => Self::reject(other),
        }
    }

    pub async fn task_get(&mut self, id: String) -> Result<Option<Task>, ClientError> {
        match self.send(&Request::TaskGet { id }).await? {
            Response::Task { task } => Ok(Some(*task)),
            Response::NotFound { .. } => Ok(None),
            other => Self::reject(other),
        }
    }

    pub async fn task_transition(&mut self, id: String, status: String) -> Result<Task, ClientError> {
        match self.send(&Request::TaskTransition { id, status }).await? {
            Response::Task { task } => Ok(*task),
            other => Self::reject(other),
        }
    }

    pub async fn task_assign(&mut self, id: String, agent_id: String) -> Result<Task, ClientError> {
        match self.send(&Request::TaskAssign { id, agent_id }).await? {
            Response::Task { task } => Ok(*task),
            other => Self::reject(other),
        }
    }

    pub async fn task_delete(&mut self, id: String, reason: Option<String>) -> Result<(), ClientError> {
        match self.send(&Request::TaskDelete { id, reason }).await? {
            Response::Ok => Ok(()),
            other => Self::reject(other),
        }
    }

    pub async fn task_gc(&mut self, age_days: i64, dry_run: bool) -> Result<(Vec<String>, Vec<String>), ClientError> {
        match self.send(&Request::TaskGc { age_days, dry_run }).await? {
            Response::GcResult { would_delete, deleted } => Ok((would_delete, deleted)),
            other => Self::reject(other),
        }
    }

    pub async fn doc_create(&mut self, content_type: String, content: String, category: String) -> Result<Document, ClientError> {
        let request = Request::DocCreate { content_type, content, category };
        match self.send(&request).await? {
            Response::Document { document } => Ok(*document),
            other => Self::reject(other),
        }
    }

    pub async fn doc_list(&mut self) -> Result<Vec<Document>, ClientError> {
        match self.send(&Request::DocList).await? {
            Response::Documents { documents } => Ok(documents),
            other => Self::reject(other),
        }
    }

    pub async fn doc_get(&mut self, id: String) -> Result<Option<Document>, ClientError> {
        match self.send(&Request::DocGet { id }).await? {
            Response::Document { document } => Ok(Some(*document)),
            Response::NotFound { .. } => Ok(None),
            other => Self::reject(other),
        }
    }

    pub async fn doc_update(&mut self, id: String, content: String) -> Result<Document, ClientError> {
        match self.send(&Request::DocUpdate { id, content }).await? {
            Response::Document { document } => Ok(*document),
            other => Self::reject(other),
        }
    }

    pub async fn doc_history(&mut self, id: String) -> Result<Vec<Document>, ClientError> {
        match self.send(&Request::DocHistory { id }).await? {
            Response::Documents { documents } => Ok(documents),
            other => Self::reject(other),
        }
    }

    pub async fn doc_rollback(&mut self, id: String, target_version: u64) -> Result<Document, ClientError> {
        match self.send(&Request::DocRollback { id, target_version }).await? {
            Response::Document { document } => Ok(*document),
            other => Self::reject(other),
        }
    }

    pub async fn doc_search(&mut self, query: String) -> Result<Vec<Document>, ClientError> {
        match self.send(&Request::DocSearch { query }).await? {
            Response::Documents { documents } => Ok(documents),
            other => Self::reject(other),
        }
    }

    pub async fn doc_archive(&mut self, id: String) -> Result<Document, ClientError> {
        match self.send(&Request::DocArchive { id }).await? {
            Response::Document { document } => Ok(*document),
            other => Self::reject(other),
        }
    }

    pub async fn doc_unarchive(&mut self, id: String) -> Result<Document, ClientError> {
        match self.send(&Request::DocUnarchive { id }).await? {
            Response::Document { document } => Ok(*document),
            other => Self::reject(other),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn agent_register(
        &mut self,
        name: String,
        role: String,
        mode: Option<String>,
        focus: Option<String>,
        trigger: Option<String>,
        provider: Option<String>,
        model: Option<String>,
    ) -> Result<Agent, ClientError> {
        let request = Request::AgentRegister { name, role, mode, focus, trigger, provider, model };
        match self.send(&request).await? {
            Response::Agent { agent } => Ok(*agent),
            other => Self::reject(other),
        }
    }

    pub async fn agent_list(&mut self) -> Result<Vec<Agent>, ClientError> {
        match self.send(&Request::AgentList).await? {
            Response::Agents { agents } => Ok(agents),
            other => Self::reject(other),
        }
    }

    pub async fn agent_get(&mut self, id: String) -> Result<Option<Agent>, ClientError> {
        match self.send(&Request::AgentGet { id }).await? {
            Response::Agent { agent } => Ok(Some(*agent)),
            Response::NotFound { .. } => Ok(None),
            other => Self::reject(other),
        }
    }

    pub async fn agent_start(&mut self, id: String) -> Result<Agent, ClientError> {
        match self.send(&Request::AgentStart { id }).await? {
            Response::Agent { agent } => Ok(*agent),
            other => Self::reject(other),
        }
    }

    pub async fn agent_stop(&mut self, id: String) -> Result<Agent, ClientError> {
        match self.send(&Request::AgentStop { id }).await? {
            Response::Agent { agent } => Ok(*agent),
            other => Self::reject(other),
        }
    }

    pub async fn steward_execute(&mut self, id: String) -> Result<(), ClientError> {
        match self.send(&Request::ExecuteSteward { id }).await? {
            Response::Ok => Ok(()),
            other => Self::reject(other),
        }
    }

    pub async fn sync_now(&mut self, provider: String, project: String, adapter_type: AdapterType) -> Result<SyncSummary, ClientError> {
        let request = Request::SyncNow { provider, project, adapter_type };
        match self.send(&request).await? {
            Response::SyncSummary { pushed, pulled, created, skipped, conflicts, errors } => {
                Ok(SyncSummary { pushed, pulled, created, skipped, conflicts, errors })
            }
            other => Self::reject(other),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncSummary {
    pub pushed: usize,
    pub pulled: usize,
    pub created: usize,
    pub skipped: usize,
    pub conflicts: usize,
    pub errors: usize,
}
