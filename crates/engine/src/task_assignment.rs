// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task Assignment (§4.2): the status machine and workload accounting for
//! tasks, layered over the `Store`.

use crate::error::EngineResult;
use sf_core::{AgentId, Clock, Store, Task, TaskId, TaskStatus};
use std::sync::Arc;

pub struct TaskAssignment<C: Clock> {
    store: Arc<dyn Store>,
    clock: C,
}

impl<C: Clock> TaskAssignment<C> {
    pub fn new(store: Arc<dyn Store>, clock: C) -> Self {
        Self { store, clock }
    }

    async fn load_and_save(&self, id: &TaskId, f: impl FnOnce(&mut Task) -> EngineResult<()>) -> EngineResult<Task> {
        let mut task = self.store.get_task(id).await?;
        f(&mut task)?;
        self.store.put_task(task.clone()).await?;
        Ok(task)
    }

    pub async fn transition_status(&self, id: &TaskId, to: TaskStatus) -> EngineResult<Task> {
        let now = self.clock.utc_now();
        self.load_and_save(id, |task| Ok(task.transition_status(to, now)?)).await
    }

    pub async fn close_task(&self, id: &TaskId, reason: Option<String>) -> EngineResult<Task> {
        let now = self.clock.utc_now();
        self.load_and_save(id, |task| Ok(task.close(reason, now)?)).await
    }

    pub async fn reopen_task(&self, id: &TaskId) -> EngineResult<Task> {
        let now = self.clock.utc_now();
        self.load_and_save(id, |task| Ok(task.reopen(now)?)).await
    }

    pub async fn start_task(&self, id: &TaskId) -> EngineResult<Task> {
        let now = self.clock.utc_now();
        self.load_and_save(id, |task| Ok(task.start(now)?)).await
    }

    pub async fn assign_to_agent(&self, id: &TaskId, agent_id: AgentId) -> EngineResult<Task> {
        let now = self.clock.utc_now();
        self.load_and_save(id, |task| {
            task.assign_to(agent_id, now);
            Ok(())
        })
        .await
    }

    pub async fn unassign_task(&self, id: &TaskId) -> EngineResult<Task> {
        let now = self.clock.utc_now();
        self.load_and_save(id, |task| {
            task.unassign(now);
            Ok(())
        })
        .await
    }

    /// Count of the agent's non-terminal, non-backlog tasks.
    pub async fn get_agent_workload(&self, agent_id: &AgentId) -> EngineResult<u32> {
        let tasks = self.store.list_tasks().await?;
        Ok(tasks
            .iter()
            .filter(|t| t.assignee.as_ref() == Some(agent_id) && t.counts_toward_workload())
            .count() as u32)
    }

    pub async fn agent_has_capacity(&self, agent_id: &AgentId, max_concurrent_tasks: u32) -> EngineResult<bool> {
        Ok(self.get_agent_workload(agent_id).await? < max_concurrent_tasks)
    }
}

#[cfg(test)]
#[path = "task_assignment_tests.rs"]
mod tests;
