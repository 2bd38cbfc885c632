// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch Service (§4.6): one stateless matching step per call. All state
//! reads go through Task Assignment / Agent Registry; the service itself
//! holds nothing but its collaborators.

use crate::error::EngineResult;
use crate::task_assignment::TaskAssignment;
use sf_core::{Agent, AgentId, AgentRole, Clock, Store, Task, TaskId};
use std::sync::Arc;

/// Consulted for the "not currently rate-limited" leg of dispatch matching.
/// The Dispatch Daemon owns the concrete tracker fed by `rate_limited`
/// events; Dispatch only reads it.
pub trait RateLimitTracker: Send + Sync {
    fn is_limited(&self, executable_path: &str, now: chrono::DateTime<chrono::Utc>) -> bool;
}

/// A tracker that never reports anything limited, for callers (and tests)
/// that don't care about backoff.
pub struct NoRateLimits;

impl RateLimitTracker for NoRateLimits {
    fn is_limited(&self, _executable_path: &str, _now: chrono::DateTime<chrono::Utc>) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct DispatchDecision {
    pub task_id: TaskId,
    pub agent_id: AgentId,
}

pub struct DispatchService<C: Clock> {
    store: Arc<dyn Store>,
    task_assignment: TaskAssignment<C>,
    rate_limits: Arc<dyn RateLimitTracker>,
    clock: C,
}

impl<C: Clock> DispatchService<C> {
    pub fn new(store: Arc<dyn Store>, rate_limits: Arc<dyn RateLimitTracker>, clock: C) -> Self {
        let task_assignment = TaskAssignment::new(store.clone(), clock.clone());
        Self { store, task_assignment, rate_limits, clock }
    }

    /// One matching step: the highest-priority ready task paired with the
    /// first capable, available, non-rate-limited agent. `None` if no task
    /// has an eligible agent right now.
    pub async fn dispatch(&self) -> EngineResult<Option<DispatchDecision>> {
        let now = self.clock.utc_now();
        let mut ready_tasks: Vec<Task> = self.store.list_tasks().await?.into_iter().filter(|t| t.is_ready(now)).collect();
        ready_tasks.sort_by(task_dispatch_order);

        let agents = self.store.list_agents().await?;

        for task in &ready_tasks {
            for agent in &agents {
                if self.agent_can_take(agent, task, now).await? {
                    return Ok(Some(DispatchDecision { task_id: task.id, agent_id: agent.id }));
                }
            }
        }
        Ok(None)
    }

    /// Repeats `dispatch()` up to `n` times, never reusing a task or agent
    /// already decided within this batch (the underlying Store is not
    /// re-queried between decisions, so this is a pure in-memory pass).
    pub async fn dispatch_batch(&self, n: usize) -> EngineResult<Vec<DispatchDecision>> {
        let now = self.clock.utc_now();
        let mut ready_tasks: Vec<Task> = self.store.list_tasks().await?.into_iter().filter(|t| t.is_ready(now)).collect();
        ready_tasks.sort_by(task_dispatch_order);

        let agents = self.store.list_agents().await?;
        let mut used_agents = std::collections::HashSet::new();
        let mut decisions = Vec::new();

        for task in &ready_tasks {
            if decisions.len() >= n {
                break;
            }
            for agent in &agents {
                if used_agents.contains(&agent.id) {
                    continue;
                }
                if self.agent_can_take(agent, task, now).await? {
                    used_agents.insert(agent.id);
                    decisions.push(DispatchDecision { task_id: task.id, agent_id: agent.id });
                    break;
                }
            }
        }
        Ok(decisions)
    }

    async fn agent_can_take(&self, agent: &Agent, task: &Task, now: chrono::DateTime<chrono::Utc>) -> EngineResult<bool> {
        if !is_capable(agent, task) {
            return Ok(false);
        }
        if !agent.is_idle() {
            return Ok(false);
        }
        if !self.task_assignment.agent_has_capacity(&agent.id, agent.max_concurrent_tasks).await? {
            return Ok(false);
        }
        if let Some(executable) = &agent.provider {
            if self.rate_limits.is_limited(executable, now) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// priority ASC, deadline NULLS LAST, createdAt ASC.
fn task_dispatch_order(a: &Task, b: &Task) -> std::cmp::Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        })
        .then_with(|| a.meta.created_at.cmp(&b.meta.created_at))
}

/// Stewards are fired by cron/event, never by dispatch. A capable agent
/// otherwise carries every tag the task requires.
fn is_capable(agent: &Agent, task: &Task) -> bool {
    if agent.role() == AgentRole::Steward {
        return false;
    }
    task.meta.tags.iter().all(|tag| agent.meta.tags.contains(tag))
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
