// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steward Scheduler (§4.5): registers cron jobs and event subscriptions
//! per agent trigger, evaluates published events against subscriptions,
//! and drives steward execution with a timeout and a bounded history.

use super::condition;
use super::cron::CronSchedule;
use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use sf_core::{AgentId, Clock, Store, Trigger};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct StewardExecutionContext {
    pub agent_id: AgentId,
    pub trigger_event: Option<(String, serde_json::Value)>,
}

#[derive(Debug, Clone)]
pub struct StewardExecutionOutcome {
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
    pub items_processed: Option<u32>,
    pub duration_ms: u64,
    /// Set by `run_steward` after the executor returns, not by the executor
    /// itself: `true` only for a manually requested `executeSteward` (S7),
    /// `false` for cron and event triggers.
    pub manual: bool,
}

#[async_trait]
pub trait StewardExecutor: Send + Sync {
    async fn execute(&self, context: StewardExecutionContext) -> StewardExecutionOutcome;
}

struct EventSubscription {
    agent_id: AgentId,
    event_name: String,
    condition: Option<String>,
}

struct RegisteredSteward {
    agent_id: AgentId,
    cron_schedules: Vec<CronSchedule>,
    history: Mutex<VecDeque<StewardExecutionOutcome>>,
}

pub struct StewardScheduler<C: Clock> {
    store: Arc<dyn Store>,
    executor: Arc<dyn StewardExecutor>,
    clock: C,
    execution_timeout: Duration,
    history_capacity: usize,
    stewards: Mutex<HashMap<AgentId, Arc<RegisteredSteward>>>,
    subscriptions: Mutex<Vec<EventSubscription>>,
    running: AtomicBool,
}

impl<C: Clock> StewardScheduler<C> {
    pub fn new(store: Arc<dyn Store>, executor: Arc<dyn StewardExecutor>, clock: C) -> Self {
        Self {
            store,
            executor,
            clock,
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            stewards: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Reads the agent's triggers and installs one cron job per `cron`
    /// trigger and one subscription per `event` trigger. An unparsable
    /// cron expression is a no-op for that one job, not a hard failure.
    pub async fn register_steward(&self, agent_id: AgentId) -> EngineResult<()> {
        let agent = self.store.get_agent(&agent_id).await?;
        let triggers = match &agent.role_config {
            sf_core::RoleConfig::Steward { triggers, .. } => triggers.clone(),
            _ => {
                return Err(EngineError::Core(sf_core::CoreError::InvalidArguments {
                    message: format!("agent {agent_id} is not a steward"),
                }))
            }
        };

        let mut cron_schedules = Vec::new();
        for trigger in &triggers {
            match trigger {
                Trigger::Cron { schedule } => match CronSchedule::parse(schedule) {
                    Ok(parsed) => cron_schedules.push(parsed),
                    Err(reason) => {
                        tracing::warn!(agent_id = %agent_id, %schedule, %reason, "invalid cron expression, skipping job");
                    }
                },
                Trigger::Event { event, condition } => {
                    self.subscriptions.lock().push(EventSubscription {
                        agent_id,
                        event_name: event.clone(),
                        condition: condition.clone(),
                    });
                }
            }
        }

        self.stewards.lock().insert(
            agent_id,
            Arc::new(RegisteredSteward { agent_id, cron_schedules, history: Mutex::new(VecDeque::new()) }),
        );
        Ok(())
    }

    pub async fn register_all_stewards(&self) -> EngineResult<usize> {
        let agents = self.store.list_agents().await?;
        let mut count = 0;
        for agent in agents {
            if matches!(agent.role_config, sf_core::RoleConfig::Steward { .. }) {
                self.register_steward(agent.id).await?;
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn unregister_steward(&self, agent_id: &AgentId) {
        self.stewards.lock().remove(agent_id);
        self.subscriptions.lock().retain(|s| &s.agent_id != agent_id);
    }

    /// `start()`/`stop()` are idempotent no-ops on a scheduler already in
    /// that state. `start_immediately` controls whether `start()` also
    /// registers every steward currently in the `Store`.
    pub async fn start(&self, start_immediately: bool) -> EngineResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if start_immediately {
            self.register_all_stewards().await?;
        }
        Ok(())
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Next cron fire across all registered stewards, for a daemon driver
    /// loop to sleep until. `None` if nothing is registered.
    pub fn next_cron_fire(&self, now: chrono::DateTime<chrono::Utc>) -> Option<(AgentId, chrono::DateTime<chrono::Utc>)> {
        self.stewards
            .lock()
            .values()
            .flat_map(|s| s.cron_schedules.iter().filter_map(|c| c.next_fire(now)).map(|t| (s.agent_id, t)))
            .min_by_key(|(_, t)| *t)
    }

    /// Evaluates `name`/`payload` against every subscription, executing
    /// matching stewards asynchronously and returning the count triggered.
    pub async fn publish_event(&self, name: &str, payload: serde_json::Value) -> usize {
        let matching: Vec<AgentId> = self
            .subscriptions
            .lock()
            .iter()
            .filter(|s| s.event_name == name)
            .filter(|s| s.condition.as_deref().map_or(true, |c| condition::evaluate(c, &payload)))
            .map(|s| s.agent_id)
            .collect();

        for agent_id in &matching {
            let context = StewardExecutionContext { agent_id: *agent_id, trigger_event: Some((name.to_string(), payload.clone())) };
            self.run_steward(*agent_id, context, false).await;
        }
        matching.len()
    }

    /// Fires one steward's cron-triggered execution.
    pub async fn fire_cron(&self, agent_id: AgentId) {
        let context = StewardExecutionContext { agent_id, trigger_event: None };
        self.run_steward(agent_id, context, false).await;
    }

    /// Fires a steward on an operator's explicit request (S7): the history
    /// entry this produces is stamped `manual=true`, distinct from a cron or
    /// event trigger.
    pub async fn execute_steward(&self, agent_id: AgentId) -> EngineResult<()> {
        if !self.stewards.lock().contains_key(&agent_id) {
            return Err(EngineError::Core(sf_core::CoreError::not_found("steward", agent_id.to_string())));
        }
        let context = StewardExecutionContext { agent_id, trigger_event: None };
        self.run_steward(agent_id, context, true).await;
        Ok(())
    }

    async fn run_steward(&self, agent_id: AgentId, context: StewardExecutionContext, manual: bool) {
        let Some(steward) = self.stewards.lock().get(&agent_id).cloned() else { return };

        let _ = self
            .store
            .append_event(sf_core::Event::StewardExecutionStarted { agent_id, created_at: self.clock.utc_now() })
            .await;

        let mut outcome = match tokio::time::timeout(self.execution_timeout, self.executor.execute(context)).await {
            Ok(outcome) => outcome,
            Err(_) => StewardExecutionOutcome {
                success: false,
                output: None,
                error: Some(format!("execution timed out after {:?}", self.execution_timeout)),
                items_processed: None,
                duration_ms: self.execution_timeout.as_millis() as u64,
                manual,
            },
        };
        outcome.manual = manual;

        let now = self.clock.utc_now();
        if outcome.success {
            let _ = self.store.append_event(sf_core::Event::StewardExecutionCompleted { agent_id, success: true, updated_at: now }).await;
        } else {
            let _ = self
                .store
                .append_event(sf_core::Event::StewardExecutionFailed {
                    agent_id,
                    error: outcome.error.clone().unwrap_or_default(),
                    updated_at: now,
                })
                .await;
        }

        let mut history = steward.history.lock();
        if history.len() >= self.history_capacity {
            history.pop_front();
        }
        history.push_back(outcome);
    }

    pub fn history(&self, agent_id: &AgentId) -> Vec<StewardExecutionOutcome> {
        self.stewards.lock().get(agent_id).map(|s| s.history.lock().iter().cloned().collect()).unwrap_or_default()
    }
}

/// A `StewardExecutor` backed by a plain async closure, for tests and for
/// wiring a Session Manager–driven implementation without a second trait
/// impl per call site.
pub struct ClosureExecutor<F> {
    f: F,
}

impl<F, Fut> ClosureExecutor<F>
where
    F: Fn(StewardExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = StewardExecutionOutcome> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> StewardExecutor for ClosureExecutor<F>
where
    F: Fn(StewardExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = StewardExecutionOutcome> + Send,
{
    async fn execute(&self, context: StewardExecutionContext) -> StewardExecutionOutcome {
        (self.f)(context).await
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
