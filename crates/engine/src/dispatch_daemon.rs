// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch Daemon (§4.7): drives the Dispatch Service on an interval,
//! starts sessions for each decision, and tracks per-executable rate-limit
//! backoff and per-session outcome metrics.

use crate::config::DaemonConfig;
use crate::dispatch::{DispatchService, RateLimitTracker};
use crate::error::EngineResult;
use crate::session_manager::SessionManager;
use crate::spawner::{Spawner, SpawnedSessionEvent};
use crate::task_assignment::TaskAssignment;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sf_core::{AgentId, Clock, SessionId, SpawnOptions, Store, TaskId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-executable `limitedUntil` tracker, fed by `rate_limited` events from
/// any session and consulted by the Dispatch Service.
#[derive(Default)]
pub struct ExecutableRateLimitTracker {
    limited_until: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl ExecutableRateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, executable_path: &str, resets_at: DateTime<Utc>) {
        let mut map = self.limited_until.lock();
        let entry = map.entry(executable_path.to_string()).or_insert(resets_at);
        if resets_at > *entry {
            *entry = resets_at;
        }
    }
}

impl RateLimitTracker for ExecutableRateLimitTracker {
    fn is_limited(&self, executable_path: &str, now: DateTime<Utc>) -> bool {
        self.limited_until.lock().get(executable_path).is_some_and(|until| now < *until)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SessionMetric {
    pub provider: String,
    pub session_id: SessionId,
    pub task_id: Option<TaskId>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub duration_ms: u64,
    pub outcome: SessionOutcome,
}

struct StartedSession {
    task_id: TaskId,
    agent_id: AgentId,
    provider: String,
    started_at: DateTime<Utc>,
    recorded_result: bool,
}

pub struct DispatchDaemon<C: Clock> {
    store: Arc<dyn Store>,
    dispatch: DispatchService<C>,
    task_assignment: TaskAssignment<C>,
    session_manager: Arc<SessionManager<C>>,
    spawner: Arc<Spawner<C>>,
    rate_limits: Arc<ExecutableRateLimitTracker>,
    clock: C,
    config: DaemonConfig,
    running: AtomicBool,
    cycle_lock: tokio::sync::Mutex<()>,
    metrics: Arc<Mutex<Vec<SessionMetric>>>,
    loop_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl<C: Clock> DispatchDaemon<C> {
    pub fn new(
        store: Arc<dyn Store>,
        session_manager: Arc<SessionManager<C>>,
        spawner: Arc<Spawner<C>>,
        rate_limits: Arc<ExecutableRateLimitTracker>,
        clock: C,
        config: DaemonConfig,
    ) -> Self {
        let dispatch = DispatchService::new(store.clone(), rate_limits.clone(), clock.clone());
        let task_assignment = TaskAssignment::new(store.clone(), clock.clone());
        Self {
            store,
            dispatch,
            task_assignment,
            session_manager,
            spawner,
            rate_limits,
            clock,
            config,
            running: AtomicBool::new(false),
            cycle_lock: tokio::sync::Mutex::new(()),
            metrics: Arc::new(Mutex::new(Vec::new())),
            loop_handle: Mutex::new(None),
        }
    }

    pub fn metrics(&self) -> Vec<SessionMetric> {
        self.metrics.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts the poll loop on the runtime. Idempotent: a second call while
    /// already running is a no-op.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let daemon = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(daemon.config.poll_interval);
            loop {
                interval.tick().await;
                if !daemon.running.load(Ordering::SeqCst) {
                    break;
                }
                let Ok(_guard) = daemon.cycle_lock.try_lock() else {
                    tracing::debug!("dispatch cycle still in flight, skipping this tick");
                    continue;
                };
                if let Err(error) = daemon.run_cycle().await {
                    tracing::warn!(%error, "dispatch cycle failed, continuing");
                }
            }
        });
        *self.loop_handle.lock() = Some(handle);
    }

    /// Signals the loop to stop and waits up to `shutdown_timeout` for any
    /// in-flight cycle to finish.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.cycle_lock.lock()).await;
        if let Some(handle) = self.loop_handle.lock().take() {
            handle.abort();
        }
    }

    /// One dispatch cycle: repeat `dispatch()` until it returns `None` or
    /// `max_per_tick` decisions have been started.
    async fn run_cycle(&self) -> EngineResult<()> {
        let mut started = 0;
        while started < self.config.max_per_tick {
            let Some(decision) = self.dispatch.dispatch().await? else { break };
            self.start_decision(decision.task_id, decision.agent_id).await;
            started += 1;
        }
        Ok(())
    }

    async fn start_decision(&self, task_id: TaskId, agent_id: AgentId) {
        let task = match self.store.get_task(&task_id).await {
            Ok(t) => t,
            Err(error) => {
                tracing::warn!(%task_id, %error, "task vanished before dispatch could start it");
                return;
            }
        };
        let agent = match self.store.get_agent(&agent_id).await {
            Ok(a) => a,
            Err(error) => {
                tracing::warn!(%agent_id, %error, "agent vanished before dispatch could start it");
                return;
            }
        };
        let provider = agent.provider.clone().unwrap_or_default();

        if let Err(error) = self.task_assignment.assign_to_agent(&task_id, agent_id).await {
            tracing::warn!(%task_id, %agent_id, %error, "failed to assign task, leaving it for the next tick");
            return;
        }
        if task.status == sf_core::TaskStatus::Open {
            if let Err(error) = self.task_assignment.start_task(&task_id).await {
                tracing::warn!(%task_id, %error, "failed to transition task to in_progress");
            }
        }

        let mut opts = SpawnOptions::new(task_working_directory(&task_id), std::path::PathBuf::from(".stoneforge"));
        opts.initial_prompt = Some(initial_prompt(&task));

        let record = match self.session_manager.start_session(agent_id, opts).await {
            Ok(record) => record,
            Err(error) => {
                tracing::warn!(%task_id, %agent_id, %error, "spawn failed, unassigning task");
                let _ = self.task_assignment.unassign_task(&task_id).await;
                return;
            }
        };

        tracing::info!(%task_id, %agent_id, session_id = %record.id, "dispatched session");

        let Some(mut events) = self.spawner.subscribe(&record.id) else { return };
        let session_id = record.id;
        let session_manager = self.session_manager.clone();
        let rate_limits = self.rate_limits.clone();
        let metrics = self.metrics.clone();
        let clock = self.clock.clone();
        let started_at = self.clock.utc_now();

        // Single listener task per session, torn down together on `Exit` or
        // bus closure so a session that never emits `result` cannot leak it.
        tokio::spawn(async move {
            let mut state = StartedSession { task_id, agent_id, provider, started_at, recorded_result: false };
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                };

                let _ = session_manager.apply_event(&session_id, &event).await;

                match &event {
                    SpawnedSessionEvent::Event(sf_core::AgentMessage::Result { is_error, usage }) => {
                        state.recorded_result = true;
                        let outcome = if *is_error { SessionOutcome::Failed } else { SessionOutcome::Completed };
                        push_metric(
                            &metrics,
                            &state,
                            session_id,
                            outcome,
                            usage.map(|u| u.input_tokens),
                            usage.map(|u| u.output_tokens),
                            clock.utc_now(),
                        );
                        let _ = session_manager.stop_session(&session_id, true).await;
                    }
                    SpawnedSessionEvent::RateLimited { executable_path, resets_at, .. } => {
                        rate_limits.record(executable_path, *resets_at);
                    }
                    SpawnedSessionEvent::Exit { code, .. } => {
                        if !state.recorded_result {
                            let outcome = if *code == Some(0) { SessionOutcome::Completed } else { SessionOutcome::Failed };
                            push_metric(&metrics, &state, session_id, outcome, None, None, clock.utc_now());
                        }
                        break;
                    }
                    _ => {}
                }
            }
        });
    }
}

fn task_working_directory(task_id: &TaskId) -> std::path::PathBuf {
    std::path::PathBuf::from(".stoneforge/.worktrees").join(task_id.to_string())
}

fn initial_prompt(task: &sf_core::Task) -> String {
    format!("Task {}: {}", task.id, task.title)
}

fn push_metric(
    metrics: &Arc<Mutex<Vec<SessionMetric>>>,
    state: &StartedSession,
    session_id: SessionId,
    outcome: SessionOutcome,
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
    finished_at: DateTime<Utc>,
) {
    let duration_ms = (finished_at - state.started_at).num_milliseconds().max(0) as u64;
    tracing::info!(
        task_id = %state.task_id,
        agent_id = %state.agent_id,
        %session_id,
        provider = %state.provider,
        duration_ms,
        ?outcome,
        "session finished"
    );
    metrics.lock().push(SessionMetric {
        provider: state.provider.clone(),
        session_id,
        task_id: Some(state.task_id),
        input_tokens,
        output_tokens,
        duration_ms,
        outcome,
    });
}

#[cfg(test)]
#[path = "dispatch_daemon_tests.rs"]
mod tests;
