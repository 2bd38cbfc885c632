// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawner (§4.4): supervises one provider child per session id and fans
//! its lifecycle out onto a per-session event bus. Does not mutate task
//! status — `check_ready_queue` (the UWP check, §4.4.5) only reads.

use crate::error::{EngineError, EngineResult};
use parking_lot::Mutex;
use sf_adapters::rate_limit;
use sf_core::{AgentId, AgentMessage, Clock, ProviderRegistry, SessionId, SpawnOptions, Task};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Default spawn-init timeout (§4.4.1/§5): how long the spawner waits for
/// the provider's initial `system/init` event before failing the spawn.
pub const DEFAULT_SPAWN_INIT_TIMEOUT: Duration = Duration::from_secs(120);

/// How long a terminated session's entry lingers in `sessions` before it is
/// removed (§4.4.2), giving late subscribers/queries a grace window.
const SESSION_CLEANUP_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum SpawnedSessionEvent {
    Event(AgentMessage),
    PtyData(String),
    ProviderSessionId(String),
    RateLimited { executable_path: String, resets_at: chrono::DateTime<chrono::Utc>, message: String },
    ResumeFailed { reason: String, message: String },
    Interrupt,
    Error(String),
    Exit { code: Option<i32>, signal: Option<i32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerState {
    Starting,
    Running,
    Suspended,
    Terminated,
}

enum SpawnerCommand {
    SendMessage(String),
    Interrupt,
    Close,
}

struct SessionEntry {
    bus: broadcast::Sender<SpawnedSessionEvent>,
    state: Mutex<SpawnerState>,
    cmd_tx: mpsc::Sender<SpawnerCommand>,
}

/// Injected by the caller of `check_ready_queue`; returns ready tasks for
/// one agent sorted however the caller likes (the spawner re-sorts by
/// priority before picking the top one).
pub trait ReadyTaskSource: Send + Sync {
    fn get_ready_tasks<'a>(
        &'a self,
        agent_id: AgentId,
        limit: usize,
    ) -> std::pin::Pin<Box<dyn Future<Output = EngineResult<Vec<Task>>> + Send + 'a>>;
}

pub struct Spawner<C: Clock> {
    providers: Arc<dyn ProviderRegistry>,
    clock: C,
    sessions: Arc<Mutex<HashMap<SessionId, Arc<SessionEntry>>>>,
    init_timeout: Duration,
}

impl<C: Clock> Spawner<C> {
    pub fn new(providers: Arc<dyn ProviderRegistry>, clock: C) -> Self {
        Self {
            providers,
            clock,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            init_timeout: DEFAULT_SPAWN_INIT_TIMEOUT,
        }
    }

    /// Overrides the default 120s spawn-init timeout, typically from
    /// `DaemonConfig::spawn_init_timeout`.
    pub fn with_init_timeout(mut self, init_timeout: Duration) -> Self {
        self.init_timeout = init_timeout;
        self
    }

    /// Removes a terminated session's entry from `sessions` after the
    /// grace delay, off the caller's path.
    fn schedule_cleanup(sessions: Arc<Mutex<HashMap<SessionId, Arc<SessionEntry>>>>, session_id: SessionId) {
        tokio::spawn(async move {
            tokio::time::sleep(SESSION_CLEANUP_DELAY).await;
            sessions.lock().remove(&session_id);
        });
    }

    pub fn subscribe(&self, session_id: &SessionId) -> Option<broadcast::Receiver<SpawnedSessionEvent>> {
        self.sessions.lock().get(session_id).map(|entry| entry.bus.subscribe())
    }

    pub fn state(&self, session_id: &SessionId) -> Option<SpawnerState> {
        self.sessions.lock().get(session_id).map(|entry| *entry.state.lock())
    }

    /// Spawns a headless session and returns immediately; the driver task
    /// runs in the background and publishes events on the session's bus.
    pub fn spawn_headless(&self, session_id: SessionId, provider_name: &str, opts: SpawnOptions) -> EngineResult<()> {
        let provider = self
            .providers
            .headless(provider_name)
            .ok_or_else(|| EngineError::Provider(sf_core::ProviderError::Unavailable(provider_name.to_string())))?;

        let (bus_tx, _) = broadcast::channel(256);
        let (cmd_tx, mut cmd_rx) = mpsc::channel(16);
        let entry = Arc::new(SessionEntry { bus: bus_tx.clone(), state: Mutex::new(SpawnerState::Starting), cmd_tx });
        self.sessions.lock().insert(session_id, entry.clone());

        // `provider.spawn` is an `&self` call against a trait object owned by
        // the registry; the registry outlives the daemon process, so the
        // driver task holds a raw borrow is not possible across `tokio::spawn`
        // without 'static data. Callers construct `Spawner` with a registry
        // behind `Arc`, so we clone the `Arc` rather than the borrowed ref.
        let providers = self.providers.clone();
        let provider_name = provider_name.to_string();
        let clock = self.clock.clone();
        let state_entry = entry.clone();
        let executable_path = provider_name.clone();
        let sessions = self.sessions.clone();
        let init_timeout = self.init_timeout;

        tokio::spawn(async move {
            let Some(provider) = providers.headless(&provider_name) else {
                let _ = bus_tx.send(SpawnedSessionEvent::Error("provider vanished".into()));
                *state_entry.state.lock() = SpawnerState::Terminated;
                Self::schedule_cleanup(sessions, session_id);
                return;
            };
            let mut session = match provider.spawn(opts).await {
                Ok(s) => s,
                Err(e) => {
                    let _ = bus_tx.send(SpawnedSessionEvent::Error(e.to_string()));
                    let _ = bus_tx.send(SpawnedSessionEvent::Exit { code: None, signal: None });
                    *state_entry.state.lock() = SpawnerState::Terminated;
                    Self::schedule_cleanup(sessions, session_id);
                    return;
                }
            };

            // Wait for the provider's `system/init` event before entering the
            // steady-state loop; a hung provider that never emits it fails the
            // spawn instead of leaving the session stuck forever.
            let init_deadline = tokio::time::sleep(init_timeout);
            tokio::pin!(init_deadline);
            loop {
                tokio::select! {
                    _ = &mut init_deadline => {
                        let _ = bus_tx.send(SpawnedSessionEvent::Error(format!(
                            "no system/init event within {init_timeout:?}"
                        )));
                        let _ = session.close().await;
                        *state_entry.state.lock() = SpawnerState::Terminated;
                        let _ = bus_tx.send(SpawnedSessionEvent::Exit { code: None, signal: None });
                        Self::schedule_cleanup(sessions, session_id);
                        return;
                    }
                    cmd = cmd_rx.recv() => {
                        match cmd {
                            Some(SpawnerCommand::SendMessage(msg)) => {
                                let _ = session.send_message(&msg).await;
                            }
                            Some(SpawnerCommand::Interrupt) => {
                                let _ = session.interrupt().await;
                                let _ = bus_tx.send(SpawnedSessionEvent::Interrupt);
                            }
                            Some(SpawnerCommand::Close) | None => {
                                let _ = session.close().await;
                                *state_entry.state.lock() = SpawnerState::Terminated;
                                let _ = bus_tx.send(SpawnedSessionEvent::Exit { code: None, signal: None });
                                Self::schedule_cleanup(sessions, session_id);
                                return;
                            }
                        }
                    }
                    message = session.recv() => {
                        let Some(message) = message else {
                            *state_entry.state.lock() = SpawnerState::Terminated;
                            let _ = bus_tx.send(SpawnedSessionEvent::Exit { code: None, signal: None });
                            Self::schedule_cleanup(sessions, session_id);
                            return;
                        };
                        if let AgentMessage::SystemInit { session_id: provider_session_id } = &message {
                            *state_entry.state.lock() = SpawnerState::Running;
                            let _ = bus_tx.send(SpawnedSessionEvent::ProviderSessionId(provider_session_id.clone()));
                            let _ = bus_tx.send(SpawnedSessionEvent::Event(message));
                            break;
                        }
                        let _ = bus_tx.send(SpawnedSessionEvent::Event(message));
                    }
                }
            }

            loop {
                tokio::select! {
                    cmd = cmd_rx.recv() => {
                        match cmd {
                            Some(SpawnerCommand::SendMessage(msg)) => {
                                let _ = session.send_message(&msg).await;
                            }
                            Some(SpawnerCommand::Interrupt) => {
                                let _ = session.interrupt().await;
                                let _ = bus_tx.send(SpawnedSessionEvent::Interrupt);
                            }
                            Some(SpawnerCommand::Close) | None => {
                                let _ = session.close().await;
                                *state_entry.state.lock() = SpawnerState::Terminated;
                                let _ = bus_tx.send(SpawnedSessionEvent::Exit { code: None, signal: None });
                                Self::schedule_cleanup(sessions, session_id);
                                break;
                            }
                        }
                    }
                    message = session.recv() => {
                        let Some(message) = message else {
                            *state_entry.state.lock() = SpawnerState::Terminated;
                            let _ = bus_tx.send(SpawnedSessionEvent::Exit { code: None, signal: None });
                            Self::schedule_cleanup(sessions, session_id);
                            break;
                        };
                        if let AgentMessage::AssistantText { text } = &message {
                            if let Some(signal) = rate_limit::detect(&executable_path, text, clock.utc_now()) {
                                let _ = bus_tx.send(SpawnedSessionEvent::RateLimited {
                                    executable_path: signal.executable_path,
                                    resets_at: signal.resets_at,
                                    message: signal.message,
                                });
                            }
                        }
                        let is_terminal_result = matches!(&message, AgentMessage::Result { .. });
                        let is_error_result = matches!(&message, AgentMessage::Result { is_error: true, .. });
                        let _ = bus_tx.send(SpawnedSessionEvent::Event(message));
                        if is_terminal_result {
                            let _ = session.close().await;
                            *state_entry.state.lock() = SpawnerState::Terminated;
                            let code = if is_error_result { 1 } else { 0 };
                            let _ = bus_tx.send(SpawnedSessionEvent::Exit { code: Some(code), signal: None });
                            Self::schedule_cleanup(sessions, session_id);
                            break;
                        }
                    }
                }
            }
        });

        Ok(())
    }

    pub async fn send_message(&self, session_id: &SessionId, message: &str) -> EngineResult<()> {
        let entry = self.entry(session_id)?;
        entry
            .cmd_tx
            .send(SpawnerCommand::SendMessage(message.to_string()))
            .await
            .map_err(|_| EngineError::SessionGone(session_id.to_string()))
    }

    pub async fn interrupt(&self, session_id: &SessionId) -> EngineResult<()> {
        let entry = self.entry(session_id)?;
        entry
            .cmd_tx
            .send(SpawnerCommand::Interrupt)
            .await
            .map_err(|_| EngineError::SessionGone(session_id.to_string()))
    }

    /// Closes the child while retaining the in-process record in
    /// `suspended`; only valid from `Running`.
    pub async fn suspend(&self, session_id: &SessionId) -> EngineResult<()> {
        let entry = self.entry(session_id)?;
        if *entry.state.lock() != SpawnerState::Running {
            return Err(EngineError::Core(sf_core::CoreError::invalid_status(
                format!("{:?}", *entry.state.lock()),
                "suspended",
                vec!["running".into()],
            )));
        }
        let _ = entry.cmd_tx.send(SpawnerCommand::Close).await;
        *entry.state.lock() = SpawnerState::Suspended;
        Ok(())
    }

    fn entry(&self, session_id: &SessionId) -> EngineResult<Arc<SessionEntry>> {
        self.sessions
            .lock()
            .get(session_id)
            .cloned()
            .ok_or_else(|| EngineError::Core(sf_core::CoreError::not_found("session", session_id.to_string())))
    }

    /// UWP check (§4.4.5): returns the highest-priority ready task for the
    /// agent, without mutating anything. `autoStart` is the caller's concern.
    pub async fn check_ready_queue(
        &self,
        agent_id: AgentId,
        limit: usize,
        source: &dyn ReadyTaskSource,
    ) -> EngineResult<Option<Task>> {
        let mut tasks = source.get_ready_tasks(agent_id, limit).await?;
        tasks.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| match (a.deadline, b.deadline) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.meta.created_at.cmp(&b.meta.created_at))
        });
        Ok(tasks.into_iter().next())
    }
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
