// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Manager (§4.3): the durable front for the Spawner. Resolves
//! provider/model, persists `SessionRecord`s, and reacts to the spawner's
//! event bus to keep the Store in sync across restarts.

use crate::error::{EngineError, EngineResult};
use crate::spawner::{Spawner, SpawnedSessionEvent};
use sf_core::{
    AgentId, Clock, CoreError, SessionId, SessionRecord, SessionState, SpawnMode, SpawnOptions, Store,
};
use std::sync::Arc;

pub struct SessionManager<C: Clock> {
    store: Arc<dyn Store>,
    spawner: Arc<Spawner<C>>,
    clock: C,
}

impl<C: Clock> SessionManager<C> {
    pub fn new(store: Arc<dyn Store>, spawner: Arc<Spawner<C>>, clock: C) -> Self {
        Self { store, spawner, clock }
    }

    /// Starts a new session for `agent_id`. Fails with `Capacity`/
    /// `SessionBusy` if the agent already holds a live session.
    pub async fn start_session(&self, agent_id: AgentId, mut opts: SpawnOptions) -> EngineResult<SessionRecord> {
        let agent = self.store.get_agent(&agent_id).await?;
        let existing = self.store.list_sessions_for_agent(&agent_id).await?;
        if existing.iter().any(|s| s.is_live()) {
            return Err(EngineError::Core(CoreError::Capacity {
                agent_id: agent_id.to_string(),
                reason: sf_core::CapacityReason::SessionBusy,
            }));
        }

        if opts.model.is_none() {
            opts.model = agent.model.clone();
        }
        let provider_name = agent.provider.clone().ok_or_else(|| {
            EngineError::Core(CoreError::InvalidArguments { message: format!("agent {agent_id} has no provider configured") })
        })?;

        let spawn_mode = if agent.role() == sf_core::AgentRole::Director { SpawnMode::Interactive } else { SpawnMode::Headless };

        let now = self.clock.utc_now();
        let mut record = SessionRecord::new(agent_id, agent.role(), spawn_mode, opts.working_directory.clone(), now);
        self.store.put_session(record.clone()).await?;

        match spawn_mode {
            SpawnMode::Headless => self.spawner.spawn_headless(record.id, &provider_name, opts)?,
            SpawnMode::Interactive => {
                return Err(EngineError::Core(CoreError::Fatal {
                    message: "interactive spawn is driven by the provider's PTY adapter, not the headless spawner".into(),
                }))
            }
        }

        Ok(record)
    }

    /// Resumes the agent's most recent non-terminated session. If the
    /// provider reports the session is unknown, marks the record terminated
    /// and surfaces `InvalidResume`.
    pub async fn resume_session(&self, agent_id: AgentId) -> EngineResult<SessionRecord> {
        let sessions = self.store.list_sessions_for_agent(&agent_id).await?;
        let mut record = sessions
            .into_iter()
            .find(|s| s.state != SessionState::Terminated)
            .ok_or_else(|| EngineError::Core(CoreError::not_found("session", format!("for agent {agent_id}"))))?;

        let now = self.clock.utc_now();
        match &record.provider_session_id {
            Some(_) => {
                record.transition(SessionState::Running, now)?;
                self.store.put_session(record.clone()).await?;
                Ok(record)
            }
            None => {
                record.transition(SessionState::Terminated, now)?;
                self.store.put_session(record.clone()).await?;
                Err(EngineError::Core(CoreError::InvalidResume {
                    session_id: record.id.to_string(),
                    reason: "provider never announced a session id".into(),
                }))
            }
        }
    }

    pub async fn stop_session(&self, session_id: &SessionId, graceful: bool) -> EngineResult<SessionRecord> {
        let mut record = self.store.get_session(session_id).await?;
        let now = self.clock.utc_now();
        record.transition(SessionState::Terminating, now)?;
        self.store.put_session(record.clone()).await?;

        if graceful {
            let _ = self.spawner.interrupt(session_id).await;
        }
        record.transition(SessionState::Terminated, self.clock.utc_now())?;
        self.store.put_session(record.clone()).await?;
        Ok(record)
    }

    /// Forwards one message for a headless session; interactive sessions
    /// reject (they take input via the PTY, not structured messages).
    pub async fn message_session(&self, session_id: &SessionId, message: &str) -> EngineResult<()> {
        let record = self.store.get_session(session_id).await?;
        if record.spawn_mode != SpawnMode::Headless {
            return Err(EngineError::Core(CoreError::InvalidArguments {
                message: "interactive sessions do not accept structured messages".into(),
            }));
        }
        self.spawner.send_message(session_id, message).await
    }

    /// Applies one spawner-bus event to the persisted record. Called by the
    /// daemon's per-session event loop; kept here so the Store stays the
    /// single source of truth for session state across restarts.
    pub async fn apply_event(&self, session_id: &SessionId, event: &SpawnedSessionEvent) -> EngineResult<()> {
        let mut record = self.store.get_session(session_id).await?;
        let now = self.clock.utc_now();
        match event {
            SpawnedSessionEvent::ProviderSessionId(id) => {
                record.provider_session_id = Some(id.clone());
                record.transition(SessionState::Running, now)?;
            }
            SpawnedSessionEvent::Exit { .. } => {
                if record.state != SessionState::Terminated {
                    record.transition(SessionState::Terminated, now)?;
                }
            }
            _ => {}
        }
        self.store.put_session(record).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_manager_tests.rs"]
mod tests;
