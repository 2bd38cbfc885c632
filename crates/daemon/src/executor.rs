// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production `StewardExecutor`: starts a headless session for the
//! steward's agent and waits for it to exit, grounded on the same
//! `SessionManager`/`Spawner` pair the Dispatch Daemon drives sessions
//! through.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use sf_core::{AgentMessage, Clock, SpawnOptions};
use sf_engine::{SessionManager, Spawner, SpawnedSessionEvent, StewardExecutionContext, StewardExecutionOutcome, StewardExecutor};

pub struct SessionStewardExecutor<C: Clock> {
    sessions: Arc<SessionManager<C>>,
    spawner: Arc<Spawner<C>>,
    stoneforge_root: std::path::PathBuf,
}

impl<C: Clock> SessionStewardExecutor<C> {
    pub fn new(sessions: Arc<SessionManager<C>>, spawner: Arc<Spawner<C>>, stoneforge_root: std::path::PathBuf) -> Self {
        Self { sessions, spawner, stoneforge_root }
    }
}

#[async_trait]
impl<C: Clock> StewardExecutor for SessionStewardExecutor<C> {
    async fn execute(&self, context: StewardExecutionContext) -> StewardExecutionOutcome {
        let started = Instant::now();
        let prompt = context.trigger_event.as_ref().map(|(name, payload)| format!("triggered by event `{name}`: {payload}"));
        let mut opts = SpawnOptions::new(self.stoneforge_root.clone(), self.stoneforge_root.clone());
        if let Some(prompt) = prompt {
            opts = opts.initial_prompt(prompt);
        }

        let record = match self.sessions.start_session(context.agent_id, opts).await {
            Ok(record) => record,
            Err(error) => {
                return StewardExecutionOutcome {
                    success: false,
                    output: None,
                    error: Some(error.to_string()),
                    items_processed: None,
                    duration_ms: started.elapsed().as_millis() as u64,
                    manual: false,
                }
            }
        };

        let Some(mut events) = self.spawner.subscribe(&record.id) else {
            return StewardExecutionOutcome {
                success: false,
                output: None,
                error: Some("session vanished before it could be observed".into()),
                items_processed: None,
                duration_ms: started.elapsed().as_millis() as u64,
                manual: false,
            };
        };

        let mut output = String::new();
        let mut success = true;
        let mut error = None;
        loop {
            let Ok(event) = events.recv().await else { break };
            let _ = self.sessions.apply_event(&record.id, &event).await;
            match event {
                SpawnedSessionEvent::Event(AgentMessage::AssistantText { text }) => {
                    if !output.is_empty() {
                        output.push('\n');
                    }
                    output.push_str(&text);
                }
                SpawnedSessionEvent::Event(AgentMessage::Result { is_error, .. }) => success = !is_error,
                SpawnedSessionEvent::Event(AgentMessage::Error { message }) | SpawnedSessionEvent::Error(message) => {
                    success = false;
                    error = Some(message);
                }
                SpawnedSessionEvent::RateLimited { message, .. } => {
                    success = false;
                    error = Some(message);
                }
                SpawnedSessionEvent::Exit { code, .. } => {
                    if let Some(code) = code {
                        success &= code == 0;
                    }
                    break;
                }
                _ => {}
            }
        }

        StewardExecutionOutcome {
            success,
            output: if output.is_empty() { None } else { Some(output) },
            error,
            items_processed: None,
            duration_ms: started.elapsed().as_millis() as u64,
            manual: false,
        }
    }
}
