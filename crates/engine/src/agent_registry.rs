// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Registry (§4.1): create/lookup/update agent entities, per-agent
//! channel allocation, enumeration by role.

use crate::error::{EngineError, EngineResult};
use parking_lot::Mutex;
use sf_core::{
    Agent, AgentId, AgentRole, AgentSessionStatus as SessionStatus, Clock, CoreError, EntityMeta, RoleConfig, Store,
    StewardFocus, Trigger, WorkerMode,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Tracks which (name, role) pairs are already registered and holds one
/// durable message channel per agent, independent of the Store's own
/// persistence (channel allocation is process-local).
pub struct AgentRegistry<C: Clock> {
    store: Arc<dyn Store>,
    clock: C,
    by_name_role: Mutex<HashMap<(String, AgentRole), AgentId>>,
    channels: Mutex<HashMap<AgentId, tokio::sync::mpsc::Sender<serde_json::Value>>>,
    active_sessions: Mutex<std::collections::HashSet<AgentId>>,
}

impl<C: Clock> AgentRegistry<C> {
    pub fn new(store: Arc<dyn Store>, clock: C) -> Self {
        Self {
            store,
            clock,
            by_name_role: Mutex::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
            active_sessions: Mutex::new(std::collections::HashSet::new()),
        }
    }

    async fn register(&self, name: &str, role_config: RoleConfig) -> EngineResult<AgentId> {
        let role = role_config.role();
        let key = (name.to_string(), role);
        if self.by_name_role.lock().contains_key(&key) {
            return Err(EngineError::Core(CoreError::already_exists("agent", format!("{name}:{role:?}"))));
        }
        let now = self.clock.utc_now();
        let id = AgentId::new();
        let agent = Agent {
            meta: EntityMeta::new(id.to_string(), "agent", "system", now),
            id,
            name: name.to_string(),
            role_config,
            max_concurrent_tasks: 1,
            session_status: SessionStatus::Idle,
            session_id: None,
            channel_id: None,
            provider: None,
            model: None,
            reports_to: None,
        };
        self.store.put_agent(agent).await?;
        self.by_name_role.lock().insert(key, id);
        let (tx, _rx) = tokio::sync::mpsc::channel(64);
        self.channels.lock().insert(id, tx);
        Ok(id)
    }

    pub async fn register_director(&self, name: &str) -> EngineResult<AgentId> {
        self.register(name, RoleConfig::Director).await
    }

    pub async fn register_worker(&self, name: &str, worker_mode: WorkerMode) -> EngineResult<AgentId> {
        self.register(name, RoleConfig::Worker { worker_mode }).await
    }

    pub async fn register_steward(&self, name: &str, focus: StewardFocus, triggers: Vec<Trigger>) -> EngineResult<AgentId> {
        self.register(name, RoleConfig::Steward { steward_focus: focus, triggers }).await
    }

    pub async fn get_agent(&self, id: &AgentId) -> EngineResult<Agent> {
        Ok(self.store.get_agent(id).await?)
    }

    pub async fn list_agents(&self) -> EngineResult<Vec<Agent>> {
        Ok(self.store.list_agents().await?)
    }

    pub async fn get_agents_by_role(&self, role: AgentRole) -> EngineResult<Vec<Agent>> {
        Ok(self.store.list_agents().await?.into_iter().filter(|a| a.role() == role).collect())
    }

    pub async fn update_session_status(&self, id: &AgentId, status: SessionStatus) -> EngineResult<()> {
        let mut agent = self.store.get_agent(id).await?;
        agent.session_status = status;
        agent.meta.touch(self.clock.utc_now());
        if status == SessionStatus::Running {
            self.active_sessions.lock().insert(*id);
        } else {
            self.active_sessions.lock().remove(id);
        }
        Ok(self.store.put_agent(agent).await?)
    }

    pub async fn update_metadata(&self, id: &AgentId, key: String, value: serde_json::Value) -> EngineResult<()> {
        let mut agent = self.store.get_agent(id).await?;
        agent.meta.metadata.insert(key, value);
        agent.meta.touch(self.clock.utc_now());
        Ok(self.store.put_agent(agent).await?)
    }

    pub async fn delete_agent(&self, id: &AgentId) -> EngineResult<()> {
        if self.active_sessions.lock().contains(id) {
            return Err(EngineError::AgentBusy(id.to_string()));
        }
        self.by_name_role.lock().retain(|_, v| v != id);
        self.channels.lock().remove(id);
        Ok(self.store.delete_agent(id).await?)
    }

    pub fn get_agent_channel(&self, id: &AgentId) -> Option<tokio::sync::mpsc::Sender<serde_json::Value>> {
        self.channels.lock().get(id).cloned()
    }
}

#[cfg(test)]
#[path = "agent_registry_tests.rs"]
mod tests;
