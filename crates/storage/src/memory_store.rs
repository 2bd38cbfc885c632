// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `parking_lot`-guarded in-memory `Store`.

use async_trait::async_trait;
use parking_lot::RwLock;
use sf_core::{
    Agent, AgentId, CoreError, CoreResult, Document, DocumentId, Event, EventFilter, SessionId, SessionRecord, Store,
    Task, TaskId,
};
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryStore {
    tasks: RwLock<HashMap<String, Task>>,
    documents: RwLock<HashMap<String, Document>>,
    agents: RwLock<HashMap<String, Agent>>,
    sessions: RwLock<HashMap<String, SessionRecord>>,
    events: RwLock<Vec<Event>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_task(&self, id: &TaskId) -> CoreResult<Task> {
        self.tasks.read().get(id.as_str()).cloned().ok_or_else(|| CoreError::not_found("task", id.to_string()))
    }

    async fn put_task(&self, task: Task) -> CoreResult<()> {
        self.tasks.write().insert(task.id.to_string(), task);
        Ok(())
    }

    async fn list_tasks(&self) -> CoreResult<Vec<Task>> {
        Ok(self.tasks.read().values().cloned().collect())
    }

    async fn get_document(&self, id: &DocumentId) -> CoreResult<Document> {
        self.documents.read().get(id.as_str()).cloned().ok_or_else(|| CoreError::not_found("document", id.to_string()))
    }

    async fn put_document(&self, document: Document) -> CoreResult<()> {
        self.documents.write().insert(document.id.to_string(), document);
        Ok(())
    }

    async fn list_documents(&self) -> CoreResult<Vec<Document>> {
        Ok(self.documents.read().values().cloned().collect())
    }

    async fn get_agent(&self, id: &AgentId) -> CoreResult<Agent> {
        self.agents.read().get(id.as_str()).cloned().ok_or_else(|| CoreError::not_found("agent", id.to_string()))
    }

    async fn put_agent(&self, agent: Agent) -> CoreResult<()> {
        self.agents.write().insert(agent.id.to_string(), agent);
        Ok(())
    }

    async fn list_agents(&self) -> CoreResult<Vec<Agent>> {
        Ok(self.agents.read().values().cloned().collect())
    }

    async fn delete_agent(&self, id: &AgentId) -> CoreResult<()> {
        self.agents.write().remove(id.as_str());
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> CoreResult<SessionRecord> {
        self.sessions.read().get(id.as_str()).cloned().ok_or_else(|| CoreError::not_found("session", id.to_string()))
    }

    async fn put_session(&self, session: SessionRecord) -> CoreResult<()> {
        self.sessions.write().insert(session.id.to_string(), session);
        Ok(())
    }

    async fn list_sessions_for_agent(&self, agent_id: &AgentId) -> CoreResult<Vec<SessionRecord>> {
        let mut sessions: Vec<SessionRecord> =
            self.sessions.read().values().filter(|s| &s.agent_id == agent_id).cloned().collect();
        sessions.sort_by_key(|s| std::cmp::Reverse(s.created_at));
        Ok(sessions)
    }

    async fn append_event(&self, event: Event) -> CoreResult<()> {
        self.events.write().push(event);
        Ok(())
    }

    async fn query_events(&self, filter: &EventFilter) -> CoreResult<Vec<Event>> {
        let mut matched: Vec<Event> =
            self.events.read().iter().filter(|e| filter.matches(e)).cloned().collect();
        matched.sort_by_key(|e| e.created_at());
        Ok(matched)
    }
}

#[cfg(test)]
#[path = "memory_store_tests.rs"]
mod tests;
