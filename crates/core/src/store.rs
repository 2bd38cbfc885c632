// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Store`: the external entity-CRUD and event-log collaborator.
//!
//! The storage engine itself is out of scope for the orchestration core;
//! this trait is the boundary the core depends on. `sf-storage` provides an
//! in-process reference implementation for tests and the demo binary.

use crate::agent::Agent;
use crate::document::Document;
use crate::error::CoreResult;
use crate::event::{Event, EventFilter};
use crate::id::{AgentId, DocumentId, SessionId, TaskId};
use crate::session::SessionRecord;
use crate::task::Task;
use async_trait::async_trait;

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_task(&self, id: &TaskId) -> CoreResult<Task>;
    async fn put_task(&self, task: Task) -> CoreResult<()>;
    async fn list_tasks(&self) -> CoreResult<Vec<Task>>;

    async fn get_document(&self, id: &DocumentId) -> CoreResult<Document>;
    async fn put_document(&self, document: Document) -> CoreResult<()>;
    async fn list_documents(&self) -> CoreResult<Vec<Document>>;

    async fn get_agent(&self, id: &AgentId) -> CoreResult<Agent>;
    async fn put_agent(&self, agent: Agent) -> CoreResult<()>;
    async fn list_agents(&self) -> CoreResult<Vec<Agent>>;
    async fn delete_agent(&self, id: &AgentId) -> CoreResult<()>;

    async fn get_session(&self, id: &SessionId) -> CoreResult<SessionRecord>;
    async fn put_session(&self, session: SessionRecord) -> CoreResult<()>;
    /// Sessions for one agent, most recently created first.
    async fn list_sessions_for_agent(&self, agent_id: &AgentId) -> CoreResult<Vec<SessionRecord>>;

    async fn append_event(&self, event: Event) -> CoreResult<()>;
    async fn query_events(&self, filter: &EventFilter) -> CoreResult<Vec<Event>>;
}
