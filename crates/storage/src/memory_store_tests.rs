// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sf_core::{EntityMeta, TaskStatus, TaskType};

fn ts(ms: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn sample_task(id: &str) -> Task {
    Task {
        meta: EntityMeta::new(id, "task", "system", ts(0)),
        id: TaskId::from_string(id),
        title: "Sample".into(),
        status: TaskStatus::Open,
        priority: 3,
        complexity: 1,
        task_type: TaskType::Task,
        description_ref: None,
        acceptance_criteria: None,
        close_reason: None,
        assignee: None,
        owner: None,
        deadline: None,
        scheduled_for: None,
        closed_at: None,
        deleted_at: None,
        deleted_by: None,
        delete_reason: None,
    }
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let store = MemoryStore::new();
    let task = sample_task("task-1");
    store.put_task(task.clone()).await.unwrap();
    let fetched = store.get_task(&task.id).await.unwrap();
    assert_eq!(fetched.title, task.title);
}

#[tokio::test]
async fn get_missing_task_is_not_found() {
    let store = MemoryStore::new();
    let err = store.get_task(&TaskId::from_string("nope")).await.unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[tokio::test]
async fn events_are_returned_in_created_at_order() {
    let store = MemoryStore::new();
    let id = TaskId::from_string("task-1");
    store.append_event(Event::TaskUpdated { id, updated_at: ts(200) }).await.unwrap();
    store.append_event(Event::TaskCreated { id, created_at: ts(100) }).await.unwrap();
    let events = store.query_events(&EventFilter::default()).await.unwrap();
    assert_eq!(events[0].created_at(), ts(100));
    assert_eq!(events[1].created_at(), ts(200));
}

#[tokio::test]
async fn delete_agent_removes_it_from_listing() {
    let store = MemoryStore::new();
    let agent = sf_core::Agent::builder().build();
    store.put_agent(agent.clone()).await.unwrap();
    assert_eq!(store.list_agents().await.unwrap().len(), 1);
    store.delete_agent(&agent.id).await.unwrap();
    assert!(store.list_agents().await.unwrap().is_empty());
}
