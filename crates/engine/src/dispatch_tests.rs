// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sf_core::{Agent, AgentId, AgentSessionStatus as SessionStatus, EntityMeta, FakeClock, RoleConfig, Task, TaskId, TaskStatus, TaskType, WorkerMode};
use sf_storage::MemoryStore;

fn worker(name: &str, max_concurrent_tasks: u32) -> Agent {
    let now = chrono::Utc::now();
    let id = AgentId::new();
    Agent {
        meta: EntityMeta::new(id.to_string(), "agent", "system", now),
        id,
        name: name.to_string(),
        role_config: RoleConfig::Worker { worker_mode: WorkerMode::Ephemeral },
        max_concurrent_tasks,
        session_status: SessionStatus::Idle,
        session_id: None,
        channel_id: None,
        provider: Some("fake".into()),
        model: None,
        reports_to: None,
    }
}

fn task(priority: u8) -> Task {
    let now = chrono::Utc::now();
    let id = TaskId::new();
    Task {
        meta: EntityMeta::new(id.to_string(), "task", "system", now),
        id,
        title: format!("task-p{priority}"),
        status: TaskStatus::Open,
        priority,
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
async fn dispatch_picks_highest_priority_ready_task_for_first_capable_agent() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();

    let low = task(3);
    let high = task(1);
    store.put_task(low.clone()).await.unwrap();
    store.put_task(high.clone()).await.unwrap();

    let agent = worker("worker-1", 1);
    store.put_agent(agent.clone()).await.unwrap();

    let dispatch = DispatchService::new(store, Arc::new(NoRateLimits), clock);
    let decision = dispatch.dispatch().await.unwrap().unwrap();
    assert_eq!(decision.task_id, high.id);
    assert_eq!(decision.agent_id, agent.id);
}

#[tokio::test]
async fn dispatch_batch_assigns_two_tasks_to_two_agents_leaving_the_third_unassigned() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();

    let p1 = task(1);
    let p2 = task(2);
    let p3 = task(3);
    for t in [&p1, &p2, &p3] {
        store.put_task(t.clone()).await.unwrap();
    }

    let a1 = worker("worker-1", 1);
    let a2 = worker("worker-2", 1);
    store.put_agent(a1.clone()).await.unwrap();
    store.put_agent(a2.clone()).await.unwrap();

    let dispatch = DispatchService::new(store, Arc::new(NoRateLimits), clock);
    let decisions = dispatch.dispatch_batch(10).await.unwrap();

    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].task_id, p1.id);
    assert_eq!(decisions[1].task_id, p2.id);
    let assigned_agents: std::collections::HashSet<_> = decisions.iter().map(|d| d.agent_id).collect();
    assert_eq!(assigned_agents, [a1.id, a2.id].into_iter().collect());
}

#[tokio::test]
async fn steward_agents_are_never_dispatch_candidates() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();

    let t = task(1);
    store.put_task(t.clone()).await.unwrap();

    let mut steward = worker("steward-1", 1);
    steward.role_config = RoleConfig::Steward { steward_focus: sf_core::StewardFocus::Merge, triggers: vec![] };
    store.put_agent(steward).await.unwrap();

    let dispatch = DispatchService::new(store, Arc::new(NoRateLimits), clock);
    assert!(dispatch.dispatch().await.unwrap().is_none());
}

#[tokio::test]
async fn rate_limited_executable_excludes_its_agents() {
    struct AlwaysLimited;
    impl RateLimitTracker for AlwaysLimited {
        fn is_limited(&self, _executable_path: &str, _now: chrono::DateTime<chrono::Utc>) -> bool {
            true
        }
    }

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();

    let t = task(1);
    store.put_task(t).await.unwrap();
    store.put_agent(worker("worker-1", 1)).await.unwrap();

    let dispatch = DispatchService::new(store, Arc::new(AlwaysLimited), clock);
    assert!(dispatch.dispatch().await.unwrap().is_none());
}

#[tokio::test]
async fn agent_at_capacity_is_skipped() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();

    let mut busy_task = task(5);
    busy_task.status = TaskStatus::InProgress;
    let agent = worker("worker-1", 1);
    busy_task.assignee = Some(agent.id);
    store.put_task(busy_task).await.unwrap();
    store.put_agent(agent.clone()).await.unwrap();

    let new_task = task(1);
    store.put_task(new_task.clone()).await.unwrap();

    let dispatch = DispatchService::new(store, Arc::new(NoRateLimits), clock);
    assert!(dispatch.dispatch().await.unwrap().is_none());
}
