// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level integration tests exercising SPEC_FULL.md §8's testable
//! properties across crate boundaries (unit-level checks for the same
//! invariants live beside their modules as `*_tests.rs`).

use std::sync::Arc;

use sf_core::{
    Agent, AgentRole, ContentType, CoreError, Document, DocumentCategory, DocumentStatus, EntityMeta, FakeClock,
    RoleConfig, SessionStatus, Store, Task, TaskId, TaskStatus, TaskType, WorkerMode,
};
use sf_engine::dispatch::{DispatchService, NoRateLimits};
use sf_engine::dispatch_daemon::ExecutableRateLimitTracker;
use sf_engine::spawner::{Spawner, SpawnedSessionEvent, SpawnerState};
use sf_engine::steward::{StewardExecutionContext, StewardExecutionOutcome, StewardExecutor, StewardScheduler};
use sf_engine::{AgentRegistry, TaskAssignment};
use sf_storage::{MemorySettings, MemoryStore};

fn new_task(id: TaskId, title: &str, status: TaskStatus, now: chrono::DateTime<chrono::Utc>) -> Task {
    Task {
        meta: EntityMeta::new(id.to_string(), "task", "system", now),
        id,
        title: title.to_string(),
        status,
        priority: 3,
        complexity: 3,
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

fn new_document(content: &str, now: chrono::DateTime<chrono::Utc>) -> Document {
    let id = sf_core::DocumentId::new();
    Document {
        meta: EntityMeta::new(id.to_string(), "document", "system", now),
        id,
        content_type: ContentType::Markdown,
        content: content.to_string(),
        version: 1,
        previous_version_id: None,
        category: DocumentCategory::Note,
        status: DocumentStatus::Active,
        immutable: false,
    }
}

/// Invariant 1: `previousVersionId.is_some() <=> version > 1`.
#[test]
fn document_version_chain_biconditional() {
    let now = FakeClock::new().utc_now();
    let mut doc = new_document("first draft", now);
    assert_eq!(doc.version, 1);
    assert!(doc.previous_version_id.is_none());

    doc.update_content("second draft".into(), now).unwrap();
    assert_eq!(doc.version, 2);
    assert!(doc.previous_version_id.is_some());
    assert_eq!(doc.previous_version_id, Some(doc.id));

    doc.update_content("third draft".into(), now).unwrap();
    assert_eq!(doc.version, 3);
    // Chain root stays pinned to the first version, not the immediate predecessor.
    assert_eq!(doc.previous_version_id, Some(doc.id));
}

/// Invariant 2: `closedAt.is_some() <=> status == Closed`.
#[test]
fn task_closed_at_biconditional() {
    let now = FakeClock::new().utc_now();
    let mut task = new_task(TaskId::new(), "ship it", TaskStatus::Open, now);
    assert!(task.closed_at.is_none());

    task.transition_status(TaskStatus::InProgress, now).unwrap();
    assert!(task.closed_at.is_none());

    task.close(Some("done".into()), now).unwrap();
    assert!(task.closed_at.is_some());
    assert_eq!(task.status, TaskStatus::Closed);

    task.reopen(now).unwrap();
    assert!(task.closed_at.is_none());
}

/// Invariant 3: only transitions in `allowed_transitions` succeed.
#[test]
fn task_status_transition_table_is_enforced() {
    let now = FakeClock::new().utc_now();
    let mut task = new_task(TaskId::new(), "x", TaskStatus::Closed, now);
    let result = task.transition_status(TaskStatus::Review, now);
    assert!(matches!(result, Err(CoreError::InvalidStatus { .. })));

    // Closed -> Open is explicitly allowed (reopen path).
    task.transition_status(TaskStatus::Open, now).unwrap();
    assert_eq!(task.status, TaskStatus::Open);
}

/// Invariant 10: transitioning a task to its current status is a no-op
/// that still succeeds (idempotent).
#[test]
fn status_transition_to_current_status_is_idempotent() {
    let now = FakeClock::new().utc_now();
    let mut task = new_task(TaskId::new(), "x", TaskStatus::InProgress, now);
    task.transition_status(TaskStatus::InProgress, now).unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
    assert!(task.closed_at.is_none());

    // Closed -> Closed must not disturb the original closedAt timestamp.
    let mut task = new_task(TaskId::new(), "x", TaskStatus::Open, now);
    task.close(Some("done".into()), now).unwrap();
    let closed_at = task.closed_at;
    assert!(closed_at.is_some());
    let later = now + chrono::Duration::seconds(60);
    task.transition_status(TaskStatus::Closed, later).unwrap();
    assert_eq!(task.status, TaskStatus::Closed);
    assert_eq!(task.closed_at, closed_at, "same-status transition must not overwrite closedAt");
}

/// Invariant 12: the steward condition evaluator rejects every injection
/// pattern and evaluates to `false` rather than erroring.
#[test]
fn condition_evaluator_sandboxes_injection_patterns() {
    let payload = serde_json::json!({ "task": { "status": "open" } });
    let dangerous = [
        "task.status = 'closed'",
        "eval('1')",
        "(function(){return true})()",
        "new Function('return true')()",
        "process.exit(1)",
        "require('fs')",
        "task.status; true",
        "`${task.status}`",
    ];
    for expr in dangerous {
        assert!(!sf_engine::steward::condition::evaluate(expr, &payload), "expected {expr:?} to evaluate false");
    }
    // A legitimate comparison still works, proving the sandbox isn't just
    // failing everything.
    assert!(sf_engine::steward::condition::evaluate("task.status == 'open'", &payload));
}

/// Invariant 4: an agent's workload never counted as ready for dispatch
/// past its `maxConcurrentTasks`.
#[tokio::test]
async fn workload_respects_max_concurrent_tasks() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();
    let registry = AgentRegistry::new(store.clone(), clock.clone());
    let tasks = TaskAssignment::new(store.clone(), clock.clone());

    let agent_id = registry.register_worker("worker-1", WorkerMode::Ephemeral).await.unwrap();

    let now = clock.utc_now();
    for i in 0..2 {
        let mut task = new_task(TaskId::new(), &format!("task-{i}"), TaskStatus::Open, now);
        task.assignee = Some(agent_id);
        store.put_task(task).await.unwrap();
    }

    assert_eq!(tasks.get_agent_workload(&agent_id).await.unwrap(), 2);
    assert!(!tasks.agent_has_capacity(&agent_id, 2).await.unwrap());
    assert!(tasks.agent_has_capacity(&agent_id, 3).await.unwrap());
}

/// A closed task stops counting toward workload immediately.
#[tokio::test]
async fn closing_a_task_frees_agent_capacity() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();
    let tasks = TaskAssignment::new(store.clone(), clock.clone());

    let agent_id = sf_core::AgentId::new();
    let now = clock.utc_now();
    let mut task = new_task(TaskId::new(), "only task", TaskStatus::InProgress, now);
    task.assignee = Some(agent_id);
    let task_id = task.id;
    store.put_task(task).await.unwrap();

    assert_eq!(tasks.get_agent_workload(&agent_id).await.unwrap(), 1);
    tasks.close_task(&task_id, Some("done".into())).await.unwrap();
    assert_eq!(tasks.get_agent_workload(&agent_id).await.unwrap(), 0);
}

/// A director agent round-trips through the store with its role intact.
#[tokio::test]
async fn agent_registry_round_trips_role_config() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();
    let registry = AgentRegistry::new(store.clone(), clock);

    let id = registry.register_director("director-1").await.unwrap();
    let agent: Agent = registry.get_agent(&id).await.unwrap();
    assert_eq!(agent.role(), AgentRole::Director);
    assert!(matches!(agent.role_config, RoleConfig::Director));
    assert_eq!(agent.session_status, SessionStatus::Idle);
}

/// S1: a document's chain root stays pinned across in-place updates, and
/// rollback forks a new version record rather than rewriting history.
#[test]
fn s1_document_version_chain_and_rollback() {
    let now = FakeClock::new().utc_now();
    let mut doc = new_document("V1", now);
    let root_id = doc.id;
    assert_eq!(doc.version, 1);
    assert!(doc.previous_version_id.is_none());

    doc.update_content("V2".into(), now).unwrap();
    assert_eq!(doc.version, 2);
    assert_eq!(doc.previous_version_id, Some(root_id));

    doc.update_content("V3".into(), now).unwrap();
    assert_eq!(doc.version, 3);
    // Chain root stays pinned to the first version, not version 2.
    assert_eq!(doc.previous_version_id, Some(root_id));

    let rolled_back = doc.fork_version(sf_core::DocumentId::new(), "V1".into(), now);
    assert_eq!(rolled_back.version, 4);
    assert_eq!(rolled_back.content, "V1");
    assert_eq!(rolled_back.previous_version_id, Some(root_id));
    assert_ne!(rolled_back.id, doc.id);
}

/// S2: open -> in_progress -> closed("Completed") -> reopen clears
/// closedAt; tombstone -> open is rejected with an empty allowed list.
#[tokio::test]
async fn s2_task_lifecycle() {
    let now = FakeClock::new().utc_now();
    let mut task = new_task(TaskId::new(), "ship it", TaskStatus::Open, now);
    assert_eq!(task.priority, 3);

    task.transition_status(TaskStatus::InProgress, now).unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);

    task.close(Some("Completed".into()), now).unwrap();
    assert_eq!(task.status, TaskStatus::Closed);
    assert!(task.closed_at.is_some());
    assert_eq!(task.close_reason.as_deref(), Some("Completed"));

    task.reopen(now).unwrap();
    assert_eq!(task.status, TaskStatus::Open);
    assert!(task.closed_at.is_none());

    let mut tombstoned = new_task(TaskId::new(), "gone", TaskStatus::Tombstone, now);
    match tombstoned.transition_status(TaskStatus::Open, now) {
        Err(CoreError::InvalidStatus { allowed, .. }) => assert!(allowed.is_empty()),
        other => panic!("expected InvalidStatus with an empty allowed list, got {other:?}"),
    }
}

/// S3: `is_valid_status_transition` agrees with `allowed_transitions` for
/// every `(from, to)` pair, including every same-status no-op.
#[test]
fn s3_status_transition_table_is_exhaustive() {
    let statuses = [
        TaskStatus::Open,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Deferred,
        TaskStatus::Review,
        TaskStatus::Closed,
        TaskStatus::Tombstone,
        TaskStatus::Backlog,
    ];
    for &from in &statuses {
        let allowed = sf_core::task::allowed_transitions(from);
        for &to in &statuses {
            let expected = from == to || allowed.contains(&to);
            assert_eq!(
                sf_core::task::is_valid_status_transition(from, to),
                expected,
                "{from:?} -> {to:?} expected {expected}"
            );
        }
    }
}

/// S4: three ready tasks (priorities 1, 3, 2) and two idle capacity-1
/// workers; one batch dispatches the priority-1 and priority-2 tasks and
/// leaves the priority-3 task for the next cycle.
#[tokio::test]
async fn s4_dispatch_cycle_picks_by_priority_and_respects_capacity() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();
    let registry = AgentRegistry::new(store.clone(), clock.clone());
    let now = clock.utc_now();

    let worker_a = registry.register_worker("worker-a", WorkerMode::Ephemeral).await.unwrap();
    let worker_b = registry.register_worker("worker-b", WorkerMode::Ephemeral).await.unwrap();

    let low = {
        let mut t = new_task(TaskId::new(), "low priority", TaskStatus::Open, now);
        t.priority = 1;
        t
    };
    let mid = {
        let mut t = new_task(TaskId::new(), "mid priority", TaskStatus::Open, now);
        t.priority = 2;
        t
    };
    let high = {
        let mut t = new_task(TaskId::new(), "high priority number", TaskStatus::Open, now);
        t.priority = 3;
        t
    };
    let low_id = low.id;
    let mid_id = mid.id;
    let high_id = high.id;
    store.put_task(low).await.unwrap();
    store.put_task(mid).await.unwrap();
    store.put_task(high).await.unwrap();

    let dispatch = DispatchService::new(store.clone(), Arc::new(NoRateLimits), clock);
    let decisions = dispatch.dispatch_batch(2).await.unwrap();

    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].task_id, low_id);
    assert!(decisions.iter().any(|d| d.task_id == mid_id));
    assert!(!decisions.iter().any(|d| d.task_id == high_id));
    let agents_used: std::collections::HashSet<_> = decisions.iter().map(|d| d.agent_id).collect();
    assert_eq!(agents_used, [worker_a, worker_b].into_iter().collect());
}

/// S5: a headless session's happy path emits init, the assistant turn,
/// and a non-error result before the spawner marks it terminated.
#[tokio::test]
async fn s5_spawner_headless_happy_path() {
    let script = vec![
        sf_core::AgentMessage::SystemInit { session_id: "prov-s5".into() },
        sf_core::AgentMessage::AssistantText { text: "hello".into() },
        sf_core::AgentMessage::Result {
            is_error: false,
            usage: Some(sf_core::Usage { input_tokens: 10, output_tokens: 5 }),
        },
    ];
    let registry: Arc<dyn sf_core::ProviderRegistry> = Arc::new(
        sf_adapters::registry::StaticProviderRegistry::new()
            .with_headless("fake", Box::new(sf_adapters::fake::FakeHeadlessProvider::new(script))),
    );
    let spawner = Spawner::new(registry, FakeClock::new());
    let session_id = sf_core::SessionId::new();
    let opts = sf_core::SpawnOptions::new(std::path::PathBuf::from("."), std::path::PathBuf::from(".stoneforge"));
    spawner.spawn_headless(session_id, "fake", opts).unwrap();

    let mut rx = spawner.subscribe(&session_id).unwrap();
    let mut events = Vec::new();
    loop {
        let event = rx.recv().await.unwrap();
        let done = matches!(event, SpawnedSessionEvent::Exit { .. });
        events.push(event);
        if done {
            break;
        }
    }

    assert!(matches!(events[0], SpawnedSessionEvent::ProviderSessionId(ref id) if id == "prov-s5"));
    assert!(events.iter().any(|e| matches!(e, SpawnedSessionEvent::Event(sf_core::AgentMessage::AssistantText { text }) if text == "hello")));
    assert!(events.iter().any(|e| matches!(e, SpawnedSessionEvent::Event(sf_core::AgentMessage::Result { is_error: false, .. }))));
    assert!(matches!(events.last(), Some(SpawnedSessionEvent::Exit { code: Some(0), .. })));
    assert_eq!(spawner.state(&session_id), Some(SpawnerState::Terminated));
}

/// S6: an executable rate-limited until `resets_at` is excluded from
/// dispatch until `now` reaches that instant.
#[tokio::test]
async fn s6_rate_limited_executable_excluded_until_reset() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();
    let registry = AgentRegistry::new(store.clone(), clock.clone());
    let now = clock.utc_now();

    let worker_id = registry.register_worker("worker-1", WorkerMode::Ephemeral).await.unwrap();
    let mut agent = store.get_agent(&worker_id).await.unwrap();
    agent.provider = Some("claude".into());
    store.put_agent(agent).await.unwrap();

    let task = new_task(TaskId::new(), "rate limited task", TaskStatus::Open, now);
    store.put_task(task).await.unwrap();

    let resets_at = now + chrono::Duration::minutes(10);
    let rate_limits = Arc::new(ExecutableRateLimitTracker::new());
    rate_limits.record("claude", resets_at);

    let dispatch = DispatchService::new(store.clone(), rate_limits.clone(), clock.clone());
    assert!(dispatch.dispatch().await.unwrap().is_none(), "rate-limited agent must not be eligible");

    clock.advance((resets_at - now).to_std().unwrap());
    let decision = dispatch.dispatch().await.unwrap();
    assert!(decision.is_some(), "agent should be eligible once the reset instant has passed");
}

/// S7: a steward with a cron trigger and a conditional event trigger only
/// fires the event trigger when its condition holds; a manual execution
/// records a `manual=true` history entry.
#[tokio::test]
async fn s7_steward_cron_and_event_triggers_plus_manual_execution() {
    struct NoopExecutor;
    #[async_trait::async_trait]
    impl StewardExecutor for NoopExecutor {
        async fn execute(&self, _context: StewardExecutionContext) -> StewardExecutionOutcome {
            StewardExecutionOutcome {
                success: true,
                output: None,
                error: None,
                items_processed: None,
                duration_ms: 0,
                manual: false,
            }
        }
    }

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let scheduler = StewardScheduler::new(store.clone(), Arc::new(NoopExecutor), FakeClock::new());

    let agent = sf_core::Agent::builder()
        .name("release-steward")
        .role_config(RoleConfig::Steward {
            steward_focus: sf_core::StewardFocus::Merge,
            triggers: vec![
                sf_core::Trigger::Cron { schedule: "*/5 * * * *".into() },
                sf_core::Trigger::Event { event: "task_completed".into(), condition: Some("task.status == 'closed'".into()) },
            ],
        })
        .build();
    store.put_agent(agent.clone()).await.unwrap();
    scheduler.register_steward(agent.id).await.unwrap();

    let open_triggered = scheduler.publish_event("task_completed", serde_json::json!({"task": {"status": "open"}})).await;
    assert_eq!(open_triggered, 0);

    let closed_triggered = scheduler.publish_event("task_completed", serde_json::json!({"task": {"status": "closed"}})).await;
    assert_eq!(closed_triggered, 1);

    scheduler.execute_steward(agent.id).await.unwrap();
    let history = scheduler.history(&agent.id);
    assert_eq!(history.len(), 2);
    assert!(!history[0].manual);
    assert!(history[1].manual);
}

/// S8: pushing an unchanged linked task is skipped; pulling a remote edit
/// onto a task unchanged since its last push applies cleanly with no
/// conflict; once both sides have changed independently, the conflict
/// resolves by last-write-wins on `updatedAt`.
#[tokio::test]
async fn s8_external_sync_push_pull_and_conflict() {
    use sf_sync::{PullTarget, SyncEngine, SyncOptions};

    struct FakeAdapter {
        updates: parking_lot::Mutex<Vec<(String, sf_core::ExternalFields)>>,
        items: parking_lot::Mutex<Vec<sf_sync::ExternalItem>>,
    }
    #[async_trait::async_trait]
    impl sf_sync::SyncAdapter for FakeAdapter {
        async fn update(&self, external_id: &str, fields: &sf_core::ExternalFields) -> Result<(), sf_sync::AdapterError> {
            self.updates.lock().push((external_id.to_string(), fields.clone()));
            Ok(())
        }
        async fn list_since(
            &self,
            _project: &str,
            cursor: chrono::DateTime<chrono::Utc>,
        ) -> Result<Vec<sf_sync::ExternalItem>, sf_sync::AdapterError> {
            Ok(self.items.lock().iter().filter(|item| item.updated_at > cursor).cloned().collect())
        }
    }
    struct PassthroughFieldMap;
    impl sf_core::TaskField for PassthroughFieldMap {}

    let clock = FakeClock::new();
    let now = clock.utc_now();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

    let mut task = new_task(TaskId::new(), "gh#42", TaskStatus::Open, now);
    let mut state = sf_core::ExternalSyncState::new("github", "acme/widgets", "42", sf_core::AdapterType::Task, sf_core::SyncDirection::Bidirectional);
    let current_hash = sf_sync::content_hash(&sf_sync::element::task_to_fields(&task));
    state.last_pushed_at = Some(now);
    state.last_pushed_hash = Some(current_hash);
    sf_sync::element::write_sync_state(&mut task.meta, &state, now);
    let task_id = task.id;
    store.put_task(task.clone()).await.unwrap();

    let adapter = Arc::new(FakeAdapter { updates: parking_lot::Mutex::new(Vec::new()), items: parking_lot::Mutex::new(Vec::new()) });
    let settings: Arc<dyn sf_core::Settings> = Arc::new(MemorySettings::new());
    let engine = SyncEngine::new(store.clone(), settings, clock.clone())
        .with_provider("github", adapter.clone() as Arc<dyn sf_sync::SyncAdapter>, Arc::new(PassthroughFieldMap));

    // Push with no title change and no new events: skipped, no adapter call.
    let outcome = engine.push_task(&task_id, &SyncOptions::default()).await.unwrap();
    assert_eq!(outcome, sf_sync::PushOutcome::SkippedUnchanged);
    assert!(adapter.updates.lock().is_empty());

    // Title edit plus a recorded event makes the push go through.
    clock.advance(std::time::Duration::from_secs(30));
    let mut edited = store.get_task(&task_id).await.unwrap();
    edited.title = "gh#42 renamed locally".into();
    store.put_task(edited).await.unwrap();
    store
        .append_event(sf_core::Event::TaskUpdated { id: task_id, updated_at: clock.utc_now() })
        .await
        .unwrap();
    let outcome = engine.push_task(&task_id, &SyncOptions::default()).await.unwrap();
    assert_eq!(outcome, sf_sync::PushOutcome::Pushed);
    assert_eq!(adapter.updates.lock().len(), 1);

    // Content changes again but without a recorded event backing it:
    // skipped as having nothing new to push, not as genuinely unchanged.
    let mut edited_again = store.get_task(&task_id).await.unwrap();
    edited_again.title = "gh#42 renamed again, no event".into();
    store.put_task(edited_again).await.unwrap();
    let outcome = engine.push_task(&task_id, &SyncOptions::default()).await.unwrap();
    assert_eq!(outcome, sf_sync::PushOutcome::SkippedNoEvents);

    // Revert so the rest of the scenario continues from the pushed state.
    let mut reverted = store.get_task(&task_id).await.unwrap();
    reverted.title = "gh#42 renamed locally".into();
    store.put_task(reverted).await.unwrap();

    // Remote edit with the local side unchanged since the last push: applies cleanly.
    clock.advance(std::time::Duration::from_secs(60));
    let first_pull_at = clock.utc_now();
    adapter.items.lock().push(sf_sync::ExternalItem {
        external_id: "42".into(),
        url: None,
        fields: sf_core::ExternalFields { title: Some("renamed upstream".into()), ..Default::default() },
        updated_at: first_pull_at,
        is_open: true,
    });
    let target = PullTarget { provider: "github".into(), project: "acme/widgets".into(), adapter_type: sf_core::AdapterType::Task };
    let summary = engine.pull(&target, &SyncOptions::default()).await.unwrap();
    assert_eq!(summary.pulled, 1);
    assert_eq!(summary.conflicts, 0);
    let persisted = store.get_task(&task_id).await.unwrap();
    assert_eq!(persisted.title, "renamed upstream");

    // Both sides now change independently: last-write-wins by updatedAt. The
    // remote edit lands after the pull cursor but before the local one, so
    // the more recently updated side (local) wins.
    clock.advance(std::time::Duration::from_secs(60));
    let mut locally_edited = store.get_task(&task_id).await.unwrap();
    locally_edited.title = "renamed locally, again".into();
    locally_edited.meta.touch(clock.utc_now());
    store.put_task(locally_edited).await.unwrap();

    adapter.items.lock().clear();
    adapter.items.lock().push(sf_sync::ExternalItem {
        external_id: "42".into(),
        url: None,
        fields: sf_core::ExternalFields { title: Some("renamed upstream, again".into()), ..Default::default() },
        updated_at: first_pull_at + chrono::Duration::seconds(30),
        is_open: true,
    });
    let summary = engine.pull(&target, &SyncOptions::default()).await.unwrap();
    assert_eq!(summary.conflicts, 1);
    let persisted = store.get_task(&task_id).await.unwrap();
    assert_eq!(persisted.title, "renamed locally, again", "more recently updated side (local) should win");
}
