// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::adapter::AdapterError;
use crate::element::{read_sync_state, write_sync_state};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex as SyncMutex;
use sf_core::{EntityMeta, Event, SyncDirection, Task, TaskType};
use sf_storage::{MemorySettings, MemoryStore};

struct FakeAdapter {
    updates: SyncMutex<Vec<(String, ExternalFields)>>,
    items: SyncMutex<Vec<ExternalItem>>,
}

impl FakeAdapter {
    fn new(items: Vec<ExternalItem>) -> Self {
        Self { updates: SyncMutex::new(Vec::new()), items: SyncMutex::new(items) }
    }
}

#[async_trait]
impl SyncAdapter for FakeAdapter {
    async fn update(&self, external_id: &str, fields: &ExternalFields) -> Result<(), AdapterError> {
        self.updates.lock().push((external_id.to_string(), fields.clone()));
        Ok(())
    }

    async fn list_since(&self, _project: &str, cursor: DateTime<Utc>) -> Result<Vec<ExternalItem>, AdapterError> {
        Ok(self.items.lock().iter().filter(|item| item.updated_at > cursor).cloned().collect())
    }
}

struct PassthroughFieldMap;
impl TaskField for PassthroughFieldMap {}

fn linked_task(now: DateTime<Utc>, provider: &str, project: &str, external_id: &str) -> Task {
    let id = sf_core::TaskId::new();
    let mut meta = EntityMeta::new(id.to_string(), "task", "system", now);
    let mut state =
        ExternalSyncState::new(provider, project, external_id, AdapterType::Task, SyncDirection::Bidirectional);
    state.last_pushed_at = Some(now);
    write_sync_state(&mut meta, &state, now);
    Task {
        meta,
        id,
        title: "sync me".into(),
        status: TaskStatus::Open,
        priority: 2,
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

fn engine_with(adapter: Arc<dyn SyncAdapter>) -> SyncEngine<sf_core::FakeClock> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let settings: Arc<dyn Settings> = Arc::new(MemorySettings::new());
    SyncEngine::new(store, settings, sf_core::FakeClock::new()).with_provider("github", adapter, Arc::new(PassthroughFieldMap))
}

#[tokio::test]
async fn push_skips_when_content_hash_unchanged() {
    let clock = sf_core::FakeClock::new();
    let now = clock.utc_now();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let mut task = linked_task(now, "github", "acme/widgets", "42");
    let mut state = read_sync_state(&task.meta).unwrap();
    state.last_pushed_hash = Some(content_hash(&task_to_fields(&task)));
    write_sync_state(&mut task.meta, &state, now);
    store.put_task(task.clone()).await.unwrap();

    let adapter = Arc::new(FakeAdapter::new(vec![]));
    let settings: Arc<dyn Settings> = Arc::new(MemorySettings::new());
    let engine = SyncEngine::new(store, settings, clock).with_provider("github", adapter.clone(), Arc::new(PassthroughFieldMap));

    let outcome = engine.push_task(&task.id, &SyncOptions::default()).await.unwrap();
    assert_eq!(outcome, PushOutcome::SkippedUnchanged);
    assert!(adapter.updates.lock().is_empty());
}

#[tokio::test]
async fn push_sends_update_and_records_hash_when_content_changed() {
    let clock = sf_core::FakeClock::new();
    let now = clock.utc_now();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let task = linked_task(now, "github", "acme/widgets", "42");
    store.put_task(task.clone()).await.unwrap();
    clock.advance(std::time::Duration::from_secs(30));
    store
        .append_event(Event::TaskUpdated { id: task.id, updated_at: clock.utc_now() })
        .await
        .unwrap();

    let adapter = Arc::new(FakeAdapter::new(vec![]));
    let settings: Arc<dyn Settings> = Arc::new(MemorySettings::new());
    let engine = SyncEngine::new(store.clone(), settings, clock).with_provider("github", adapter.clone(), Arc::new(PassthroughFieldMap));

    let outcome = engine.push_task(&task.id, &SyncOptions::default()).await.unwrap();
    assert_eq!(outcome, PushOutcome::Pushed);
    assert_eq!(adapter.updates.lock().len(), 1);

    let persisted = store.get_task(&task.id).await.unwrap();
    let state = read_sync_state(&persisted.meta).unwrap();
    assert!(state.last_pushed_hash.is_some());
}

#[tokio::test]
async fn push_skips_closed_task() {
    let clock = sf_core::FakeClock::new();
    let now = clock.utc_now();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let mut task = linked_task(now, "github", "acme/widgets", "42");
    task.status = TaskStatus::Closed;
    store.put_task(task.clone()).await.unwrap();

    let engine = engine_with(Arc::new(FakeAdapter::new(vec![])));
    let outcome = engine.push_task(&task.id, &SyncOptions::default()).await.unwrap();
    assert_eq!(outcome, PushOutcome::SkippedNotPushable);
}

#[tokio::test]
async fn pull_applies_remote_title_change_to_linked_task() {
    let clock = sf_core::FakeClock::new();
    let now = clock.utc_now();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let task = linked_task(now, "github", "acme/widgets", "42");
    store.put_task(task.clone()).await.unwrap();

    clock.advance(std::time::Duration::from_secs(60));
    let remote = ExternalItem {
        external_id: "42".into(),
        url: None,
        fields: ExternalFields { title: Some("renamed upstream".into()), ..Default::default() },
        updated_at: clock.utc_now(),
        is_open: true,
    };
    let adapter = Arc::new(FakeAdapter::new(vec![remote]));
    let settings: Arc<dyn Settings> = Arc::new(MemorySettings::new());
    let engine = SyncEngine::new(store.clone(), settings, clock).with_provider("github", adapter, Arc::new(PassthroughFieldMap));

    let target = PullTarget { provider: "github".into(), project: "acme/widgets".into(), adapter_type: AdapterType::Task };
    let summary = engine.pull(&target, &SyncOptions::default()).await.unwrap();
    assert_eq!(summary.pulled, 1);

    let persisted = store.get_task(&task.id).await.unwrap();
    assert_eq!(persisted.title, "renamed upstream");
}

#[tokio::test]
async fn pull_reopens_closed_task_when_remote_is_open() {
    let clock = sf_core::FakeClock::new();
    let now = clock.utc_now();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let mut task = linked_task(now, "github", "acme/widgets", "42");
    task.status = TaskStatus::Closed;
    task.closed_at = Some(now);
    let mut state = read_sync_state(&task.meta).unwrap();
    state.last_pushed_hash = Some(content_hash(&task_to_fields(&task)));
    write_sync_state(&mut task.meta, &state, now);
    store.put_task(task.clone()).await.unwrap();

    clock.advance(std::time::Duration::from_secs(60));
    let remote = ExternalItem {
        external_id: "42".into(),
        url: None,
        fields: task_to_fields(&task),
        updated_at: clock.utc_now(),
        is_open: true,
    };
    let adapter = Arc::new(FakeAdapter::new(vec![remote]));
    let settings: Arc<dyn Settings> = Arc::new(MemorySettings::new());
    let engine = SyncEngine::new(store.clone(), settings, clock).with_provider("github", adapter, Arc::new(PassthroughFieldMap));

    let target = PullTarget { provider: "github".into(), project: "acme/widgets".into(), adapter_type: AdapterType::Task };
    engine.pull(&target, &SyncOptions::default()).await.unwrap();

    let persisted = store.get_task(&task.id).await.unwrap();
    assert_eq!(persisted.status, TaskStatus::Open);
}

#[tokio::test]
async fn pull_creates_local_task_when_all_flag_set_and_item_unlinked() {
    let clock = sf_core::FakeClock::new();
    let now = clock.utc_now();
    let remote = ExternalItem {
        external_id: "99".into(),
        url: Some("https://github.example/99".into()),
        fields: ExternalFields { title: Some("new from upstream".into()), ..Default::default() },
        updated_at: now,
        is_open: true,
    };
    let adapter = Arc::new(FakeAdapter::new(vec![remote]));
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let settings: Arc<dyn Settings> = Arc::new(MemorySettings::new());
    let engine = SyncEngine::new(store.clone(), settings, clock).with_provider("github", adapter, Arc::new(PassthroughFieldMap));

    let target = PullTarget { provider: "github".into(), project: "acme/widgets".into(), adapter_type: AdapterType::Task };
    let summary = engine.pull(&target, &SyncOptions { all: true, ..Default::default() }).await.unwrap();
    assert_eq!(summary.created, 1);

    let tasks = store.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "new from upstream");
}

#[tokio::test]
async fn pull_without_all_flag_skips_unlinked_items() {
    let clock = sf_core::FakeClock::new();
    let now = clock.utc_now();
    let remote = ExternalItem {
        external_id: "99".into(),
        url: None,
        fields: ExternalFields::default(),
        updated_at: now,
        is_open: true,
    };
    let adapter = Arc::new(FakeAdapter::new(vec![remote]));
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let settings: Arc<dyn Settings> = Arc::new(MemorySettings::new());
    let engine = SyncEngine::new(store.clone(), settings, clock).with_provider("github", adapter, Arc::new(PassthroughFieldMap));

    let target = PullTarget { provider: "github".into(), project: "acme/widgets".into(), adapter_type: AdapterType::Task };
    let summary = engine.pull(&target, &SyncOptions::default()).await.unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.skipped, 1);
    assert!(store.list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn manual_conflict_strategy_tags_element_and_skips() {
    let clock = sf_core::FakeClock::new();
    let now = clock.utc_now();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let mut task = linked_task(now, "github", "acme/widgets", "42");
    let mut state = read_sync_state(&task.meta).unwrap();
    state.last_pushed_hash = Some(content_hash(&task_to_fields(&task)));
    write_sync_state(&mut task.meta, &state, now);
    // Edit after establishing the pushed baseline: now genuinely changed locally.
    task.title = "local edit".into();
    store.put_task(task.clone()).await.unwrap();

    clock.advance(std::time::Duration::from_secs(60));
    let remote = ExternalItem {
        external_id: "42".into(),
        url: None,
        fields: ExternalFields { title: Some("remote edit".into()), ..Default::default() },
        updated_at: clock.utc_now(),
        is_open: true,
    };
    let adapter = Arc::new(FakeAdapter::new(vec![remote]));
    let settings: Arc<dyn Settings> = Arc::new(MemorySettings::new());
    let engine = SyncEngine::new(store.clone(), settings, clock)
        .with_provider("github", adapter, Arc::new(PassthroughFieldMap))
        .with_conflict_strategy(ConflictStrategy::Manual);

    let target = PullTarget { provider: "github".into(), project: "acme/widgets".into(), adapter_type: AdapterType::Task };
    let summary = engine.pull(&target, &SyncOptions::default()).await.unwrap();
    assert_eq!(summary.conflicts, 1);

    let persisted = store.get_task(&task.id).await.unwrap();
    assert!(persisted.meta.tags.iter().any(|t| t == "sync-conflict"));
    assert_eq!(persisted.title, "local edit");
}

#[tokio::test]
async fn last_write_wins_prefers_the_more_recently_updated_side() {
    let clock = sf_core::FakeClock::new();
    let now = clock.utc_now();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let mut task = linked_task(now, "github", "acme/widgets", "42");
    let mut state = read_sync_state(&task.meta).unwrap();
    state.last_pushed_hash = Some(content_hash(&task_to_fields(&task)));
    write_sync_state(&mut task.meta, &state, now);
    task.title = "local edit".into();
    store.put_task(task.clone()).await.unwrap();

    // Remote timestamp is older than the local edit: local should win.
    let remote = ExternalItem {
        external_id: "42".into(),
        url: None,
        fields: ExternalFields { title: Some("stale remote edit".into()), ..Default::default() },
        updated_at: now,
        is_open: true,
    };
    let adapter = Arc::new(FakeAdapter::new(vec![remote]));
    let settings: Arc<dyn Settings> = Arc::new(MemorySettings::new());

    clock.advance(std::time::Duration::from_secs(60));
    // Bump local updated_at past the remote timestamp by touching after the clock advance.
    let mut newer = store.get_task(&task.id).await.unwrap();
    newer.meta.touch(clock.utc_now());
    store.put_task(newer).await.unwrap();

    let engine = SyncEngine::new(store.clone(), settings, clock).with_provider("github", adapter, Arc::new(PassthroughFieldMap));
    let target = PullTarget { provider: "github".into(), project: "acme/widgets".into(), adapter_type: AdapterType::Task };
    let summary = engine.pull(&target, &SyncOptions::default()).await.unwrap();
    assert_eq!(summary.conflicts, 1);

    let persisted = store.get_task(&task.id).await.unwrap();
    assert_eq!(persisted.title, "local edit");
}
