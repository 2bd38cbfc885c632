// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sf_adapters::fake::FakeHeadlessProvider;
use sf_adapters::registry::StaticProviderRegistry;
use sf_core::{AgentMessage, FakeClock, ProviderRegistry};
use sf_storage::MemoryStore;
use std::path::PathBuf;

fn scripted_registry(messages: Vec<AgentMessage>) -> Arc<dyn ProviderRegistry> {
    Arc::new(StaticProviderRegistry::new().with_headless("fake", Box::new(FakeHeadlessProvider::new(messages))))
}

fn worker_agent(provider: &str) -> sf_core::Agent {
    sf_core::Agent::builder().name("worker-1").provider(provider).build()
}

fn spawn_opts() -> SpawnOptions {
    SpawnOptions::new(PathBuf::from("/tmp/work"), PathBuf::from("/tmp/sf"))
}

#[tokio::test]
async fn start_session_persists_a_starting_record() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();
    let registry = scripted_registry(vec![AgentMessage::SystemInit { session_id: "p-1".into() }]);
    let spawner = Arc::new(Spawner::new(registry, clock.clone()));
    let manager = SessionManager::new(store.clone(), spawner, clock);

    let agent = worker_agent("fake");
    store.put_agent(agent.clone()).await.unwrap();

    let record = manager.start_session(agent.id, spawn_opts()).await.unwrap();
    assert_eq!(record.state, SessionState::Starting);

    let fetched = store.get_session(&record.id).await.unwrap();
    assert_eq!(fetched.id, record.id);
}

#[tokio::test]
async fn start_session_rejects_when_agent_already_has_live_session() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();
    let registry = scripted_registry(vec![]);
    let spawner = Arc::new(Spawner::new(registry, clock.clone()));
    let manager = SessionManager::new(store.clone(), spawner, clock.clone());

    let agent = worker_agent("fake");
    store.put_agent(agent.clone()).await.unwrap();
    manager.start_session(agent.id, spawn_opts()).await.unwrap();

    let err = manager.start_session(agent.id, spawn_opts()).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::Capacity { reason: sf_core::CapacityReason::SessionBusy, .. })
    ));
}

#[tokio::test]
async fn resume_without_provider_session_id_surfaces_invalid_resume() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();
    let registry = scripted_registry(vec![]);
    let spawner = Arc::new(Spawner::new(registry, clock.clone()));
    let manager = SessionManager::new(store.clone(), spawner, clock.clone());

    let agent = worker_agent("fake");
    store.put_agent(agent.clone()).await.unwrap();
    let record = SessionRecord::new(agent.id, agent.role(), SpawnMode::Headless, "/tmp".into(), clock.utc_now());
    store.put_session(record).await.unwrap();

    let err = manager.resume_session(agent.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::InvalidResume { .. })));

    let sessions = store.list_sessions_for_agent(&agent.id).await.unwrap();
    assert_eq!(sessions[0].state, SessionState::Terminated);
}

#[tokio::test]
async fn stop_session_drives_to_terminated() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let clock = FakeClock::new();
    let registry = scripted_registry(vec![]);
    let spawner = Arc::new(Spawner::new(registry, clock.clone()));
    let manager = SessionManager::new(store.clone(), spawner, clock.clone());

    let agent = worker_agent("fake");
    store.put_agent(agent.clone()).await.unwrap();
    let mut record = SessionRecord::new(agent.id, agent.role(), SpawnMode::Headless, "/tmp".into(), clock.utc_now());
    record.transition(SessionState::Running, clock.utc_now()).unwrap();
    store.put_session(record.clone()).await.unwrap();

    let stopped = manager.stop_session(&record.id, false).await.unwrap();
    assert_eq!(stopped.state, SessionState::Terminated);
}
