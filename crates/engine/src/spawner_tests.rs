// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sf_adapters::fake::FakeHeadlessProvider;
use sf_adapters::registry::StaticProviderRegistry;
use sf_core::{FakeClock, Usage};
use std::path::PathBuf;
use std::time::Duration;

fn opts() -> SpawnOptions {
    SpawnOptions::new(PathBuf::from("/tmp/work"), PathBuf::from("/tmp/sf"))
}

async fn drain_until_exit(rx: &mut broadcast::Receiver<SpawnedSessionEvent>) -> Vec<SpawnedSessionEvent> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("event within timeout")
            .expect("bus not closed");
        let is_exit = matches!(event, SpawnedSessionEvent::Exit { .. });
        events.push(event);
        if is_exit {
            break;
        }
    }
    events
}

#[tokio::test]
async fn happy_path_emits_init_then_exit_zero() {
    let provider = FakeHeadlessProvider::new(vec![
        AgentMessage::SystemInit { session_id: "prov-1".into() },
        AgentMessage::AssistantText { text: "working on it".into() },
        AgentMessage::Result { is_error: false, usage: Some(Usage { input_tokens: 10, output_tokens: 20 }) },
    ]);
    let registry: Arc<dyn ProviderRegistry> =
        Arc::new(StaticProviderRegistry::new().with_headless("fake", Box::new(provider)));
    let spawner = Spawner::new(registry, FakeClock::new());
    let session_id = SessionId::new();

    let mut rx = {
        spawner.spawn_headless(session_id, "fake", opts()).unwrap();
        spawner.subscribe(&session_id).unwrap()
    };

    let events = drain_until_exit(&mut rx).await;
    assert!(events.iter().any(|e| matches!(e, SpawnedSessionEvent::ProviderSessionId(id) if id == "prov-1")));
    assert!(matches!(events.last(), Some(SpawnedSessionEvent::Exit { code: Some(0), .. })));
}

#[tokio::test]
async fn error_result_exits_nonzero() {
    let provider = FakeHeadlessProvider::new(vec![
        AgentMessage::SystemInit { session_id: "prov-2".into() },
        AgentMessage::Result { is_error: true, usage: None },
    ]);
    let registry: Arc<dyn ProviderRegistry> =
        Arc::new(StaticProviderRegistry::new().with_headless("fake", Box::new(provider)));
    let spawner = Spawner::new(registry, FakeClock::new());
    let session_id = SessionId::new();
    spawner.spawn_headless(session_id, "fake", opts()).unwrap();
    let mut rx = spawner.subscribe(&session_id).unwrap();

    let events = drain_until_exit(&mut rx).await;
    assert!(matches!(events.last(), Some(SpawnedSessionEvent::Exit { code: Some(1), .. })));
}

#[tokio::test]
async fn rate_limit_text_emits_rate_limited_event() {
    let provider = FakeHeadlessProvider::new(vec![
        AgentMessage::SystemInit { session_id: "prov-3".into() },
        AgentMessage::AssistantText { text: "usage limit reached, please retry later".into() },
        AgentMessage::Result { is_error: false, usage: None },
    ]);
    let registry: Arc<dyn ProviderRegistry> =
        Arc::new(StaticProviderRegistry::new().with_headless("fake", Box::new(provider)));
    let spawner = Spawner::new(registry, FakeClock::new());
    let session_id = SessionId::new();
    spawner.spawn_headless(session_id, "fake", opts()).unwrap();
    let mut rx = spawner.subscribe(&session_id).unwrap();

    let events = drain_until_exit(&mut rx).await;
    assert!(events.iter().any(|e| matches!(e, SpawnedSessionEvent::RateLimited { .. })));
}

#[tokio::test]
async fn unknown_provider_is_rejected() {
    let registry: Arc<dyn ProviderRegistry> = Arc::new(StaticProviderRegistry::new());
    let spawner = Spawner::new(registry, FakeClock::new());
    let err = spawner.spawn_headless(SessionId::new(), "missing", opts()).unwrap_err();
    assert!(matches!(err, EngineError::Provider(_)));
}

struct HangingSession;

#[async_trait::async_trait]
impl sf_core::HeadlessSession for HangingSession {
    async fn recv(&mut self) -> Option<AgentMessage> {
        std::future::pending().await
    }
    async fn send_message(&mut self, _message: &str) -> Result<(), sf_core::ProviderError> {
        Ok(())
    }
    async fn interrupt(&mut self) -> Result<(), sf_core::ProviderError> {
        Ok(())
    }
    async fn close(&mut self) -> Result<(), sf_core::ProviderError> {
        Ok(())
    }
}

struct HangingProvider;

#[async_trait::async_trait]
impl sf_core::HeadlessProvider for HangingProvider {
    async fn spawn(&self, _opts: SpawnOptions) -> Result<Box<dyn sf_core::HeadlessSession>, sf_core::ProviderError> {
        Ok(Box::new(HangingSession))
    }
    fn is_available(&self) -> bool {
        true
    }
    fn list_models(&self) -> Vec<String> {
        vec!["hanging".into()]
    }
}

#[tokio::test(start_paused = true)]
async fn spawn_init_timeout_fails_a_hung_provider() {
    let registry: Arc<dyn ProviderRegistry> =
        Arc::new(StaticProviderRegistry::new().with_headless("hang", Box::new(HangingProvider)));
    let spawner = Spawner::new(registry, FakeClock::new()).with_init_timeout(Duration::from_secs(5));
    let session_id = SessionId::new();
    spawner.spawn_headless(session_id, "hang", opts()).unwrap();
    let mut rx = spawner.subscribe(&session_id).unwrap();

    tokio::time::advance(Duration::from_secs(6)).await;
    let events = drain_until_exit(&mut rx).await;
    assert!(events.iter().any(|e| matches!(e, SpawnedSessionEvent::Error(_))));
    assert!(matches!(events.last(), Some(SpawnedSessionEvent::Exit { code: None, .. })));
}

#[tokio::test(start_paused = true)]
async fn terminated_session_is_removed_from_the_map_after_the_grace_delay() {
    let provider = FakeHeadlessProvider::new(vec![
        AgentMessage::SystemInit { session_id: "prov-4".into() },
        AgentMessage::Result { is_error: false, usage: None },
    ]);
    let registry: Arc<dyn ProviderRegistry> =
        Arc::new(StaticProviderRegistry::new().with_headless("fake", Box::new(provider)));
    let spawner = Spawner::new(registry, FakeClock::new());
    let session_id = SessionId::new();
    spawner.spawn_headless(session_id, "fake", opts()).unwrap();
    let mut rx = spawner.subscribe(&session_id).unwrap();
    drain_until_exit(&mut rx).await;

    assert_eq!(spawner.state(&session_id), Some(SpawnerState::Terminated));
    tokio::time::advance(Duration::from_secs(6)).await;
    assert_eq!(spawner.state(&session_id), None);
}
