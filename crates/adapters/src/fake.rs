// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake headless provider driven by a scripted message queue, for
//! deterministic spawner/dispatch tests in downstream crates.

use async_trait::async_trait;
use parking_lot::Mutex;
use sf_core::{AgentMessage, HeadlessProvider, HeadlessSession, ProviderError, SpawnOptions};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
pub struct FakeHeadlessProvider {
    script: Arc<Mutex<VecDeque<AgentMessage>>>,
    available: bool,
    sent: Arc<Mutex<Vec<String>>>,
}

impl FakeHeadlessProvider {
    pub fn new(script: Vec<AgentMessage>) -> Self {
        Self { script: Arc::new(Mutex::new(script.into())), available: true, sent: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl HeadlessProvider for FakeHeadlessProvider {
    async fn spawn(&self, _opts: SpawnOptions) -> Result<Box<dyn HeadlessSession>, ProviderError> {
        Ok(Box::new(FakeHeadlessSession { script: self.script.clone(), sent: self.sent.clone() }))
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn list_models(&self) -> Vec<String> {
        vec!["fake-model".into()]
    }
}

pub struct FakeHeadlessSession {
    script: Arc<Mutex<VecDeque<AgentMessage>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl HeadlessSession for FakeHeadlessSession {
    async fn recv(&mut self) -> Option<AgentMessage> {
        self.script.lock().pop_front()
    }

    async fn send_message(&mut self, message: &str) -> Result<(), ProviderError> {
        self.sent.lock().push(message.to_string());
        Ok(())
    }

    async fn interrupt(&mut self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ProviderError> {
        self.script.lock().clear();
        Ok(())
    }
}
