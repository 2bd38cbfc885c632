// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ProviderRegistry`: the external collaborator exposing headless and
//! interactive agent providers, per the §6 provider contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("resume failed: {0}")]
    ResumeFailed(String),
    #[error("io error: {0}")]
    Io(String),
}

/// Options shared by both spawn modes.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    pub working_directory: PathBuf,
    pub initial_prompt: Option<String>,
    pub resume_session_id: Option<String>,
    pub environment_variables: HashMap<String, String>,
    pub stoneforge_root: PathBuf,
    pub timeout: std::time::Duration,
    pub model: Option<String>,
    /// Interactive-only: initial terminal size.
    pub cols: Option<u16>,
    pub rows: Option<u16>,
}

impl SpawnOptions {
    pub fn new(working_directory: PathBuf, stoneforge_root: PathBuf) -> Self {
        Self {
            working_directory,
            initial_prompt: None,
            resume_session_id: None,
            environment_variables: HashMap::new(),
            stoneforge_root,
            timeout: std::time::Duration::from_secs(120),
            model: None,
            cols: None,
            rows: None,
        }
    }

    crate::setters! {
        option { initial_prompt: String, resume_session_id: String, model: String }
        set { timeout: std::time::Duration }
    }
}

/// One message from a headless provider's async sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentMessage {
    SystemInit { session_id: String },
    AssistantText { text: String },
    ToolUse { name: String, input: serde_json::Value },
    ToolResult { output: serde_json::Value },
    Result { is_error: bool, usage: Option<Usage> },
    Error { message: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A running headless provider session: an async sequence of
/// [`AgentMessage`]s plus control operations.
#[async_trait]
pub trait HeadlessSession: Send + Sync {
    /// Receives the next message, or `None` on end-of-stream (the producer
    /// called `close()` or exited).
    async fn recv(&mut self) -> Option<AgentMessage>;
    async fn send_message(&mut self, message: &str) -> Result<(), ProviderError>;
    async fn interrupt(&mut self) -> Result<(), ProviderError>;
    async fn close(&mut self) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait HeadlessProvider: Send + Sync {
    async fn spawn(&self, opts: SpawnOptions) -> Result<Box<dyn HeadlessSession>, ProviderError>;
    fn is_available(&self) -> bool;
    fn list_models(&self) -> Vec<String>;
}

/// A running interactive (PTY) provider session.
#[async_trait]
pub trait InteractiveSession: Send + Sync {
    fn pid(&self) -> Option<u32>;
    fn session_id(&self) -> Option<String>;
    async fn write(&mut self, data: &[u8]) -> Result<(), ProviderError>;
    async fn resize(&mut self, cols: u16, rows: u16) -> Result<(), ProviderError>;
    /// Channel the caller reads raw PTY output from.
    fn data_channel(&mut self) -> mpsc::Receiver<Vec<u8>>;
    /// Resolves with `(exit_code, signal)` once the child exits.
    async fn wait_exit(&mut self) -> (Option<i32>, Option<i32>);
    async fn kill(&mut self) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait InteractiveProvider: Send + Sync {
    async fn spawn(
        &self,
        opts: SpawnOptions,
    ) -> Result<Box<dyn InteractiveSession>, ProviderError>;
    fn is_available(&self) -> bool;
    fn list_models(&self) -> Vec<String>;
}

/// Resolves a configured provider name to its headless/interactive
/// implementations. Owned externally; the core only consumes it.
pub trait ProviderRegistry: Send + Sync {
    fn headless(&self, provider: &str) -> Option<&dyn HeadlessProvider>;
    fn interactive(&self, provider: &str) -> Option<&dyn InteractiveProvider>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_options_setters_chain() {
        let opts = SpawnOptions::new("/tmp/a".into(), "/tmp/sf".into())
            .initial_prompt("do the thing")
            .model("sonnet");
        assert_eq!(opts.initial_prompt.as_deref(), Some("do the thing"));
        assert_eq!(opts.model.as_deref(), Some("sonnet"));
    }
}
