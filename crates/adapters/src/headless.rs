// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference headless provider: spawns a subprocess emitting one JSON
//! object per line on stdout (a "stream-JSON" provider).

use async_trait::async_trait;
use sf_core::{AgentMessage, HeadlessProvider, HeadlessSession, ProviderError, SpawnOptions, Usage};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tracing::{debug, warn};

pub struct SubprocessHeadlessProvider {
    executable: String,
}

impl SubprocessHeadlessProvider {
    pub fn new(executable: impl Into<String>) -> Self {
        Self { executable: executable.into() }
    }
}

#[async_trait]
impl HeadlessProvider for SubprocessHeadlessProvider {
    async fn spawn(&self, opts: SpawnOptions) -> Result<Box<dyn HeadlessSession>, ProviderError> {
        let mut command = tokio::process::Command::new(&self.executable);
        command
            .current_dir(&opts.working_directory)
            .envs(&opts.environment_variables)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(resume) = &opts.resume_session_id {
            command.arg("--resume").arg(resume);
        }
        if let Some(model) = &opts.model {
            command.arg("--model").arg(model);
        }

        let mut child = command.spawn().map_err(|e| ProviderError::SpawnFailed(e.to_string()))?;
        let stdin = child.stdin.take().ok_or_else(|| ProviderError::SpawnFailed("no stdin".into()))?;
        let stdout = child.stdout.take().ok_or_else(|| ProviderError::SpawnFailed("no stdout".into()))?;

        let mut session = SubprocessHeadlessSession {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        };

        if let Some(prompt) = &opts.initial_prompt {
            session.send_message(prompt).await?;
        }

        Ok(Box::new(session))
    }

    fn is_available(&self) -> bool {
        which(&self.executable)
    }

    fn list_models(&self) -> Vec<String> {
        Vec::new()
    }
}

fn which(executable: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths).any(|dir| dir.join(executable).is_file())
        })
        .unwrap_or(false)
}

struct SubprocessHeadlessSession {
    child: Child,
    stdin: ChildStdin,
    lines: tokio::io::Lines<BufReader<tokio::process::ChildStdout>>,
}

#[async_trait]
impl HeadlessSession for SubprocessHeadlessSession {
    async fn recv(&mut self) -> Option<AgentMessage> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    warn!(error = %e, "headless session read error");
                    return None;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_message(&line) {
                Ok(msg) => return Some(msg),
                Err(e) => {
                    debug!(error = %e, line = %line, "skipping unparsable stream-json line");
                    continue;
                }
            }
        }
    }

    async fn send_message(&mut self, message: &str) -> Result<(), ProviderError> {
        let payload = serde_json::json!({ "type": "user", "content": message });
        let mut line = serde_json::to_string(&payload).map_err(|e| ProviderError::Io(e.to_string()))?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await.map_err(|e| ProviderError::Io(e.to_string()))
    }

    async fn interrupt(&mut self) -> Result<(), ProviderError> {
        let payload = serde_json::json!({ "type": "control", "action": "interrupt" });
        let mut line = serde_json::to_string(&payload).map_err(|e| ProviderError::Io(e.to_string()))?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await.map_err(|e| ProviderError::Io(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), ProviderError> {
        let _ = self.stdin.shutdown().await;
        let _ = self.child.start_kill();
        Ok(())
    }
}

fn parse_message(line: &str) -> Result<AgentMessage, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(line)?;
    let msg_type = value.get("type").and_then(|v| v.as_str()).unwrap_or("");
    let msg = match msg_type {
        "system" if value.get("subtype").and_then(|v| v.as_str()) == Some("init") => AgentMessage::SystemInit {
            session_id: value.get("session_id").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        },
        "assistant" => AgentMessage::AssistantText {
            text: value.get("text").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        },
        "tool_use" => AgentMessage::ToolUse {
            name: value.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            input: value.get("input").cloned().unwrap_or(serde_json::Value::Null),
        },
        "tool_result" => AgentMessage::ToolResult { output: value.get("output").cloned().unwrap_or(serde_json::Value::Null) },
        "result" => AgentMessage::Result {
            is_error: value.get("is_error").and_then(|v| v.as_bool()).unwrap_or(false),
            usage: value.get("usage").and_then(|u| {
                Some(Usage {
                    input_tokens: u.get("input")?.as_u64()?,
                    output_tokens: u.get("output")?.as_u64()?,
                })
            }),
        },
        "error" => AgentMessage::Error { message: value.get("message").and_then(|v| v.as_str()).unwrap_or_default().to_string() },
        other => return Err(serde::de::Error::custom(format!("unknown message type: {other}"))),
    };
    Ok(msg)
}
