// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `EngineError`: the orchestration engine's boundary error type, wrapping
//! `CoreError` plus engine-internal failure kinds.

use sf_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("agent {0} is busy with an active session")]
    AgentBusy(String),

    #[error("provider error: {0}")]
    Provider(#[from] sf_core::ProviderError),

    #[error("spawn timed out waiting for init after {0:?}")]
    SpawnTimeout(std::time::Duration),

    #[error("invalid cron expression: {0}")]
    InvalidCron(String),

    #[error("session {0} driver task is gone")]
    SessionGone(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
