// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Core(#[from] sf_core::CoreError),

    #[error(transparent)]
    Engine(#[from] sf_engine::EngineError),

    #[error(transparent)]
    Sync(#[from] sf_sync::SyncError),

    #[error("another daemon instance is already running (lock held at {0})")]
    AlreadyRunning(std::path::PathBuf),

    #[error("failed to bind socket at {path}: {source}")]
    BindFailed { path: std::path::PathBuf, #[source] source: std::io::Error },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type DaemonResult<T> = Result<T, DaemonError>;
