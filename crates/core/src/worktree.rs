// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WorktreeManager`: the optional external collaborator that allocates an
//! exclusive per-task git working directory.

use crate::id::TaskId;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("worktree for {0} is already allocated")]
    AlreadyAllocated(TaskId),
    #[error("git error: {0}")]
    Git(String),
}

#[async_trait]
pub trait WorktreeManager: Send + Sync {
    async fn allocate(&self, task_id: &TaskId) -> Result<PathBuf, WorktreeError>;
    async fn release(&self, task_id: &TaskId) -> Result<(), WorktreeError>;
    fn path_for(&self, task_id: &TaskId) -> PathBuf;
}
