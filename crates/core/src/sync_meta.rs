// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `_externalSync` metadata shape and the `TaskField` mapper contract.
//!
//! Only the Sync Engine writes this subtree of element metadata (single-
//! writer discipline); any other write to metadata must preserve it
//! verbatim via read-modify-write merging by key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const EXTERNAL_SYNC_METADATA_KEY: &str = "_externalSync";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterType {
    Task,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    Push,
    Pull,
    Bidirectional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    LastWriteWins,
    LocalWins,
    RemoteWins,
    Manual,
}

impl Default for ConflictStrategy {
    fn default() -> Self {
        Self::LastWriteWins
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalSyncState {
    pub provider: String,
    pub project: String,
    pub external_id: String,
    pub url: Option<String>,
    pub adapter_type: AdapterType,
    pub direction: SyncDirection,
    pub last_pushed_at: Option<DateTime<Utc>>,
    pub last_pushed_hash: Option<String>,
    pub last_pulled_at: Option<DateTime<Utc>>,
    pub last_pulled_hash: Option<String>,
}

impl ExternalSyncState {
    pub fn new(
        provider: impl Into<String>,
        project: impl Into<String>,
        external_id: impl Into<String>,
        adapter_type: AdapterType,
        direction: SyncDirection,
    ) -> Self {
        Self {
            provider: provider.into(),
            project: project.into(),
            external_id: external_id.into(),
            url: None,
            adapter_type,
            direction,
            last_pushed_at: None,
            last_pushed_hash: None,
            last_pulled_at: None,
            last_pulled_hash: None,
        }
    }

    pub fn is_pushable(&self) -> bool {
        !matches!(self.direction, SyncDirection::Pull)
    }
}

/// Generic fields an external element is mapped to/from, independent of the
/// concrete provider's wire shape (out of scope here).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalFields {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub task_type: Option<String>,
    pub tags: Vec<String>,
    pub assignee: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Converts between local task/document fields and a provider's external
/// representation. Implemented externally (per-provider wire protocols are
/// out of scope); the Sync Engine depends only on this trait.
pub trait TaskField: Send + Sync {
    fn to_external(&self, fields: &ExternalFields) -> ExternalFields {
        fields.clone()
    }
    fn from_external(&self, fields: &ExternalFields) -> ExternalFields {
        fields.clone()
    }
}
