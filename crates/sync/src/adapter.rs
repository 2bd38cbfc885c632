// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SyncAdapter`: the external collaborator contract a provider (GitHub
//! Issues, Linear, ...) implements. The Sync Engine depends only on this
//! trait; concrete wire protocols are out of scope.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sf_core::ExternalFields;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("external item {0} not found")]
    NotFound(String),
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
}

/// One remote item as returned by `list_since`.
#[derive(Debug, Clone)]
pub struct ExternalItem {
    pub external_id: String,
    pub url: Option<String>,
    pub fields: ExternalFields,
    pub updated_at: DateTime<Utc>,
    /// `true` when the remote item is open (drives the closed/archived
    /// reopen-on-pull policy, §4.8.3).
    pub is_open: bool,
}

#[async_trait]
pub trait SyncAdapter: Send + Sync {
    /// Pushes local field changes to the remote item.
    async fn update(&self, external_id: &str, fields: &ExternalFields) -> Result<(), AdapterError>;

    /// Lists remote items updated since `cursor` (exclusive) for one project.
    async fn list_since(&self, project: &str, cursor: DateTime<Utc>) -> Result<Vec<ExternalItem>, AdapterError>;
}
