// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Settings`: the external key/value collaborator used for sync cursors
//! and provider configuration.

use crate::error::CoreResult;
use async_trait::async_trait;

#[async_trait]
pub trait Settings: Send + Sync {
    async fn get(&self, key: &str) -> CoreResult<Option<String>>;
    async fn set(&self, key: &str, value: String) -> CoreResult<()>;
    async fn delete(&self, key: &str) -> CoreResult<()>;
}

/// Builds the `external_sync.cursor.<provider>.<project>.<adapterType>` key.
pub fn cursor_key(provider: &str, project: &str, adapter_type: &str) -> String {
    format!("external_sync.cursor.{provider}.{project}.{adapter_type}")
}

/// Builds the `external_sync.providers.<name>` key.
pub fn provider_config_key(name: &str) -> String {
    format!("external_sync.providers.{name}")
}
