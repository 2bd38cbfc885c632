// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document entity: versioned content with a chain-root predecessor pointer.

use crate::entity::EntityMeta;
use crate::error::{CoreError, CoreResult};
use crate::id::DocumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_CONTENT_SIZE: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Markdown,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Spec,
    Design,
    Runbook,
    Adr,
    Readme,
    Changelog,
    Api,
    Guide,
    Postmortem,
    Meeting,
    Proposal,
    Reference,
    Note,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Active,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub id: DocumentId,
    pub content_type: ContentType,
    pub content: String,
    pub version: u64,
    /// `None` iff `version == 1`; otherwise the id of the first version in
    /// the chain (not the immediate predecessor).
    pub previous_version_id: Option<DocumentId>,
    pub category: DocumentCategory,
    pub status: DocumentStatus,
    pub immutable: bool,
}

impl Document {
    pub fn validate_content(content_type: ContentType, content: &str) -> CoreResult<()> {
        if content.len() > MAX_CONTENT_SIZE {
            return Err(CoreError::Validation {
                field: "content".into(),
                message: format!("exceeds {MAX_CONTENT_SIZE} bytes"),
            });
        }
        if content_type == ContentType::Json {
            serde_json::from_str::<serde_json::Value>(content).map_err(|e| {
                CoreError::Validation { field: "content".into(), message: format!("invalid json: {e}") }
            })?;
        }
        Ok(())
    }

    /// Update content in place, bumping `version` and stamping the chain
    /// root into `previous_version_id` if this is the second version.
    pub fn update_content(&mut self, content: String, now: DateTime<Utc>) -> CoreResult<()> {
        if self.immutable {
            return Err(CoreError::Immutable { id: self.id.to_string() });
        }
        Self::validate_content(self.content_type, &content)?;
        let chain_root = self.previous_version_id.unwrap_or(self.id);
        self.content = content;
        self.version += 1;
        self.previous_version_id = Some(chain_root);
        self.meta.touch(now);
        Ok(())
    }

    /// Create a new version record with the given content, rooted at this
    /// document's chain (used by `rollback`, which never mutates history).
    pub fn fork_version(&self, new_id: DocumentId, content: String, now: DateTime<Utc>) -> Document {
        let chain_root = self.previous_version_id.unwrap_or(self.id);
        Document {
            meta: EntityMeta::new(new_id.to_string(), "document", self.meta.created_by.clone(), now),
            id: new_id,
            content_type: self.content_type,
            content,
            version: self.version + 1,
            previous_version_id: Some(chain_root),
            category: self.category,
            status: self.status,
            immutable: false,
        }
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
