// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Common entity envelope shared by every persistent entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fields every persistent entity carries in addition to its own data.
///
/// Embedded by value (not wrapped) into each entity struct, matching the
/// flattened-struct convention used throughout this codebase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityMeta {
    pub id: String,
    pub kind: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub version: u64,
}

impl EntityMeta {
    pub fn new(id: impl Into<String>, kind: &'static str, created_by: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind,
            created_at: now,
            updated_at: now,
            created_by: created_by.into(),
            tags: Vec::new(),
            metadata: HashMap::new(),
            version: 1,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_bumps_version_and_updated_at() {
        let t0 = DateTime::from_timestamp_millis(0).unwrap_or_default();
        let t1 = DateTime::from_timestamp_millis(1000).unwrap_or_default();
        let mut meta = EntityMeta::new("task1", "task", "system", t0);
        assert_eq!(meta.version, 1);
        meta.touch(t1);
        assert_eq!(meta.version, 2);
        assert_eq!(meta.updated_at, t1);
        assert_eq!(meta.created_at, t0);
    }
}
