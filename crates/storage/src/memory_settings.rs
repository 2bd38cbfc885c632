// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `Settings` key/value reference implementation.

use async_trait::async_trait;
use parking_lot::RwLock;
use sf_core::{CoreResult, Settings};
use std::collections::HashMap;

#[derive(Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Settings for MemorySettings {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> CoreResult<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CoreResult<()> {
        self.values.write().remove(key);
        Ok(())
    }
}
