// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A static `ProviderRegistry` backed by a fixed name -> provider map,
//! suitable for the daemon binary's startup wiring.

use sf_core::{HeadlessProvider, InteractiveProvider, ProviderRegistry};
use std::collections::HashMap;

#[derive(Default)]
pub struct StaticProviderRegistry {
    headless: HashMap<String, Box<dyn HeadlessProvider>>,
    interactive: HashMap<String, Box<dyn InteractiveProvider>>,
}

impl StaticProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headless(mut self, name: impl Into<String>, provider: Box<dyn HeadlessProvider>) -> Self {
        self.headless.insert(name.into(), provider);
        self
    }

    pub fn with_interactive(mut self, name: impl Into<String>, provider: Box<dyn InteractiveProvider>) -> Self {
        self.interactive.insert(name.into(), provider);
        self
    }
}

impl ProviderRegistry for StaticProviderRegistry {
    fn headless(&self, provider: &str) -> Option<&dyn HeadlessProvider> {
        self.headless.get(provider).map(|b| b.as_ref())
    }

    fn interactive(&self, provider: &str) -> Option<&dyn InteractiveProvider> {
        self.interactive.get(provider).map(|b| b.as_ref())
    }
}
