// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state handed to each accepted connection.

use sf_core::{Clock, Settings, Store};
use sf_engine::{AgentRegistry, DispatchDaemon, StewardScheduler, TaskAssignment};
use sf_sync::{SyncDaemon, SyncEngine};
use std::sync::Arc;
use std::time::Instant;

use crate::steward_driver::StewardDriver;

pub struct AppState<C: Clock> {
    pub store: Arc<dyn Store>,
    pub settings: Arc<dyn Settings>,
    pub clock: C,
    pub agents: AgentRegistry<C>,
    pub tasks: TaskAssignment<C>,
    pub dispatch: Arc<DispatchDaemon<C>>,
    pub steward: Arc<StewardScheduler<C>>,
    pub steward_driver: Arc<StewardDriver<C>>,
    pub sync_engine: Arc<SyncEngine<C>>,
    pub sync_daemon: Arc<SyncDaemon<C>>,
    pub started_at: Instant,
}

impl<C: Clock> AppState<C> {
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
