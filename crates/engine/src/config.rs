// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-wide tunables for the Dispatch Daemon and Steward Scheduler.

use std::time::Duration;

/// Built with field-level defaults and the workspace's `setters!` macro
/// rather than a generic config-framework dependency; loadable from the
/// daemon's TOML config file via `toml`.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub poll_interval: Duration,
    pub max_per_tick: usize,
    pub shutdown_timeout: Duration,
    pub steward_execution_timeout: Duration,
    pub steward_history_capacity: usize,
    /// §4.4.1/§5: how long the Spawner waits for a provider's `system/init`
    /// event before failing the spawn.
    pub spawn_init_timeout: Duration,
}

impl DaemonConfig {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(5_000),
            max_per_tick: 10,
            shutdown_timeout: Duration::from_secs(10),
            steward_execution_timeout: Duration::from_secs(300),
            steward_history_capacity: 100,
            spawn_init_timeout: crate::spawner::DEFAULT_SPAWN_INIT_TIMEOUT,
        }
    }

    sf_core::setters! {
        set { poll_interval: Duration, max_per_tick: usize, shutdown_timeout: Duration }
        set { steward_execution_timeout: Duration, steward_history_capacity: usize }
        set { spawn_init_timeout: Duration }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::new()
    }
}
