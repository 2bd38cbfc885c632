// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External Sync Daemon (§4.9): drives the Sync Engine on an interval
//! clamped to `[10s, 30min]`, single-flight, with a retained `lastResult`.

use crate::engine::{PullTarget, SyncEngine, SyncOptions, SyncSummary};
use crate::error::SyncResult;
use parking_lot::Mutex;
use sf_core::Clock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const MIN_INTERVAL: Duration = Duration::from_secs(10);
pub const MAX_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Clamps a requested poll interval into `[MIN_INTERVAL, MAX_INTERVAL]`.
pub fn clamp_interval(requested: Duration) -> Duration {
    requested.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

#[derive(Debug, Clone)]
pub enum LastResult {
    Summary(SyncSummary),
    Error(String),
}

pub struct SyncDaemon<C: Clock> {
    engine: Arc<SyncEngine<C>>,
    targets: Vec<PullTarget>,
    interval: Duration,
    shutdown_timeout: Duration,
    running: AtomicBool,
    cycle_lock: tokio::sync::Mutex<()>,
    last_result: Mutex<Option<LastResult>>,
    loop_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl<C: Clock> SyncDaemon<C> {
    pub fn new(engine: Arc<SyncEngine<C>>, targets: Vec<PullTarget>, interval: Duration) -> Self {
        Self {
            engine,
            targets,
            interval: clamp_interval(interval),
            shutdown_timeout: Duration::from_secs(10),
            running: AtomicBool::new(false),
            cycle_lock: tokio::sync::Mutex::new(()),
            last_result: Mutex::new(None),
            loop_handle: Mutex::new(None),
        }
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn last_result(&self) -> Option<LastResult> {
        self.last_result.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let daemon = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(daemon.interval);
            loop {
                interval.tick().await;
                if !daemon.running.load(Ordering::SeqCst) {
                    break;
                }
                let Ok(_guard) = daemon.cycle_lock.try_lock() else {
                    tracing::debug!("sync cycle still in flight, skipping this tick");
                    continue;
                };
                daemon.run_cycle().await;
            }
        });
        *self.loop_handle.lock() = Some(handle);
    }

    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = tokio::time::timeout(self.shutdown_timeout, self.cycle_lock.lock()).await;
        if let Some(handle) = self.loop_handle.lock().take() {
            handle.abort();
        }
    }

    async fn run_cycle(&self) {
        match self.run_once().await {
            Ok(summary) => {
                tracing::info!(
                    pushed = summary.pushed,
                    pulled = summary.pulled,
                    created = summary.created,
                    skipped = summary.skipped,
                    conflicts = summary.conflicts,
                    errors = summary.errors,
                    "external sync cycle finished"
                );
                *self.last_result.lock() = Some(LastResult::Summary(summary));
            }
            Err(error) => {
                tracing::warn!(%error, "external sync cycle failed");
                *self.last_result.lock() = Some(LastResult::Error(error.to_string()));
            }
        }
    }

    async fn run_once(&self) -> SyncResult<SyncSummary> {
        self.engine.sync(&self.targets, &SyncOptions { all: true, ..Default::default() }).await
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
