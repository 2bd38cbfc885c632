// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives `StewardScheduler`'s cron triggers: the scheduler itself only
//! exposes `next_cron_fire`/`fire_cron`, so this is the sleep-until-due loop
//! a daemon process wraps it in, mirroring `DispatchDaemon::start`'s
//! interval-loop shape.

use parking_lot::Mutex;
use sf_core::Clock;
use sf_engine::StewardScheduler;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on how long the driver sleeps between `next_cron_fire`
/// checks when nothing is due yet, so newly registered stewards are picked
/// up promptly rather than only at the next scheduled fire.
const POLL_FLOOR: Duration = Duration::from_secs(1);

pub struct StewardDriver<C: Clock> {
    scheduler: Arc<StewardScheduler<C>>,
    clock: C,
    running: AtomicBool,
    loop_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl<C: Clock> StewardDriver<C> {
    pub fn new(scheduler: Arc<StewardScheduler<C>>, clock: C) -> Self {
        Self { scheduler, clock, running: AtomicBool::new(false), loop_handle: Mutex::new(None) }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let driver = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                if !driver.running.load(Ordering::SeqCst) {
                    break;
                }
                let now = driver.clock.utc_now();
                let sleep_for = match driver.scheduler.next_cron_fire(now) {
                    Some((agent_id, fire_at)) if fire_at <= now => {
                        driver.scheduler.fire_cron(agent_id).await;
                        continue;
                    }
                    Some((_, fire_at)) => (fire_at - now).to_std().unwrap_or(POLL_FLOOR).min(POLL_FLOOR),
                    None => POLL_FLOOR,
                };
                tokio::time::sleep(sleep_for).await;
            }
        });
        *self.loop_handle.lock() = Some(handle);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.loop_handle.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::{Agent, EntityMeta, FakeClock, RoleConfig, Store, Trigger};
    use sf_storage::MemoryStore;
    use std::sync::atomic::AtomicUsize;

    struct CountingExecutor {
        count: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl sf_engine::StewardExecutor for CountingExecutor {
        async fn execute(&self, _ctx: sf_engine::StewardExecutionContext) -> sf_engine::StewardExecutionOutcome {
            self.count.fetch_add(1, Ordering::SeqCst);
            sf_engine::StewardExecutionOutcome {
                success: true,
                output: None,
                error: None,
                items_processed: None,
                duration_ms: 1,
                manual: false,
            }
        }
    }

    #[tokio::test]
    async fn driver_fires_a_due_cron_steward() {
        let clock = FakeClock::new();
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let agent_id = sf_core::AgentId::new();
        let agent = Agent {
            meta: EntityMeta::new(agent_id.to_string(), "agent", "system", clock.utc_now()),
            id: agent_id,
            name: "steward-1".into(),
            role_config: RoleConfig::Steward {
                steward_focus: sf_core::StewardFocus::Custom,
                triggers: vec![Trigger::Cron { schedule: "* * * * * *".into() }],
            },
            max_concurrent_tasks: 1,
            session_status: sf_core::AgentSessionStatus::Idle,
            session_id: None,
            channel_id: None,
            provider: None,
            model: None,
            reports_to: None,
        };
        store.put_agent(agent).await.unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let executor = Arc::new(CountingExecutor { count: count.clone() });
        let scheduler = Arc::new(StewardScheduler::new(store, executor, clock.clone()));
        scheduler.start(true).await.unwrap();

        let (_, fire_at) = scheduler.next_cron_fire(clock.utc_now()).expect("a cron job should be registered");

        let driver = Arc::new(StewardDriver::new(scheduler, clock.clone()));
        driver.start();

        let remaining = (fire_at - clock.utc_now()).to_std().unwrap_or(Duration::from_secs(1));
        clock.advance(remaining + Duration::from_millis(10));
        // The driver's poll loop wakes at most once a second; give it two
        // ticks of real time to notice the advanced clock.
        tokio::time::sleep(Duration::from_millis(2_100)).await;
        driver.stop();

        assert!(count.load(Ordering::SeqCst) >= 1);
    }
}
