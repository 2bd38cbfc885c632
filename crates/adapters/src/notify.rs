// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `NotifyAdapter`: desktop and log notifications for dispatch/steward
//! outcomes. Falls back to a `tracing::info!` line when desktop
//! notifications are unavailable (headless daemon hosts, CI).

use tracing::info;

pub struct NotifyAdapter {
    desktop_enabled: bool,
}

impl NotifyAdapter {
    pub fn new(desktop_enabled: bool) -> Self {
        Self { desktop_enabled }
    }

    pub fn notify(&self, summary: &str, body: &str) {
        if self.desktop_enabled {
            if let Err(e) = notify_rust::Notification::new().summary(summary).body(body).show() {
                info!(error = %e, summary, body, "desktop notification failed, falling back to log");
            }
        } else {
            info!(summary, body, "notification");
        }
    }

    pub fn session_completed(&self, agent_name: &str, task_title: &str) {
        self.notify("Stoneforge", &format!("{agent_name} finished: {task_title}"));
    }

    pub fn session_failed(&self, agent_name: &str, reason: &str) {
        self.notify("Stoneforge", &format!("{agent_name} failed: {reason}"));
    }

    pub fn steward_executed(&self, agent_name: &str, success: bool) {
        let outcome = if success { "succeeded" } else { "failed" };
        self.notify("Stoneforge steward", &format!("{agent_name} {outcome}"));
    }
}

impl Default for NotifyAdapter {
    fn default() -> Self {
        Self::new(false)
    }
}
