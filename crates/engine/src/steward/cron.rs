// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron semantics (§4.5.2): 5- or 6-field expressions (minute, hour,
//! day-of-month, month, day-of-week; an optional leading seconds field is
//! parsed but not used for scheduling). Backed by the `cron` crate, which
//! natively speaks `*`, numeric literals, `a-b` ranges, `a,b,c` lists, and
//! `*/n` steps.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

/// A parsed cron trigger. Always carries a seconds field internally
/// (defaulted to `0`) since the `cron` crate requires one.
pub struct CronSchedule {
    schedule: Schedule,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, String> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        let normalized = match fields.len() {
            5 => format!("0 {expr}"),
            // The leading field is parsed but ignored for scheduling (§4.5.2):
            // zero it out rather than forwarding it into the `cron` crate's
            // seconds slot, where it would otherwise genuinely participate.
            6 => format!("0 {}", fields[1..].join(" ")),
            n => return Err(format!("expected 5 or 6 fields, got {n}: {expr:?}")),
        };
        let schedule = Schedule::from_str(&normalized).map_err(|e| e.to_string())?;
        Ok(Self { schedule })
    }

    /// Next fire instant strictly after `now`, starting the search at
    /// `now + 1 minute` per §4.5.2. `None` only if the expression can never
    /// match (the `cron` crate's iterator is otherwise unbounded, but in
    /// practice every supported expression matches within a year).
    pub fn next_fire(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let after = now + chrono::Duration::minutes(1);
        self.schedule.after(&after).next()
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
