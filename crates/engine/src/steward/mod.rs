// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steward Scheduler (§4.5): cron + event triggers, a sandboxed condition
//! evaluator, and bounded per-steward execution history.

pub mod condition;
pub mod cron;
pub mod scheduler;

pub use cron::CronSchedule;
pub use scheduler::{
    ClosureExecutor, StewardExecutionContext, StewardExecutionOutcome, StewardExecutor, StewardScheduler,
};
