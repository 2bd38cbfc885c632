// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core error taxonomy.

use thiserror::Error;

/// Why an agent currently lacks capacity to take on more work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityReason {
    WorkloadFull,
    RateLimited,
    SessionBusy,
}

crate::simple_display! {
    CapacityReason {
        WorkloadFull => "workload_full",
        RateLimited => "rate_limited",
        SessionBusy => "session_busy",
    }
}

/// The taxonomy of errors produced at the core's boundaries.
///
/// Each variant maps to a stable error code string via [`CoreError::code`],
/// which CLI/daemon layers translate into exit codes and HTTP statuses.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: &'static str, key: String },

    #[error("invalid status transition {from} -> {to} (allowed: {allowed:?})")]
    InvalidStatus { from: String, to: String, allowed: Vec<String> },

    #[error("entity is immutable: {id}")]
    Immutable { id: String },

    #[error("agent {agent_id} has no capacity: {reason}")]
    Capacity { agent_id: String, reason: CapacityReason },

    #[error("cannot resume session {session_id}: {reason}")]
    InvalidResume { session_id: String, reason: String },

    #[error("{operation} timed out after {bound_ms}ms")]
    Timeout { operation: String, bound_ms: u64 },

    #[error("transient error: {message} (retryable={retryable})")]
    Transient { message: String, retryable: bool },

    #[error("fatal error: {message}")]
    Fatal { message: String },
}

impl CoreError {
    /// Stable error code string surfaced to callers, independent of the
    /// human-readable message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::AlreadyExists { .. } => "already_exists",
            Self::InvalidStatus { .. } => "invalid_status",
            Self::Immutable { .. } => "immutable",
            Self::Capacity { .. } => "capacity",
            Self::InvalidResume { .. } => "invalid_resume",
            Self::Timeout { .. } => "timeout",
            Self::Transient { .. } => "transient",
            Self::Fatal { .. } => "fatal",
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub fn already_exists(kind: &'static str, key: impl Into<String>) -> Self {
        Self::AlreadyExists { kind, key: key.into() }
    }

    pub fn invalid_status(
        from: impl Into<String>,
        to: impl Into<String>,
        allowed: Vec<String>,
    ) -> Self {
        Self::InvalidStatus { from: from.into(), to: to.into(), allowed }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
