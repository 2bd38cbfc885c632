// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps errors onto process exit codes (validation=2, not_found=4,
//! invalid_arguments=3; everything else falls back to 1).

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<sf_core::CoreError> for ExitError {
    fn from(error: sf_core::CoreError) -> Self {
        let code = match &error {
            sf_core::CoreError::Validation { .. } => 2,
            sf_core::CoreError::NotFound { .. } => 4,
            sf_core::CoreError::InvalidArguments { .. } => 3,
            _ => 1,
        };
        Self::new(code, error.to_string())
    }
}

impl From<crate::client::ClientError> for ExitError {
    fn from(error: crate::client::ClientError) -> Self {
        Self::new(1, error.to_string())
    }
}

/// The daemon only ever reports an engine/core error code string over the
/// wire (see `Response::Error`); `NotFound` is its own response variant.
pub fn from_error_response(code: &str, message: &str) -> ExitError {
    let exit = match code {
        "validation" => 2,
        "not_found" => 4,
        "invalid_arguments" => 3,
        _ => 1,
    };
    ExitError::new(exit, message.to_string())
}
