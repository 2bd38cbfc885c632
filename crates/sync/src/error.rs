// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SyncError`: the External Sync Engine's boundary error type.

use crate::adapter::AdapterError;
use sf_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("element {0} has no provider field map registered")]
    NoFieldMap(String),

    #[error("unsupported adapter type for element {0}")]
    UnsupportedAdapterType(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
