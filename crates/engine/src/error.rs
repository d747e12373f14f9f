// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors for the orchestrator

use thiserror::Error;
use tro_storage::StoreError;

/// Errors that can occur in the orchestrator
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("persistence error: {0}")]
    Store(#[from] StoreError),
}
