// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for asyncquery-state.
//!
//! Provides a unified error type covering the state store and the lifecycle
//! entities built on top of it.

use std::fmt;

/// Result type using StateStoreError
pub type Result<T> = std::result::Result<T, StateStoreError>;

/// Errors that can occur while coordinating query state.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum StateStoreError {
    /// A create targeted a document id that already exists.
    DocumentAlreadyExists {
        /// The document id that collided.
        id: String,
    },

    /// An update targeted a document id with no backing document.
    DocumentNotFound {
        /// The document id that was not found.
        id: String,
    },

    /// A conditional update presented a stale seqNo/primaryTerm pair.
    VersionConflict {
        /// The document id that was concurrently updated.
        id: String,
    },

    /// A statement was submitted twice under the same identifiers.
    StatementAlreadyExists {
        /// The statement id that already exists.
        statement_id: String,
    },

    /// A statement operation targeted an id with no backing document.
    StatementNotFound {
        /// The statement id that was not found.
        statement_id: String,
    },

    /// A statement in the running state cannot be cancelled.
    ///
    /// The display text names the waiting state; the guard is on the running
    /// state. Both are kept verbatim from the legacy wire behavior.
    StatementRunning {
        /// The statement id.
        statement_id: String,
    },

    /// A statement cancellation lost the CAS race to a concurrent writer.
    StatementCancelConflict {
        /// The statement id.
        statement_id: String,
        /// The state observed after re-reading the document.
        state: String,
    },

    /// Transport, serialization, or index-provisioning failure talking to
    /// the backing store.
    Storage {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },
}

impl StateStoreError {
    /// Build a storage error with operation context.
    pub fn storage(operation: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            details: details.into(),
        }
    }

    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DocumentAlreadyExists { .. } => "DOCUMENT_ALREADY_EXISTS",
            Self::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::StatementAlreadyExists { .. } => "STATEMENT_ALREADY_EXISTS",
            Self::StatementNotFound { .. } => "STATEMENT_NOT_FOUND",
            Self::StatementRunning { .. } => "STATEMENT_RUNNING",
            Self::StatementCancelConflict { .. } => "STATEMENT_CANCEL_CONFLICT",
            Self::Storage { .. } => "STORAGE_ERROR",
        }
    }
}

impl fmt::Display for StateStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocumentAlreadyExists { id } => {
                write!(f, "Document '{}' already exists", id)
            }
            Self::DocumentNotFound { id } => {
                write!(f, "Document '{}' not found", id)
            }
            Self::VersionConflict { id } => {
                write!(f, "Version conflict updating document '{}'", id)
            }
            Self::StatementAlreadyExists { statement_id } => {
                write!(f, "statement already exist. {}", statement_id)
            }
            Self::StatementNotFound { statement_id } => {
                write!(
                    f,
                    "cancel statement failed. no statement found. statement: {}.",
                    statement_id
                )
            }
            Self::StatementRunning { statement_id } => {
                write!(
                    f,
                    "can't cancel statement in waiting state. statement: {}.",
                    statement_id
                )
            }
            Self::StatementCancelConflict {
                statement_id,
                state,
            } => {
                write!(
                    f,
                    "cancel statement failed. current statementState: {} statement: {}.",
                    state, statement_id
                )
            }
            Self::Storage { operation, details } => {
                write!(f, "Storage error during '{}': {}", operation, details)
            }
        }
    }
}

impl std::error::Error for StateStoreError {}

impl From<serde_json::Error> for StateStoreError {
    fn from(err: serde_json::Error) -> Self {
        StateStoreError::Storage {
            operation: "json".to_string(),
            details: err.to_string(),
        }
    }
}
