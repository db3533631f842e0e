// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Document store client boundary.
//!
//! This module defines the interface the state store consumes from the
//! backing document store, plus the in-memory backend implementation.

pub mod memory;

pub use self::memory::MemoryClient;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

/// Sentinel sequence number for a record that was never persisted.
pub const UNASSIGNED_SEQ_NO: i64 = -1;

/// Sentinel primary term for a record that was never persisted.
pub const UNASSIGNED_PRIMARY_TERM: i64 = -1;

/// CAS token identifying the exact version of a document a writer last
/// observed.
///
/// The store issues a fresh pair on every successful write; a conditional
/// write presenting a pair other than the document's current one is rejected
/// with [`ClientError::VersionConflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionToken {
    /// Sequence number assigned by the store.
    pub seq_no: i64,
    /// Primary term (epoch) assigned by the store.
    pub primary_term: i64,
}

impl VersionToken {
    /// Token carried by a record that has not been persisted yet.
    pub const UNASSIGNED: Self = Self {
        seq_no: UNASSIGNED_SEQ_NO,
        primary_term: UNASSIGNED_PRIMARY_TERM,
    };

    /// Create a token from a store-issued pair.
    pub fn new(seq_no: i64, primary_term: i64) -> Self {
        Self {
            seq_no,
            primary_term,
        }
    }

    /// Whether this token was issued by the store.
    pub fn is_assigned(&self) -> bool {
        self.seq_no != UNASSIGNED_SEQ_NO
    }
}

impl Default for VersionToken {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(seq_no={}, primary_term={})", self.seq_no, self.primary_term)
    }
}

/// System-level credential under which all subsystem store calls run.
///
/// Store access bypasses caller-level permissions; the credential is passed
/// explicitly into client construction and is scoped to this subsystem only.
#[derive(Debug, Clone)]
pub struct SystemAuth {
    principal: String,
}

impl SystemAuth {
    /// Create a credential for the given system principal.
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
        }
    }

    /// The system principal name.
    pub fn principal(&self) -> &str {
        &self.principal
    }
}

/// A document read back from the store.
#[derive(Debug, Clone)]
pub struct Document {
    /// The serialized document body.
    pub source: Value,
    /// The document's current CAS token.
    pub token: VersionToken,
}

/// Outcome of a term search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// HTTP-like status of the search response.
    pub status: u16,
    /// Source bodies of the matching documents.
    pub hits: Vec<Value>,
}

/// Errors surfaced by a document store client.
///
/// The variants the state store branches on (`IndexNotFound`,
/// `DocumentExists`, `DocumentMissing`, `VersionConflict`) must be
/// distinguishable from the transport catch-all.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ClientError {
    /// The target index does not exist.
    IndexNotFound {
        /// The index that was not found.
        index: String,
    },

    /// A create-if-absent write collided with an existing document id.
    DocumentExists {
        /// The colliding document id.
        id: String,
    },

    /// A conditional update targeted a document that no longer exists.
    DocumentMissing {
        /// The missing document id.
        id: String,
    },

    /// A conditional write presented a stale CAS token.
    VersionConflict {
        /// The conflicting document id.
        id: String,
    },

    /// Transport or store-internal failure.
    Transport {
        /// The operation that failed.
        operation: String,
        /// Error details.
        details: String,
    },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexNotFound { index } => write!(f, "Index '{}' not found", index),
            Self::DocumentExists { id } => write!(f, "Document '{}' already exists", id),
            Self::DocumentMissing { id } => write!(f, "Document '{}' is missing", id),
            Self::VersionConflict { id } => {
                write!(f, "Version conflict on document '{}'", id)
            }
            Self::Transport { operation, details } => {
                write!(f, "Transport error during '{}': {}", operation, details)
            }
        }
    }
}

impl std::error::Error for ClientError {}

/// Document store operations consumed by the state store.
///
/// Every write blocks until its effects are visible to a subsequent read of
/// the same index; every read forces a refresh first. Implementations
/// serialize concurrent conditional writes per document id, so exactly one
/// of two writers presenting the same stale token can succeed.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Whether the given index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, ClientError>;

    /// Create an index with the given mapping and settings.
    ///
    /// Fails if the index already exists or the store does not acknowledge
    /// the creation.
    async fn create_index(
        &self,
        index: &str,
        mapping: &str,
        settings: &str,
    ) -> Result<(), ClientError>;

    /// Create a document if the id is absent, returning the assigned token.
    ///
    /// Fails with [`ClientError::DocumentExists`] on id collision and
    /// [`ClientError::IndexNotFound`] when the index is absent.
    async fn create_doc(
        &self,
        index: &str,
        id: &str,
        source: &Value,
    ) -> Result<VersionToken, ClientError>;

    /// Fetch a document by id, refreshing the index first.
    ///
    /// Returns `Ok(None)` when the document is absent and
    /// [`ClientError::IndexNotFound`] when the index itself is absent.
    async fn get_doc(&self, index: &str, id: &str) -> Result<Option<Document>, ClientError>;

    /// Conditionally replace a document, presenting the caller's CAS token.
    ///
    /// Fails with [`ClientError::VersionConflict`] when the token is stale
    /// and [`ClientError::DocumentMissing`] when the document disappeared.
    async fn update_doc(
        &self,
        index: &str,
        id: &str,
        source: &Value,
        token: VersionToken,
    ) -> Result<VersionToken, ClientError>;

    /// Exact-term search over an index.
    ///
    /// Fails with [`ClientError::IndexNotFound`] when the index is absent.
    async fn search_term(
        &self,
        index: &str,
        field: &str,
        value: &str,
    ) -> Result<SearchOutcome, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassigned_token() {
        let token = VersionToken::UNASSIGNED;
        assert!(!token.is_assigned());
        assert_eq!(token, VersionToken::default());

        let assigned = VersionToken::new(0, 1);
        assert!(assigned.is_assigned());
        assert_ne!(assigned, token);
    }

    #[test]
    fn test_token_display() {
        let token = VersionToken::new(3, 1);
        assert_eq!(token.to_string(), "(seq_no=3, primary_term=1)");
    }

    #[test]
    fn test_system_auth_principal() {
        let auth = SystemAuth::new("asyncquery-state");
        assert_eq!(auth.principal(), "asyncquery-state");
    }
}
