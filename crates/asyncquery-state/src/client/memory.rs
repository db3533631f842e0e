// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory document store backend.
//!
//! Implements [`DocumentClient`] with per-index document maps guarded by a
//! single async lock. Because every operation holds the lock for its full
//! duration, writes are serialized per process and the seqNo/primaryTerm
//! semantics match the contract exactly: exactly one of two conditional
//! writers presenting the same stale token can succeed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ClientError, Document, DocumentClient, SearchOutcome, SystemAuth, VersionToken};

/// In-memory [`DocumentClient`] backend.
///
/// Cloning is cheap; clones share the same underlying indexes.
#[derive(Clone)]
pub struct MemoryClient {
    auth: SystemAuth,
    indices: Arc<RwLock<HashMap<String, MemoryIndex>>>,
}

struct MemoryIndex {
    mapping: String,
    settings: String,
    next_seq_no: i64,
    primary_term: i64,
    docs: HashMap<String, StoredDoc>,
}

struct StoredDoc {
    source: Value,
    token: VersionToken,
}

impl MemoryIndex {
    fn new(mapping: &str, settings: &str) -> Self {
        Self {
            mapping: mapping.to_string(),
            settings: settings.to_string(),
            next_seq_no: 0,
            primary_term: 1,
            docs: HashMap::new(),
        }
    }

    fn issue_token(&mut self) -> VersionToken {
        let token = VersionToken::new(self.next_seq_no, self.primary_term);
        self.next_seq_no += 1;
        token
    }
}

impl MemoryClient {
    /// Create an empty in-memory backend running under the given credential.
    pub fn new(auth: SystemAuth) -> Self {
        Self {
            auth,
            indices: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The credential this client was constructed with.
    pub fn auth(&self) -> &SystemAuth {
        &self.auth
    }

    /// The mapping an index was created with, if the index exists.
    pub async fn index_mapping(&self, index: &str) -> Option<String> {
        self.indices
            .read()
            .await
            .get(index)
            .map(|idx| idx.mapping.clone())
    }

    /// The settings an index was created with, if the index exists.
    pub async fn index_settings(&self, index: &str) -> Option<String> {
        self.indices
            .read()
            .await
            .get(index)
            .map(|idx| idx.settings.clone())
    }
}

#[async_trait]
impl DocumentClient for MemoryClient {
    async fn index_exists(&self, index: &str) -> Result<bool, ClientError> {
        Ok(self.indices.read().await.contains_key(index))
    }

    async fn create_index(
        &self,
        index: &str,
        mapping: &str,
        settings: &str,
    ) -> Result<(), ClientError> {
        let mut indices = self.indices.write().await;
        if indices.contains_key(index) {
            return Err(ClientError::Transport {
                operation: "create_index".to_string(),
                details: format!("index '{}' already exists", index),
            });
        }
        indices.insert(index.to_string(), MemoryIndex::new(mapping, settings));
        debug!(index = %index, principal = %self.auth.principal(), "Index created");
        Ok(())
    }

    async fn create_doc(
        &self,
        index: &str,
        id: &str,
        source: &Value,
    ) -> Result<VersionToken, ClientError> {
        let mut indices = self.indices.write().await;
        let idx = indices
            .get_mut(index)
            .ok_or_else(|| ClientError::IndexNotFound {
                index: index.to_string(),
            })?;
        if idx.docs.contains_key(id) {
            return Err(ClientError::DocumentExists { id: id.to_string() });
        }
        let token = idx.issue_token();
        idx.docs.insert(
            id.to_string(),
            StoredDoc {
                source: source.clone(),
                token,
            },
        );
        Ok(token)
    }

    async fn get_doc(&self, index: &str, id: &str) -> Result<Option<Document>, ClientError> {
        let indices = self.indices.read().await;
        let idx = indices.get(index).ok_or_else(|| ClientError::IndexNotFound {
            index: index.to_string(),
        })?;
        Ok(idx.docs.get(id).map(|doc| Document {
            source: doc.source.clone(),
            token: doc.token,
        }))
    }

    async fn update_doc(
        &self,
        index: &str,
        id: &str,
        source: &Value,
        token: VersionToken,
    ) -> Result<VersionToken, ClientError> {
        let mut indices = self.indices.write().await;
        let idx = indices
            .get_mut(index)
            .ok_or_else(|| ClientError::IndexNotFound {
                index: index.to_string(),
            })?;
        // Token comparison must happen before the new token is issued.
        let current = idx
            .docs
            .get(id)
            .map(|doc| doc.token)
            .ok_or_else(|| ClientError::DocumentMissing { id: id.to_string() })?;
        if current != token {
            return Err(ClientError::VersionConflict { id: id.to_string() });
        }
        let new_token = idx.issue_token();
        idx.docs.insert(
            id.to_string(),
            StoredDoc {
                source: source.clone(),
                token: new_token,
            },
        );
        Ok(new_token)
    }

    async fn search_term(
        &self,
        index: &str,
        field: &str,
        value: &str,
    ) -> Result<SearchOutcome, ClientError> {
        let indices = self.indices.read().await;
        let idx = indices.get(index).ok_or_else(|| ClientError::IndexNotFound {
            index: index.to_string(),
        })?;
        let hits = idx
            .docs
            .values()
            .filter(|doc| doc.source.get(field).and_then(Value::as_str) == Some(value))
            .map(|doc| doc.source.clone())
            .collect();
        Ok(SearchOutcome { status: 200, hits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> MemoryClient {
        MemoryClient::new(SystemAuth::new("test"))
    }

    #[tokio::test]
    async fn test_create_and_get_doc() {
        let client = client();
        client.create_index("idx", "mapping", "settings").await.unwrap();

        let token = client
            .create_doc("idx", "doc-1", &json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(token, VersionToken::new(0, 1));

        let doc = client.get_doc("idx", "doc-1").await.unwrap().unwrap();
        assert_eq!(doc.source, json!({"a": 1}));
        assert_eq!(doc.token, token);

        assert!(client.get_doc("idx", "doc-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_doc_collision() {
        let client = client();
        client.create_index("idx", "m", "s").await.unwrap();
        client.create_doc("idx", "doc-1", &json!({})).await.unwrap();

        let err = client
            .create_doc("idx", "doc-1", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::DocumentExists { id } if id == "doc-1"));
    }

    #[tokio::test]
    async fn test_missing_index_signalled() {
        let client = client();
        let err = client.get_doc("nope", "doc-1").await.unwrap_err();
        assert!(matches!(err, ClientError::IndexNotFound { index } if index == "nope"));

        let err = client
            .create_doc("nope", "doc-1", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::IndexNotFound { .. }));

        let err = client.search_term("nope", "f", "v").await.unwrap_err();
        assert!(matches!(err, ClientError::IndexNotFound { .. }));
    }

    #[tokio::test]
    async fn test_conditional_update() {
        let client = client();
        client.create_index("idx", "m", "s").await.unwrap();
        let token = client
            .create_doc("idx", "doc-1", &json!({"n": 1}))
            .await
            .unwrap();

        let bumped = client
            .update_doc("idx", "doc-1", &json!({"n": 2}), token)
            .await
            .unwrap();
        assert_ne!(bumped, token);

        // Stale token is rejected.
        let err = client
            .update_doc("idx", "doc-1", &json!({"n": 3}), token)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::VersionConflict { id } if id == "doc-1"));

        // Missing document is distinguishable from a conflict.
        let err = client
            .update_doc("idx", "gone", &json!({}), bumped)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::DocumentMissing { id } if id == "gone"));
    }

    #[tokio::test]
    async fn test_search_term_matches() {
        let client = client();
        client.create_index("idx", "m", "s").await.unwrap();
        client
            .create_doc("idx", "a", &json!({"jobRunId": "job-1", "n": 1}))
            .await
            .unwrap();
        client
            .create_doc("idx", "b", &json!({"jobRunId": "job-2", "n": 2}))
            .await
            .unwrap();

        let outcome = client.search_term("idx", "jobRunId", "job-1").await.unwrap();
        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0]["n"], json!(1));

        let outcome = client.search_term("idx", "jobRunId", "job-9").await.unwrap();
        assert!(outcome.hits.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let client = client();
        client.create_index("idx", "m", "s").await.unwrap();
        let clone = client.clone();
        clone.create_doc("idx", "doc-1", &json!({})).await.unwrap();
        assert!(client.get_doc("idx", "doc-1").await.unwrap().is_some());
    }
}
