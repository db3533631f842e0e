// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Generic CAS-based state store.
//!
//! Maintains the state of sessions, statements, and job metadata as versioned
//! documents, one index per data source. The engine depends only on the
//! [`StateModel`] interface, never on concrete entity types. All access runs
//! under the system credential the [`DocumentClient`] was constructed with,
//! regardless of caller permissions.

use serde_json::Value;
use tracing::{debug, info};

use crate::client::{ClientError, DocumentClient, VersionToken};
use crate::error::StateStoreError;

/// Fixed prefix of every per-data-source request index.
pub const REQUEST_BUFFER_INDEX_NAME: &str = ".query_execution_request";

/// Default index remote jobs write query output documents to.
pub const RESULT_BUFFER_INDEX_NAME: &str = ".query_execution_result";

/// Mapping template applied to every request index.
const REQUEST_INDEX_MAPPING: &str =
    include_str!("../resources/query_execution_request_mapping.yml");

/// Settings template applied to every request index.
const REQUEST_INDEX_SETTINGS: &str =
    include_str!("../resources/query_execution_request_settings.yml");

/// Request index name for a data source.
///
/// Index naming is the partitioning scheme: every data source gets its own
/// request index under the fixed prefix.
pub fn request_index_name(datasource_name: &str) -> String {
    format!("{}_{}", REQUEST_BUFFER_INDEX_NAME, datasource_name)
}

/// State field type for entities that are never transitioned after creation.
///
/// Uninhabited, so `update_state` cannot be called for such entities.
#[derive(Debug, Clone, Copy)]
pub enum NoTransition {}

/// A versioned record the state store can persist.
///
/// Implementations know how to construct themselves from a stored source,
/// copy themselves with a fresh CAS token, and copy themselves into the next
/// version with a replaced state field.
pub trait StateModel: Clone + Send + Sync {
    /// The entity's state field type.
    type State: Send + Sync;

    /// Stable document id, unique within the entity's index.
    fn id(&self) -> String;

    /// CAS token from the most recent read or write of this record.
    fn token(&self) -> VersionToken;

    /// Serialize the record body into a document source.
    fn to_source(&self) -> Result<Value, StateStoreError>;

    /// Parse a record back out of a stored source, adopting the given token.
    fn from_source(source: &Value, token: VersionToken) -> Result<Self, StateStoreError>;

    /// Copy this record with a store-assigned token.
    fn with_token(&self, token: VersionToken) -> Self;

    /// Copy this record into its next version with a replaced state field.
    fn with_state(&self, state: Self::State, token: VersionToken) -> Self;
}

/// CAS-based create/read/update engine over per-data-source indices.
pub struct StateStore<C: DocumentClient> {
    client: C,
}

impl<C: DocumentClient> StateStore<C> {
    /// Create a state store over the given document client.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Persist a brand-new record.
    ///
    /// Provisions the index first when absent. Fails with
    /// [`StateStoreError::DocumentAlreadyExists`] when the id is already
    /// live; the existing document is left unchanged. The write blocks until
    /// visible to subsequent reads.
    pub async fn create<T: StateModel>(
        &self,
        model: T,
        index_name: &str,
    ) -> Result<T, StateStoreError> {
        if !self.index_exists(index_name).await? {
            self.create_index(index_name).await?;
        }
        let source = model.to_source()?;
        match self.client.create_doc(index_name, &model.id(), &source).await {
            Ok(token) => {
                debug!("Successfully created doc. id: {}", model.id());
                Ok(model.with_token(token))
            }
            Err(ClientError::DocumentExists { id }) => {
                Err(StateStoreError::DocumentAlreadyExists { id })
            }
            Err(e) => Err(StateStoreError::storage("create", e.to_string())),
        }
    }

    /// Fetch a record by id, or `None` when absent.
    ///
    /// A not-yet-existent index is equivalent to an empty one: it is
    /// provisioned and `None` is returned, never an error.
    pub async fn get<T: StateModel>(
        &self,
        id: &str,
        index_name: &str,
    ) -> Result<Option<T>, StateStoreError> {
        if !self.index_exists(index_name).await? {
            self.create_index(index_name).await?;
            return Ok(None);
        }
        match self.client.get_doc(index_name, id).await {
            Ok(Some(doc)) => Ok(Some(T::from_source(&doc.source, doc.token)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(StateStoreError::storage("get", e.to_string())),
        }
    }

    /// Transition a record to a new state via a conditional update.
    ///
    /// Presents the caller's current token; a stale token fails with
    /// [`StateStoreError::VersionConflict`] and a vanished document with
    /// [`StateStoreError::DocumentNotFound`]. On success the returned record
    /// carries the new state and the store-assigned token, and the write is
    /// visible to subsequent reads.
    pub async fn update_state<T: StateModel>(
        &self,
        model: &T,
        state: T::State,
        index_name: &str,
    ) -> Result<T, StateStoreError> {
        let next = model.with_state(state, model.token());
        let source = next.to_source()?;
        match self
            .client
            .update_doc(index_name, &next.id(), &source, next.token())
            .await
        {
            Ok(token) => {
                debug!("Successfully update doc. id: {}", next.id());
                Ok(next.with_token(token))
            }
            Err(ClientError::VersionConflict { id }) => {
                Err(StateStoreError::VersionConflict { id })
            }
            Err(ClientError::DocumentMissing { id }) => {
                Err(StateStoreError::DocumentNotFound { id })
            }
            Err(e) => Err(StateStoreError::storage("update_state", e.to_string())),
        }
    }

    /// The underlying document client.
    pub fn client(&self) -> &C {
        &self.client
    }

    async fn index_exists(&self, index_name: &str) -> Result<bool, StateStoreError> {
        self.client
            .index_exists(index_name)
            .await
            .map_err(|e| StateStoreError::storage("index_exists", e.to_string()))
    }

    async fn create_index(&self, index_name: &str) -> Result<(), StateStoreError> {
        self.client
            .create_index(index_name, REQUEST_INDEX_MAPPING, REQUEST_INDEX_SETTINGS)
            .await
            .map_err(|e| {
                StateStoreError::storage(
                    "create_index",
                    format!(
                        "Internal server error while creating {} index: {}",
                        index_name, e
                    ),
                )
            })?;
        info!("Index: {} creation Acknowledged", index_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_index_name() {
        assert_eq!(
            request_index_name("my_glue"),
            ".query_execution_request_my_glue"
        );
    }

    #[test]
    fn test_index_templates_not_empty() {
        assert!(REQUEST_INDEX_MAPPING.contains("statementId"));
        assert!(REQUEST_INDEX_SETTINGS.contains("number_of_shards"));
    }
}
