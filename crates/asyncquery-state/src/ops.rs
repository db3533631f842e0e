// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-data-source state operations.
//!
//! [`DatasourceOps`] binds a state store to one data-source name at
//! construction time and exposes the narrow set of entity operations the
//! query layers consume. The request index is resolved once, here, so no
//! caller ever names an index directly.

use std::sync::Arc;

use crate::client::DocumentClient;
use crate::error::StateStoreError;
use crate::job::AsyncQueryJobMetadata;
use crate::session::{SessionModel, SessionState};
use crate::statement::{StatementModel, StatementState};
use crate::statestore::{StateStore, request_index_name};

/// Entity operations bound to one data source.
///
/// Cloning is cheap; clones share the same state store.
pub struct DatasourceOps<C: DocumentClient> {
    store: Arc<StateStore<C>>,
    datasource_name: String,
    index_name: String,
}

impl<C: DocumentClient> Clone for DatasourceOps<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            datasource_name: self.datasource_name.clone(),
            index_name: self.index_name.clone(),
        }
    }
}

impl<C: DocumentClient> DatasourceOps<C> {
    /// Bind the store to a data source.
    pub fn new(store: Arc<StateStore<C>>, datasource_name: impl Into<String>) -> Self {
        let datasource_name = datasource_name.into();
        let index_name = request_index_name(&datasource_name);
        Self {
            store,
            datasource_name,
            index_name,
        }
    }

    /// The data source this handle is bound to.
    pub fn datasource_name(&self) -> &str {
        &self.datasource_name
    }

    /// The request index this handle resolves to.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Create a session record.
    pub async fn create_session(
        &self,
        session: SessionModel,
    ) -> Result<SessionModel, StateStoreError> {
        self.store.create(session, &self.index_name).await
    }

    /// Fetch a session record by document id.
    pub async fn get_session(
        &self,
        doc_id: &str,
    ) -> Result<Option<SessionModel>, StateStoreError> {
        self.store.get(doc_id, &self.index_name).await
    }

    /// Transition a session record to a new state.
    pub async fn update_session_state(
        &self,
        session: &SessionModel,
        state: SessionState,
    ) -> Result<SessionModel, StateStoreError> {
        self.store
            .update_state(session, state, &self.index_name)
            .await
    }

    /// Create a statement record.
    pub async fn create_statement(
        &self,
        statement: StatementModel,
    ) -> Result<StatementModel, StateStoreError> {
        self.store.create(statement, &self.index_name).await
    }

    /// Fetch a statement record by document id.
    pub async fn get_statement(
        &self,
        doc_id: &str,
    ) -> Result<Option<StatementModel>, StateStoreError> {
        self.store.get(doc_id, &self.index_name).await
    }

    /// Transition a statement record to a new state.
    pub async fn update_statement_state(
        &self,
        statement: &StatementModel,
        state: StatementState,
    ) -> Result<StatementModel, StateStoreError> {
        self.store
            .update_state(statement, state, &self.index_name)
            .await
    }

    /// Create a job metadata record.
    pub async fn create_job_metadata(
        &self,
        metadata: AsyncQueryJobMetadata,
    ) -> Result<AsyncQueryJobMetadata, StateStoreError> {
        self.store.create(metadata, &self.index_name).await
    }

    /// Fetch a job metadata record by document id.
    pub async fn get_job_metadata(
        &self,
        doc_id: &str,
    ) -> Result<Option<AsyncQueryJobMetadata>, StateStoreError> {
        self.store.get(doc_id, &self.index_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MemoryClient, SystemAuth};

    #[test]
    fn test_index_resolved_at_construction() {
        let store = Arc::new(StateStore::new(MemoryClient::new(SystemAuth::new("test"))));
        let ops = DatasourceOps::new(store, "my_glue");
        assert_eq!(ops.datasource_name(), "my_glue");
        assert_eq!(ops.index_name(), ".query_execution_request_my_glue");

        let clone = ops.clone();
        assert_eq!(clone.index_name(), ops.index_name());
    }
}
