// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared test context for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use asyncquery_state::client::{MemoryClient, SystemAuth};
use asyncquery_state::ops::DatasourceOps;
use asyncquery_state::session::{Session, SessionId};
use asyncquery_state::statement::{LangType, Statement, StatementId};
use asyncquery_state::statestore::StateStore;

/// In-memory store plus operations bound to one data source.
pub struct TestContext {
    pub client: MemoryClient,
    pub store: Arc<StateStore<MemoryClient>>,
    pub ops: DatasourceOps<MemoryClient>,
}

impl TestContext {
    pub fn new(datasource: &str) -> Self {
        let client = MemoryClient::new(SystemAuth::new("test"));
        let store = Arc::new(StateStore::new(client.clone()));
        let ops = DatasourceOps::new(Arc::clone(&store), datasource);
        Self { client, store, ops }
    }

    /// Statement façade for the given session/statement ids.
    pub fn statement(
        &self,
        session_id: &str,
        statement_id: &str,
        query: &str,
    ) -> Statement<MemoryClient> {
        Statement::new(
            SessionId::new(session_id),
            "app-1",
            "job-1",
            StatementId::new(statement_id),
            LangType::Sql,
            query,
            format!("query-{}", statement_id),
            self.ops.clone(),
        )
    }

    /// Session façade for the given session id.
    pub fn session(&self, session_id: &str) -> Session<MemoryClient> {
        Session::new(SessionId::new(session_id), "app-1", "job-1", self.ops.clone())
    }
}
