// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Job execution result reader.
//!
//! Best-effort lookup of a remote job's query output from a results index.
//! A not-yet-created results index means the job has not produced output;
//! "not ready" and "not found" are indistinguishable here and both map to an
//! empty result object.

use serde_json::{Value, json};
use tracing::info;

use crate::client::{ClientError, DocumentClient};
use crate::error::StateStoreError;
use crate::statestore::RESULT_BUFFER_INDEX_NAME;

/// Result document field holding the remote job run identifier.
pub const JOB_ID_FIELD: &str = "jobRunId";

/// Result document field holding the async query identifier.
pub const QUERY_ID_FIELD: &str = "queryId";

/// Field of the returned object the matching document source is surfaced
/// under.
pub const DATA_FIELD: &str = "data";

/// Reads query output documents written by remote compute jobs.
pub struct JobExecutionResponseReader<C: DocumentClient> {
    client: C,
}

impl<C: DocumentClient> JobExecutionResponseReader<C> {
    /// Create a reader over the given document client.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Look up a job's output by job identifier.
    ///
    /// Searches the given results index, or the default one when `None`.
    pub async fn get_result_from_index(
        &self,
        job_id: &str,
        result_index: Option<&str>,
    ) -> Result<Value, StateStoreError> {
        self.search_in_result_index(JOB_ID_FIELD, job_id, result_index)
            .await
    }

    /// Look up a job's output by async query identifier.
    pub async fn get_result_with_query_id(
        &self,
        query_id: &str,
        result_index: Option<&str>,
    ) -> Result<Value, StateStoreError> {
        self.search_in_result_index(QUERY_ID_FIELD, query_id, result_index)
            .await
    }

    async fn search_in_result_index(
        &self,
        field: &str,
        value: &str,
        result_index: Option<&str>,
    ) -> Result<Value, StateStoreError> {
        let search_index = result_index.unwrap_or(RESULT_BUFFER_INDEX_NAME);
        let mut data = json!({});
        let outcome = match self.client.search_term(search_index, field, value).await {
            Ok(outcome) => outcome,
            Err(ClientError::IndexNotFound { .. }) => {
                // The remote job has not created the result index yet.
                info!("{} is not created yet.", search_index);
                return Ok(data);
            }
            Err(e) => {
                return Err(StateStoreError::storage("search", e.to_string()));
            }
        };
        if !(200..300).contains(&outcome.status) {
            return Err(StateStoreError::storage(
                "search",
                format!(
                    "Fetching result from {} index failed with status : {}",
                    search_index, outcome.status
                ),
            ));
        }
        for hit in outcome.hits {
            data[DATA_FIELD] = hit;
        }
        Ok(data)
    }
}
