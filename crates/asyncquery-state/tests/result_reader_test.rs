// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Integration tests for the job execution result reader.

mod common;

use asyncquery_state::client::DocumentClient;
use asyncquery_state::response::{DATA_FIELD, JobExecutionResponseReader};
use asyncquery_state::statestore::RESULT_BUFFER_INDEX_NAME;
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_not_ready_returns_empty_and_never_raises() {
    let ctx = TestContext::new("ds1");
    let reader = JobExecutionResponseReader::new(ctx.client.clone());

    // Repeated lookups before the results index exists are all empty.
    for _ in 0..3 {
        let data = reader.get_result_from_index("job-1", None).await.unwrap();
        assert_eq!(data, json!({}));
    }
    let data = reader
        .get_result_with_query_id("query-1", None)
        .await
        .unwrap();
    assert_eq!(data, json!({}));

    // The reader never provisions the results index.
    assert!(
        !ctx.client
            .index_exists(RESULT_BUFFER_INDEX_NAME)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_result_by_job_id() {
    let ctx = TestContext::new("ds1");
    ctx.client
        .create_index(RESULT_BUFFER_INDEX_NAME, "m", "s")
        .await
        .unwrap();
    ctx.client
        .create_doc(
            RESULT_BUFFER_INDEX_NAME,
            "r1",
            &json!({
                "jobRunId": "job-1",
                "queryId": "query-1",
                "result": ["{'1':1}"],
                "schema": ["{'column_name':'1','data_type':'integer'}"],
            }),
        )
        .await
        .unwrap();

    let reader = JobExecutionResponseReader::new(ctx.client.clone());
    let data = reader.get_result_from_index("job-1", None).await.unwrap();
    assert_eq!(data[DATA_FIELD]["jobRunId"], json!("job-1"));
    assert_eq!(data[DATA_FIELD]["result"], json!(["{'1':1}"]));

    // A different job id finds nothing: empty object, no data field.
    let data = reader.get_result_from_index("job-9", None).await.unwrap();
    assert_eq!(data, json!({}));
}

#[tokio::test]
async fn test_result_by_query_id() {
    let ctx = TestContext::new("ds1");
    ctx.client
        .create_index(RESULT_BUFFER_INDEX_NAME, "m", "s")
        .await
        .unwrap();
    ctx.client
        .create_doc(
            RESULT_BUFFER_INDEX_NAME,
            "r1",
            &json!({"jobRunId": "job-1", "queryId": "query-1", "result": []}),
        )
        .await
        .unwrap();

    let reader = JobExecutionResponseReader::new(ctx.client.clone());
    let data = reader
        .get_result_with_query_id("query-1", None)
        .await
        .unwrap();
    assert_eq!(data[DATA_FIELD]["queryId"], json!("query-1"));
}

#[tokio::test]
async fn test_custom_result_index() {
    let ctx = TestContext::new("ds1");
    ctx.client
        .create_index("custom_results", "m", "s")
        .await
        .unwrap();
    ctx.client
        .create_doc(
            "custom_results",
            "r1",
            &json!({"jobRunId": "job-1", "result": ["row"]}),
        )
        .await
        .unwrap();

    let reader = JobExecutionResponseReader::new(ctx.client.clone());

    // The named index is searched instead of the default.
    let data = reader
        .get_result_from_index("job-1", Some("custom_results"))
        .await
        .unwrap();
    assert_eq!(data[DATA_FIELD]["result"], json!(["row"]));

    // The default index is still absent, so the default lookup is empty.
    let data = reader.get_result_from_index("job-1", None).await.unwrap();
    assert_eq!(data, json!({}));
}
