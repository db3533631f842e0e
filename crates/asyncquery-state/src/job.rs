// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Job metadata entity.
//!
//! The durable record linking an async query to its remote compute job and
//! result location. Immutable once created: create and get only, no state
//! machine and no deletion.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::VersionToken;
use crate::error::StateStoreError;
use crate::session::SessionId;
use crate::statestore::{NoTransition, StateModel};

/// Document type discriminator for job metadata documents.
pub const JOB_METADATA_DOC_TYPE: &str = "jobmeta";

/// Versioned job metadata record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncQueryJobMetadata {
    /// Document type discriminator, always [`JOB_METADATA_DOC_TYPE`].
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Remote compute job identifier, also the document id.
    #[serde(rename = "jobId")]
    pub job_id: String,
    /// Remote application the job runs in.
    #[serde(rename = "applicationId")]
    pub application_id: String,
    /// Index the job writes its result documents to, when not the default.
    #[serde(rename = "resultIndex", skip_serializing_if = "Option::is_none")]
    pub result_index: Option<String>,
    /// Session the job belongs to, absent for direct async queries.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// CAS token from the most recent read or write.
    #[serde(skip)]
    pub token: VersionToken,
}

impl AsyncQueryJobMetadata {
    /// Build the record for a newly submitted async query job.
    pub fn new(
        job_id: impl Into<String>,
        application_id: impl Into<String>,
        result_index: Option<String>,
        session_id: Option<SessionId>,
    ) -> Self {
        Self {
            doc_type: JOB_METADATA_DOC_TYPE.to_string(),
            job_id: job_id.into(),
            application_id: application_id.into(),
            result_index,
            session_id,
            token: VersionToken::UNASSIGNED,
        }
    }
}

impl StateModel for AsyncQueryJobMetadata {
    type State = NoTransition;

    fn id(&self) -> String {
        self.job_id.clone()
    }

    fn token(&self) -> VersionToken {
        self.token
    }

    fn to_source(&self) -> Result<Value, StateStoreError> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_source(source: &Value, token: VersionToken) -> Result<Self, StateStoreError> {
        let model: Self = serde_json::from_value(source.clone())?;
        Ok(Self { token, ..model })
    }

    fn with_token(&self, token: VersionToken) -> Self {
        Self {
            token,
            ..self.clone()
        }
    }

    fn with_state(&self, state: NoTransition, _token: VersionToken) -> Self {
        match state {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_metadata_doc_shape() {
        let meta = AsyncQueryJobMetadata::new(
            "job-1",
            "app-1",
            Some("custom_result_index".to_string()),
            Some(SessionId::new("sess-1")),
        );
        let source = meta.to_source().unwrap();
        assert_eq!(source["type"], json!("jobmeta"));
        assert_eq!(source["jobId"], json!("job-1"));
        assert_eq!(source["applicationId"], json!("app-1"));
        assert_eq!(source["resultIndex"], json!("custom_result_index"));
        assert_eq!(source["sessionId"], json!("sess-1"));

        let parsed =
            AsyncQueryJobMetadata::from_source(&source, VersionToken::new(0, 1)).unwrap();
        assert_eq!(parsed.job_id, "job-1");
        assert_eq!(parsed.token, VersionToken::new(0, 1));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let meta = AsyncQueryJobMetadata::new("job-1", "app-1", None, None);
        assert_eq!(meta.id(), "job-1");
        let source = meta.to_source().unwrap();
        assert!(source.get("resultIndex").is_none());
        assert!(source.get("sessionId").is_none());
    }
}
