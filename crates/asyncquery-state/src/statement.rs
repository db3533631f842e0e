// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Statement entity.
//!
//! A statement is one query to execute in a session. One statement maps to
//! one session; cancellation is the only transition this subsystem drives.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::client::{DocumentClient, VersionToken};
use crate::error::StateStoreError;
use crate::ops::DatasourceOps;
use crate::session::SessionId;
use crate::statestore::StateModel;

/// Document type discriminator for statement documents.
pub const STATEMENT_DOC_TYPE: &str = "statement";

/// Schema version written into every statement document.
pub const STATEMENT_DOC_VERSION: &str = "1.0";

/// Identifier of a statement within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementId(String);

impl StatementId {
    /// Wrap an existing statement id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh statement id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Query language of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LangType {
    /// SQL query.
    Sql,
    /// PPL query.
    Ppl,
}

/// Statement lifecycle state.
///
/// `waiting`/`running` is the submitted-but-unfinished phase; the rest are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementState {
    /// Submitted, awaiting execution.
    Waiting,
    /// Undergoing execution.
    Running,
    /// Finished successfully.
    Success,
    /// Finished with an error.
    Failed,
    /// Cancelled before completion.
    Cancelled,
}

impl StatementState {
    /// The wire name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StatementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Versioned statement record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementModel {
    /// Document schema version.
    pub version: String,
    /// Document type discriminator, always [`STATEMENT_DOC_TYPE`].
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Current lifecycle state.
    pub state: StatementState,
    /// Statement identifier within the session.
    #[serde(rename = "statementId")]
    pub statement_id: StatementId,
    /// Session this statement belongs to.
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    /// Remote application the statement runs in.
    #[serde(rename = "applicationId")]
    pub application_id: String,
    /// Remote compute job executing the statement.
    #[serde(rename = "jobId")]
    pub job_id: String,
    /// Query language.
    #[serde(rename = "lang")]
    pub lang_type: LangType,
    /// Data source this statement is partitioned under.
    #[serde(rename = "dataSourceName")]
    pub datasource_name: String,
    /// Query text.
    pub query: String,
    /// Async query identifier the statement answers.
    #[serde(rename = "queryId")]
    pub query_id: String,
    /// Epoch millis of submission.
    #[serde(rename = "submitTime")]
    pub submit_time: i64,
    /// Error message from a failed statement, empty otherwise.
    pub error: String,
    /// CAS token from the most recent read or write.
    #[serde(skip)]
    pub token: VersionToken,
}

impl StatementModel {
    /// Build the record for a newly submitted statement in the waiting state.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_statement(
        session_id: SessionId,
        application_id: impl Into<String>,
        job_id: impl Into<String>,
        statement_id: StatementId,
        lang_type: LangType,
        datasource_name: impl Into<String>,
        query: impl Into<String>,
        query_id: impl Into<String>,
    ) -> Self {
        Self {
            version: STATEMENT_DOC_VERSION.to_string(),
            doc_type: STATEMENT_DOC_TYPE.to_string(),
            state: StatementState::Waiting,
            statement_id,
            session_id,
            application_id: application_id.into(),
            job_id: job_id.into(),
            lang_type,
            datasource_name: datasource_name.into(),
            query: query.into(),
            query_id: query_id.into(),
            submit_time: Utc::now().timestamp_millis(),
            error: String::new(),
            token: VersionToken::UNASSIGNED,
        }
    }

    /// Document id for a statement, derived from its session and statement
    /// identifiers.
    pub fn doc_id(session_id: &SessionId, statement_id: &StatementId) -> String {
        format!("{}_{}", session_id, statement_id)
    }
}

impl StateModel for StatementModel {
    type State = StatementState;

    fn id(&self) -> String {
        Self::doc_id(&self.session_id, &self.statement_id)
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

    fn with_state(&self, state: StatementState, token: VersionToken) -> Self {
        Self {
            state,
            token,
            ..self.clone()
        }
    }
}

/// Typed façade over one statement's lifecycle.
pub struct Statement<C: DocumentClient> {
    session_id: SessionId,
    application_id: String,
    job_id: String,
    statement_id: StatementId,
    lang_type: LangType,
    query: String,
    query_id: String,
    ops: DatasourceOps<C>,
    model: Option<StatementModel>,
}

impl<C: DocumentClient> Statement<C> {
    /// Bind a statement façade to its data-source operations.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: SessionId,
        application_id: impl Into<String>,
        job_id: impl Into<String>,
        statement_id: StatementId,
        lang_type: LangType,
        query: impl Into<String>,
        query_id: impl Into<String>,
        ops: DatasourceOps<C>,
    ) -> Self {
        Self {
            session_id,
            application_id: application_id.into(),
            job_id: job_id.into(),
            statement_id,
            lang_type,
            query: query.into(),
            query_id: query_id.into(),
            ops,
            model: None,
        }
    }

    /// Open the statement: create its record in the waiting state.
    ///
    /// A duplicate submission under the same identifiers is a hard failure,
    /// never merged or retried.
    pub async fn open(&mut self) -> Result<(), StateStoreError> {
        let model = StatementModel::submit_statement(
            self.session_id.clone(),
            self.application_id.clone(),
            self.job_id.clone(),
            self.statement_id.clone(),
            self.lang_type,
            self.ops.datasource_name().to_string(),
            self.query.clone(),
            self.query_id.clone(),
        );
        match self.ops.create_statement(model).await {
            Ok(created) => {
                self.model = Some(created);
                Ok(())
            }
            Err(StateStoreError::DocumentAlreadyExists { .. }) => {
                error!("statement already exist. {}", self.statement_id);
                Err(StateStoreError::StatementAlreadyExists {
                    statement_id: self.statement_id.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Cancel the statement.
    ///
    /// The legality check runs against the in-memory snapshot, not a fresh
    /// read. On a CAS conflict the latest record is re-read (falling back to
    /// the stale snapshot when nothing is found) and the failure reports the
    /// now-current state; the caller decides whether to retry.
    pub async fn cancel(&mut self) -> Result<(), StateStoreError> {
        let model = self
            .model
            .clone()
            .ok_or_else(|| StateStoreError::StatementNotFound {
                statement_id: self.statement_id.to_string(),
            })?;
        if model.state == StatementState::Running {
            error!(
                "can't cancel statement in waiting state. statement: {}.",
                self.statement_id
            );
            return Err(StateStoreError::StatementRunning {
                statement_id: self.statement_id.to_string(),
            });
        }
        match self
            .ops
            .update_statement_state(&model, StatementState::Cancelled)
            .await
        {
            Ok(updated) => {
                self.model = Some(updated);
                Ok(())
            }
            Err(StateStoreError::DocumentNotFound { .. }) => {
                error!(
                    "cancel statement failed. no statement found. statement: {}.",
                    self.statement_id
                );
                Err(StateStoreError::StatementNotFound {
                    statement_id: self.statement_id.to_string(),
                })
            }
            Err(StateStoreError::VersionConflict { .. }) => {
                let latest = self
                    .ops
                    .get_statement(&model.id())
                    .await?
                    .unwrap_or(model);
                let state = latest.state;
                self.model = Some(latest);
                error!(
                    "cancel statement failed. current statementState: {} statement: {}.",
                    state, self.statement_id
                );
                Err(StateStoreError::StatementCancelConflict {
                    statement_id: self.statement_id.to_string(),
                    state: state.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Adopt a record snapshot fetched elsewhere.
    pub fn set_model(&mut self, model: StatementModel) {
        self.model = Some(model);
    }

    /// The current in-memory record snapshot, if any.
    pub fn model(&self) -> Option<&StatementModel> {
        self.model.as_ref()
    }

    /// Current state of the in-memory snapshot, if any.
    pub fn statement_state(&self) -> Option<StatementState> {
        self.model.as_ref().map(|m| m.state)
    }

    /// The statement id this façade is bound to.
    pub fn statement_id(&self) -> &StatementId {
        &self.statement_id
    }
}
