// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Session entity.
//!
//! A session is a persistent execution context mapped to one remote compute
//! job, hosting zero or more statements.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::client::{DocumentClient, VersionToken};
use crate::error::StateStoreError;
use crate::ops::DatasourceOps;
use crate::statestore::StateModel;

/// Document type discriminator for session documents.
pub const SESSION_DOC_TYPE: &str = "session";

/// Schema version written into every session document.
pub const SESSION_DOC_VERSION: &str = "1.0";

/// Identifier of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an existing session id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh session id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of session. Only interactive sessions exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    /// Interactive session hosting ad-hoc statements.
    Interactive,
}

/// Session lifecycle state.
///
/// The full enumeration is owned by the compute-job collaborator; all names
/// it writes are carried here so its documents parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Session document created, remote job not started yet.
    NotStarted,
    /// Remote job is running.
    Running,
    /// Session finished its work.
    Complete,
    /// Session failed.
    Fail,
    /// Session was declared dead.
    Dead,
}

impl SessionState {
    /// The wire name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Fail => "fail",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Versioned session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionModel {
    /// Document schema version.
    pub version: String,
    /// Document type discriminator, always [`SESSION_DOC_TYPE`].
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Kind of session.
    #[serde(rename = "sessionType")]
    pub session_type: SessionType,
    /// Session identifier, also the document id.
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    /// Remote application the session runs in.
    #[serde(rename = "applicationId")]
    pub application_id: String,
    /// Remote compute job backing the session.
    #[serde(rename = "jobId")]
    pub job_id: String,
    /// Data source this session is partitioned under.
    #[serde(rename = "dataSourceName")]
    pub datasource_name: String,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Epoch millis of the last state change.
    #[serde(rename = "lastUpdateTime")]
    pub last_update_time: i64,
    /// Error message from a failed session, empty otherwise.
    pub error: String,
    /// CAS token from the most recent read or write.
    #[serde(skip)]
    pub token: VersionToken,
}

impl SessionModel {
    /// Build the record for a brand-new interactive session.
    pub fn init_interactive_session(
        session_id: SessionId,
        application_id: impl Into<String>,
        job_id: impl Into<String>,
        datasource_name: impl Into<String>,
    ) -> Self {
        Self {
            version: SESSION_DOC_VERSION.to_string(),
            doc_type: SESSION_DOC_TYPE.to_string(),
            session_type: SessionType::Interactive,
            session_id,
            application_id: application_id.into(),
            job_id: job_id.into(),
            datasource_name: datasource_name.into(),
            state: SessionState::NotStarted,
            last_update_time: Utc::now().timestamp_millis(),
            error: String::new(),
            token: VersionToken::UNASSIGNED,
        }
    }
}

impl StateModel for SessionModel {
    type State = SessionState;

    fn id(&self) -> String {
        self.session_id.to_string()
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

    fn with_state(&self, state: SessionState, token: VersionToken) -> Self {
        Self {
            state,
            last_update_time: Utc::now().timestamp_millis(),
            token,
            ..self.clone()
        }
    }
}

/// Typed façade over one session's lifecycle.
pub struct Session<C: DocumentClient> {
    session_id: SessionId,
    application_id: String,
    job_id: String,
    ops: DatasourceOps<C>,
    model: Option<SessionModel>,
}

impl<C: DocumentClient> Session<C> {
    /// Bind a session façade to its data-source operations.
    pub fn new(
        session_id: SessionId,
        application_id: impl Into<String>,
        job_id: impl Into<String>,
        ops: DatasourceOps<C>,
    ) -> Self {
        Self {
            session_id,
            application_id: application_id.into(),
            job_id: job_id.into(),
            ops,
            model: None,
        }
    }

    /// Open the session: create its record in the not-started state.
    pub async fn open(&mut self) -> Result<(), StateStoreError> {
        let model = SessionModel::init_interactive_session(
            self.session_id.clone(),
            self.application_id.clone(),
            self.job_id.clone(),
            self.ops.datasource_name().to_string(),
        );
        match self.ops.create_session(model).await {
            Ok(created) => {
                self.model = Some(created);
                Ok(())
            }
            Err(StateStoreError::DocumentAlreadyExists { id }) => {
                error!("session already exist. {}", id);
                Err(StateStoreError::DocumentAlreadyExists { id })
            }
            Err(e) => Err(e),
        }
    }

    /// Transition the session to a new state via a conditional update.
    ///
    /// No cancel-style branching: conflicts and missing documents surface
    /// directly for the caller to decide on.
    pub async fn update_state(&mut self, state: SessionState) -> Result<(), StateStoreError> {
        let model = self
            .model
            .clone()
            .ok_or_else(|| StateStoreError::DocumentNotFound {
                id: self.session_id.to_string(),
            })?;
        let updated = self.ops.update_session_state(&model, state).await?;
        self.model = Some(updated);
        Ok(())
    }

    /// Adopt a record snapshot fetched elsewhere.
    pub fn set_model(&mut self, model: SessionModel) {
        self.model = Some(model);
    }

    /// The current in-memory record snapshot, if any.
    pub fn model(&self) -> Option<&SessionModel> {
        self.model.as_ref()
    }

    /// Current state of the in-memory snapshot, if any.
    pub fn session_state(&self) -> Option<SessionState> {
        self.model.as_ref().map(|m| m.state)
    }

    /// The session id this façade is bound to.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}
