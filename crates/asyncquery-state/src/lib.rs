// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! asyncquery-state - Versioned State Coordination for Async Queries
//!
//! This crate coordinates long-running, asynchronously executed SQL/PPL
//! queries submitted to a remote compute job. Independent callers on
//! different nodes create, observe, and mutate shared records describing
//! sessions, statements, and job metadata; all shared state lives in
//! versioned documents of a backing document store and every transition is
//! guarded by optimistic concurrency control.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  SQL/PPL and REST layers (external)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//!            │                          │                        │
//!            ▼                          ▼                        ▼
//! ┌───────────────────┐     ┌────────────────────┐    ┌────────────────────┐
//! │ Session/Statement │     │   DatasourceOps    │    │ JobExecutionRes-   │
//! │     façades       │────▶│ (per data source)  │    │   ponseReader      │
//! └───────────────────┘     └─────────┬──────────┘    └─────────┬──────────┘
//!                                     ▼                         │
//!                           ┌────────────────────┐              │
//!                           │     StateStore     │              │
//!                           │  (CAS engine over  │              │
//!                           │    StateModel)     │              │
//!                           └─────────┬──────────┘              │
//!                                     ▼                         ▼
//!                           ┌─────────────────────────────────────────┐
//!                           │      DocumentClient (trait boundary)    │
//!                           │   seqNo/primaryTerm conditional writes  │
//!                           └─────────────────────────────────────────┘
//! ```
//!
//! # Concurrency model
//!
//! This subsystem holds no mutable shared state between calls; every
//! operation reads or writes the store directly, so the library is stateless
//! and horizontally scalable. Concurrency arises externally: many callers
//! may invoke `create`/`update_state` against the same document id at once.
//! The store serializes conditional writes per document, so exactly one of
//! two writers presenting the same stale token succeeds; the other observes
//! a version conflict, must re-read, and decides for itself whether to
//! retry. Nothing here retries automatically.
//!
//! # Statement State Machine
//!
//! ```text
//!              ┌─────────┐
//!              │ WAITING │
//!              └────┬────┘
//!          ┌────────┼────────────┐
//!          ▼        ▼            ▼
//!     ┌─────────┐ ┌───────────┐ ┌───────────┐
//!     │ RUNNING │ │ CANCELLED │ │  FAILED   │
//!     └────┬────┘ └───────────┘ └───────────┘
//!          │
//!     ┌────┴────┐
//!     ▼         ▼
//! ┌─────────┐ ┌────────┐
//! │ SUCCESS │ │ FAILED │
//! └─────────┘ └────────┘
//! ```
//!
//! `CANCELLED`, `SUCCESS`, and `FAILED` are terminal.
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `ASYNCQUERY_STATE_RESULT_INDEX` | No | `.query_execution_result` | Default results index |
//! | `ASYNCQUERY_STATE_SYSTEM_PRINCIPAL` | No | `asyncquery_state` | System principal for store access |
//!
//! # Modules
//!
//! - [`client`]: Document store trait boundary and the in-memory backend
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types with error code mapping
//! - [`job`]: Job metadata entity (create/get only)
//! - [`ops`]: Per-data-source entity operations
//! - [`response`]: Job execution result reader
//! - [`session`]: Session entity and façade
//! - [`statement`]: Statement entity and façade
//! - [`statestore`]: Generic CAS-based state store engine

#![deny(missing_docs)]

/// Document store client boundary and backends.
pub mod client;

/// Configuration loaded from environment variables.
pub mod config;

/// Error types for state coordination with error code mapping.
pub mod error;

/// Job metadata records linking async queries to remote jobs.
pub mod job;

/// Per-data-source entity operations.
pub mod ops;

/// Result reader for remote job output.
pub mod response;

/// Session entity: persistent execution context for statements.
pub mod session;

/// Statement entity: one query execution request within a session.
pub mod statement;

/// Generic CAS-based state store over versioned records.
pub mod statestore;
