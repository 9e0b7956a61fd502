// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Persistence layer shared by the services.
//!
//! A `Db` is a connection pool for one backend.  PostgreSQL serves production traffic and SQLite
//! backs the unit tests, each behind its own cargo feature.  Services write their queries as free
//! functions over an `Executor`, with one match arm per enabled backend.
//!
//! Every operation that services need is a single statement, so this layer does not expose
//! transactions: callers grab an `Executor` from the `Db` pool, run one query on it, and let it go.

use crate::model::ModelError;
use async_trait::async_trait;
#[cfg(feature = "postgres")]
use sqlx::Postgres;
#[cfg(feature = "sqlite")]
use sqlx::Sqlite;
#[cfg(any(feature = "postgres", feature = "sqlite"))]
use sqlx::pool::PoolConnection;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Failures of the persistence layer.  Whatever the backends report that we do not classify
/// explicitly ends up as `BackendError`.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DbError {
    /// A row with the same key is already stored.
    #[error("Already exists")]
    AlreadyExists,

    /// Unclassified failure reported by the backend.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Stored data violates the constraints of the domain types.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// No row matched the query.
    #[error("Entity not found")]
    NotFound,

    /// The backend cannot serve us right now, as when the pool is exhausted.
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        Self::DataIntegrityError(e.0)
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// Checks that a single-row write touched at most one row.
///
/// Writes keyed by a primary key can legitimately affect zero rows when the key does not exist,
/// and callers decide what that means.  Touching more than one row means the query is broken.
pub fn ensure_at_most_one_row(rows_affected: u64, what: &str) -> DbResult<()> {
    if rows_affected > 1 {
        return Err(DbError::BackendError(format!(
            "{} affected {} rows instead of at most one",
            what, rows_affected
        )));
    }
    Ok(())
}

/// A pooled connection to one of the supported backends.
///
/// sqlx needs to know the concrete database type to bind and decode values, so query functions
/// match on this enum and issue the backend-specific query in each arm.
pub enum Executor {
    /// Connection taken from a PostgreSQL pool.
    #[cfg(feature = "postgres")]
    Postgres(PoolConnection<Postgres>),

    /// Connection taken from an SQLite pool.
    #[cfg(feature = "sqlite")]
    Sqlite(PoolConnection<Sqlite>),
}

/// A connection pool shared by all concurrent requests of a service.
///
/// Pools must be closed explicitly before being dropped.
#[async_trait]
pub trait Db {
    /// Takes a connection out of the pool.  The short name keeps query call sites compact.
    async fn ex(&self) -> DbResult<Executor>;

    /// Closes the pool, waiting for all connections to be returned to it.
    async fn close(&self);
}

/// Macros to run one set of database tests against every backend.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    pub use paste::paste;

    /// Defines a `#[tokio::test]` called `name` that calls `module::name(setup)`, optionally
    /// tagged with `extra` (typically an `#[ignore]`).
    #[macro_export]
    macro_rules! generate_one_test [
        ( $name:ident, $setup:expr, $module:path $(, #[$extra:meta] )? ) => {
            #[tokio::test]
            $(#[$extra])?
            async fn $name() {
                $crate::db::testutils::paste! {
                    $module :: [< $name >]($setup).await;
                }
            }
        }
    ];

    pub use generate_one_test;

    /// Defines one test per `name`, each calling the generic `module::name` with the database
    /// built by `setup`.
    #[macro_export]
    macro_rules! generate_tests [
        ( #[$extra:meta], $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module, #[$extra]);
            )+
        };

        ( $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module);
            )+
        };
    ];

    pub use generate_tests;
}
