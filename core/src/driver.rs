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

//! Generic business logic for any service.
//!
//! Every service implements its own `Driver` type, which owns the injected dependencies (the
//! database pool and any external clients) behind `Arc`s so that it is cheap to clone into every
//! request handler:
//!
//! ```rust
//! use people_core::db::Db;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! pub(crate) struct Driver {
//!     /// The database that the driver uses for persistence.
//!     db: Arc<dyn Db + Send + Sync>,
//!
//!     // ... other fields here ...
//! }
//! ```
//!
//! Driver operations take `self` by value: handlers get their own clone and consume it.

use crate::db::DbError;

/// Failures of a business operation, carrying a human-readable detail.
///
/// The detail is meant for logs: the REST layer decides how much of it reaches clients.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// The entity to create collides with an existing one.
    #[error("{0}")]
    AlreadyExists(String),

    /// The persistence layer failed or is unreachable.
    #[error("{0}")]
    BackendError(String),

    /// The caller supplied data the operation cannot accept.
    #[error("{0}")]
    InvalidInput(String),

    /// The entity the operation refers to does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        let detail = e.to_string();
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(detail),
            DbError::NotFound => DriverError::NotFound(detail),
            DbError::BackendError(_) | DbError::DataIntegrityError(_) | DbError::Unavailable => {
                DriverError::BackendError(detail)
            }
        }
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_db_error() {
        assert_eq!(DriverError::NotFound("Entity not found".to_owned()), DbError::NotFound.into());
        assert_eq!(
            DriverError::BackendError("Database error: boom".to_owned()),
            DbError::BackendError("boom".to_owned()).into()
        );
        assert_eq!(
            DriverError::BackendError("Data integrity error: bad age".to_owned()),
            DbError::DataIntegrityError("bad age".to_owned()).into()
        );
        assert_eq!(
            DriverError::BackendError("Unavailable".to_owned()),
            DbError::Unavailable.into()
        );
        assert_eq!(
            DriverError::AlreadyExists("Already exists".to_owned()),
            DbError::AlreadyExists.into()
        );
    }
}
