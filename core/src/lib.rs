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

//! Shared building blocks for the people registry.
//!
//! The registry is split in layers, and each layer has its own result and error types:
//!
//! 1.  `model`: plain domain types with validation at construction time.  Failures are reported as
//!     `ModelError`.
//!
//! 1.  `db`: the persistence layer.  A `Db` hands out executors for a concrete backend (PostgreSQL
//!     in production, SQLite in tests) and services write free functions that take an `Executor`
//!     and issue the queries for each backend.  Failures are reported as `DbError`.
//!
//! 1.  `driver`: the business logic.  Services define a `Driver` that owns the injected
//!     dependencies and coordinates them.  Failures are reported as `DriverError`.
//!
//! 1.  `rest`: the HTTP layer.  Handlers return `RestError`s which render as the JSON envelope that
//!     all endpoints share.
//!
//! Errors float up with `?` and get converted at each layer boundary, until they are turned into an
//! HTTP status code and an envelope by the REST layer.
//!
//! Database backends are opt-in via the `postgres` and `sqlite` features so that services only pull
//! in the drivers they need.  Test helpers live behind the `testutils` feature.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod db;
pub mod driver;
pub mod env;
pub mod model;
pub mod rest;
