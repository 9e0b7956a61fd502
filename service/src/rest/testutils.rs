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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::DriverOptions;
use crate::driver::testutils::TestContext as DriverTestContext;
use crate::model::{Person, PersonFields, PersonId};
use crate::rest::app;
use axum::Router;
use people_core::db::DbError;
use people_lookup::MockNameLookup;
use std::time::Duration;

/// Request timeout for tests that do not care about it.
const TEST_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// State of a running test.
pub(crate) struct TestContext {
    /// State of the driver backing the app.
    inner: DriverTestContext,
}

impl TestContext {
    /// Initializes the app with an empty database and a lookup service that only knows Alice.
    pub(crate) async fn setup() -> Self {
        Self { inner: DriverTestContext::setup().await }
    }

    /// Initializes the app with an empty database and a lookup service that knows Alice but
    /// takes `delay` to answer.
    pub(crate) async fn setup_slow(delay: Duration) -> Self {
        let lookup = MockNameLookup::new(&[("Alice", 34, "female", "US")]).with_delay(delay);
        Self { inner: DriverTestContext::setup_with(lookup, DriverOptions::default()).await }
    }

    /// Initializes the app with an empty database and a lookup service that always fails.
    pub(crate) async fn setup_failing_lookup() -> Self {
        let lookup = MockNameLookup::new(&[]).failing();
        Self { inner: DriverTestContext::setup_with(lookup, DriverOptions::default()).await }
    }

    /// Returns a router for the app under test.
    pub(crate) fn app(&self) -> Router {
        app(self.inner.driver(), TEST_REQUEST_TIMEOUT)
    }

    /// Returns a router for the app under test that aborts requests after `timeout`.
    pub(crate) fn app_with_timeout(&self, timeout: Duration) -> Router {
        app(self.inner.driver(), timeout)
    }

    /// Returns the lookup services backing the app.
    pub(crate) fn lookup(&self) -> &MockNameLookup {
        self.inner.lookup()
    }

    /// Closes the database so that further requests fail with backend errors.
    pub(crate) async fn break_db(&self) {
        self.inner.db().close().await;
    }

    /// Inserts a person directly into the database.
    pub(crate) async fn create_person(&self, fields: &PersonFields) -> PersonId {
        db::create_person(&mut self.inner.ex().await, fields).await.unwrap()
    }

    /// Gets a person directly from the database.
    pub(crate) async fn get_person(&self, id: PersonId) -> Result<Person, DbError> {
        db::get_person_by_id(&mut self.inner.ex().await, id).await
    }

    /// Gets the only person in the database, failing if there is not exactly one.
    pub(crate) async fn get_only_person(&self) -> Person {
        let person = db::get_person_by_id(&mut self.inner.ex().await, PersonId::new(1))
            .await
            .unwrap();
        assert_eq!(
            Err(DbError::NotFound),
            db::get_person_by_id(&mut self.inner.ex().await, PersonId::new(2)).await
        );
        person
    }

    /// Returns true if the database contains no people at all.
    pub(crate) async fn is_db_empty(&self) -> bool {
        matches!(
            db::get_person_by_id(&mut self.inner.ex().await, PersonId::new(1)).await,
            Err(DbError::NotFound)
        )
    }
}
