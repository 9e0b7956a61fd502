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

//! Test utilities for the business logic.

use crate::db::init_schema;
use crate::driver::{Driver, DriverOptions};
use people_core::db::sqlite::testutils::setup;
use people_core::db::{Db, Executor};
use people_lookup::MockNameLookup;
use std::sync::Arc;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The lookup services backing the driver.
    lookup: MockNameLookup,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver with an empty in-memory database and a lookup service that only
    /// knows about Alice.
    pub(crate) async fn setup() -> Self {
        let lookup = MockNameLookup::new(&[("Alice", 34, "female", "US")]);
        Self::setup_with(lookup, DriverOptions::default()).await
    }

    /// Initializes the driver with an empty in-memory database and the given `lookup` service
    /// and `opts`.
    pub(crate) async fn setup_with(lookup: MockNameLookup, opts: DriverOptions) -> Self {
        let db: Arc<dyn Db + Send + Sync> = Arc::new(setup().await);
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = Driver::new(db.clone(), Arc::new(lookup.clone()), opts);
        Self { db, lookup, driver }
    }

    /// Returns a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Returns the lookup services backing the driver.
    pub(crate) fn lookup(&self) -> &MockNameLookup {
        &self.lookup
    }

    /// Returns a clone of the driver under test.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Returns a clone of the database backing the driver.
    pub(crate) fn db(&self) -> Arc<dyn Db + Send + Sync> {
        self.db.clone()
    }
}
