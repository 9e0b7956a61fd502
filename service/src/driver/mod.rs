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

//! Business logic for the service.

use people_core::db::Db;
use people_core::env::get_optional_var;
use people_lookup::NameLookup;
use std::sync::Arc;
use std::time::Duration;

mod enrich;
mod person;
#[cfg(test)]
pub(crate) mod testutils;

/// Default maximum time to wait for each individual lookup.
const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration options for the driver.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverOptions {
    /// Maximum time to wait for each individual lookup before giving up on it.
    pub lookup_timeout: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self { lookup_timeout: DEFAULT_LOOKUP_TIMEOUT }
    }
}

impl DriverOptions {
    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_LOOKUP_TIMEOUT`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            lookup_timeout: get_optional_var::<Duration>(prefix, "LOOKUP_TIMEOUT")?
                .unwrap_or(DEFAULT_LOOKUP_TIMEOUT),
        })
    }
}

/// Business logic.
///
/// The public operations exposed by the driver consume it: every request handler gets its own
/// clone and issues exactly one operation on it.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// The services that guess missing attributes of new people.
    lookup: Arc<dyn NameLookup + Send + Sync>,

    /// Configuration options.
    opts: DriverOptions,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(
        db: Arc<dyn Db + Send + Sync>,
        lookup: Arc<dyn NameLookup + Send + Sync>,
        opts: DriverOptions,
    ) -> Self {
        Self { db, lookup, opts }
    }
}
