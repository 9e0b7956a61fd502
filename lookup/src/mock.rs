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

//! Name lookup for testing purposes.

use crate::{CountryIsoCode, LookupResult, NameLookup};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Attributes known for a name in the mock.
struct MockEntry {
    /// Age to return for the name, if any.
    age: Option<u16>,

    /// Gender to return for the name, if any.
    gender: Option<String>,

    /// Country to return for the name, if any.
    country: Option<CountryIsoCode>,
}

/// Name lookup that returns static data and records how many times it was queried.
#[derive(Clone)]
pub struct MockNameLookup {
    /// Mapping of names to their attributes.
    data: Arc<HashMap<String, MockEntry>>,

    /// Time to wait before answering every query.
    delay: Option<Duration>,

    /// Whether every query should fail instead of consulting `data`.
    fail: bool,

    /// Number of queries received so far, across all clones.
    calls: Arc<AtomicUsize>,
}

impl MockNameLookup {
    /// Creates a new mock lookup based on a list of `(name, age, gender, country)` tuples.
    ///
    /// Zero ages and empty strings represent unknown attributes.
    pub fn new(raw_data: &[(&'static str, u16, &'static str, &'static str)]) -> Self {
        let mut data = HashMap::with_capacity(raw_data.len());
        for (name, age, gender, country) in raw_data {
            let entry = MockEntry {
                age: Some(*age).filter(|age| *age > 0),
                gender: Some((*gender).to_owned()).filter(|gender| !gender.is_empty()),
                country: if country.is_empty() {
                    None
                } else {
                    Some(CountryIsoCode::new(*country).expect("Invalid country code"))
                },
            };
            data.insert((*name).to_owned(), entry);
        }
        Self { data: Arc::from(data), delay: None, fail: false, calls: Arc::default() }
    }

    /// Makes every query wait for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes every query fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Returns the number of queries received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Accounts for a new query and returns the entry for `name`, if any.
    async fn lookup(&self, name: &str) -> LookupResult<Option<&MockEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(io::Error::other(format!("Lookup of {} failed", name)));
        }
        Ok(self.data.get(name))
    }
}

#[async_trait]
impl NameLookup for MockNameLookup {
    async fn age(&self, name: &str) -> LookupResult<Option<u16>> {
        Ok(self.lookup(name).await?.and_then(|entry| entry.age))
    }

    async fn gender(&self, name: &str) -> LookupResult<Option<String>> {
        Ok(self.lookup(name).await?.and_then(|entry| entry.gender.clone()))
    }

    async fn country(&self, name: &str) -> LookupResult<Option<CountryIsoCode>> {
        Ok(self.lookup(name).await?.and_then(|entry| entry.country.clone()))
    }
}
