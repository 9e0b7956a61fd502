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

//! Demographic lookups keyed by a person's first name.
//!
//! The `NameLookup` trait abstracts the services that guess a person's age, gender and country of
//! origin given their first name.  `PublicApisLookup` talks to the public agify, genderize and
//! nationalize APIs, and `MockNameLookup` is an in-memory replacement for tests.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;

#[cfg(any(test, feature = "testutils"))]
mod mock;
#[cfg(any(test, feature = "testutils"))]
pub use mock::MockNameLookup;
mod public;
pub use public::{PublicApisLookup, PublicApisOptions};

/// Result type for this crate.
pub type LookupResult<T> = io::Result<T>;

/// A two-letter country ISO code, always stored in uppercase.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(into = "String", try_from = "String")]
pub struct CountryIsoCode(String);

impl CountryIsoCode {
    /// Creates a new country ISO code after validating that it is OK.
    pub fn new<S: Into<String>>(code: S) -> LookupResult<Self> {
        let code = code.into();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Country code {} is not two ASCII letters", code),
            ));
        }
        Ok(Self(code.to_uppercase()))
    }

    /// Returns the country ISO code as a uppercase string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<CountryIsoCode> for String {
    fn from(code: CountryIsoCode) -> Self {
        code.0
    }
}

impl TryFrom<String> for CountryIsoCode {
    type Error = io::Error;

    fn try_from(code: String) -> LookupResult<Self> {
        CountryIsoCode::new(code)
    }
}

/// Interface to guess demographic attributes of a person from their first name.
///
/// Every operation returns `Ok(None)` when the backing service answered but does not know the
/// answer, and an error when the service could not be queried or returned garbage.
#[async_trait]
pub trait NameLookup {
    /// Guesses the age of a person called `name`.
    async fn age(&self, name: &str) -> LookupResult<Option<u16>>;

    /// Guesses the gender of a person called `name`.
    async fn gender(&self, name: &str) -> LookupResult<Option<String>>;

    /// Guesses the most likely country of origin of a person called `name`.
    async fn country(&self, name: &str) -> LookupResult<Option<CountryIsoCode>>;
}
