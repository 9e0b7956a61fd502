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

//! Enrichment of new people with attributes guessed from their first name.

use crate::driver::Driver;
use crate::model::PersonFields;
use log::{debug, warn};
use people_lookup::LookupResult;
use std::future::Future;

impl Driver {
    /// Runs a single `query` for the attribute `what` of `name` bounded by the lookup timeout.
    ///
    /// Returns `None` without running the query if the attribute is not `wanted`.  Failures and
    /// timeouts are logged and also yield `None` so that the caller stores the unknown value.
    async fn bounded_lookup<T, F>(
        &self,
        wanted: bool,
        what: &str,
        name: &str,
        query: F,
    ) -> Option<T>
    where
        F: Future<Output = LookupResult<Option<T>>>,
    {
        if !wanted {
            return None;
        }

        match tokio::time::timeout(self.opts.lookup_timeout, query).await {
            Ok(Ok(Some(value))) => Some(value),
            Ok(Ok(None)) => {
                debug!("No {} known for name '{}'", what, name);
                None
            }
            Ok(Err(e)) => {
                warn!("Failed to look up {} for name '{}': {}", what, name, e);
                None
            }
            Err(_) => {
                warn!(
                    "Timed out after {:?} looking up {} for name '{}'",
                    self.opts.lookup_timeout, what, name
                );
                None
            }
        }
    }

    /// Fills in the attributes of `fields` that are unknown by querying the lookup services.
    ///
    /// The lookups for the different attributes run concurrently.  Attributes provided by the
    /// caller are never looked up nor overwritten.
    pub(super) async fn enrich(&self, mut fields: PersonFields) -> PersonFields {
        if !fields.needs_enrichment() {
            return fields;
        }

        let name = fields.name.as_str();
        let (age, gender, country) = futures::join!(
            self.bounded_lookup(fields.age == 0, "age", name, self.lookup.age(name)),
            self.bounded_lookup(fields.gender.is_empty(), "gender", name, self.lookup.gender(name)),
            self.bounded_lookup(
                fields.country.is_empty(),
                "country",
                name,
                self.lookup.country(name)
            ),
        );

        if let Some(age) = age {
            fields.age = age;
        }
        if let Some(gender) = gender {
            fields.gender = gender;
        }
        if let Some(country) = country {
            fields.country = country.into();
        }
        fields
    }
}
