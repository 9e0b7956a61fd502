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

//! Data types for the people registry.

use derive_getters::Getters;
use derive_more::Constructor;
use people_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Identifier of a person, assigned by the database on insertion.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PersonId(i32);

impl PersonId {
    /// Creates a new identifier from its raw database value.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the identifier as an `i32`.
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

/// Checks if an age is unset.
fn is_zero(age: &u16) -> bool {
    *age == 0
}

/// Creates an age from an `i32` with range validation.
pub(crate) fn age_from_i32(age: i32) -> ModelResult<u16> {
    match u16::try_from(age) {
        Ok(age) => Ok(age),
        Err(e) => Err(ModelError(format!("Age {} cannot be represented: {}", age, e))),
    }
}

/// The attributes of a person that callers can set.
///
/// Empty strings and a zero age mean that the attribute is unknown.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct PersonFields {
    /// First name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Last name.
    pub surname: String,

    /// Patronymic name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub patronymic: String,

    /// Country of origin as a two-letter ISO code.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,

    /// Gender.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gender: String,

    /// Age in years.
    #[serde(skip_serializing_if = "is_zero")]
    pub age: u16,
}

impl PersonFields {
    /// Returns true if the enrichment services have something to fill in.
    pub fn needs_enrichment(&self) -> bool {
        self.country.is_empty() || self.gender.is_empty() || self.age == 0
    }
}

/// A person as stored in the database.
#[derive(Clone, Constructor, Debug, Deserialize, Eq, Getters, PartialEq, Serialize)]
pub struct Person {
    /// Identifier of the person.
    id: PersonId,

    /// Attributes of the person.
    #[serde(flatten)]
    fields: PersonFields,
}

impl Person {
    /// Consumes the person and returns its attributes.
    #[cfg(test)]
    pub fn into_fields(self) -> PersonFields {
        self.fields
    }
}
