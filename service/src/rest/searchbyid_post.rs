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

//! API to get a person by identifier.

use crate::driver::Driver;
use crate::model::Person;
use crate::rest::{IdRequest, search_error};
use axum::extract::State;
use people_core::rest::{Enveloped, JsonBody, RestResult};

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    JsonBody(request): JsonBody<IdRequest>,
) -> RestResult<Enveloped<Person>> {
    let person = driver.get_person_by_id(request.id).await.map_err(search_error)?;
    Ok(Enveloped::ok(person))
}
