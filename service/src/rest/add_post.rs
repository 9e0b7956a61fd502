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

//! API to add a new person.

use crate::driver::Driver;
use crate::model::PersonFields;
use axum::extract::State;
use people_core::rest::{Envelope, JsonBody, RestError, RestResult};

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    JsonBody(fields): JsonBody<PersonFields>,
) -> RestResult<Envelope> {
    driver
        .add_person(fields)
        .await
        .map_err(|e| RestError::from(e).with_summary("failed to add person"))?;
    Ok(Envelope::ok())
}
