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

//! API to replace all attributes of a person.

use crate::driver::Driver;
use crate::model::{PersonFields, PersonId};
use axum::extract::State;
use people_core::rest::{Envelope, JsonBody, RestError, RestResult};
use serde::Deserialize;

/// Message to edit a person.
#[derive(Deserialize)]
pub(crate) struct EditRequest {
    /// Identifier of the person to edit.
    id: PersonId,

    /// New attributes of the person.  Omitted attributes are cleared.
    #[serde(flatten)]
    fields: PersonFields,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    JsonBody(request): JsonBody<EditRequest>,
) -> RestResult<Envelope> {
    driver
        .edit_person(request.id, request.fields)
        .await
        .map_err(|e| RestError::from(e).with_summary("failed to edit person"))?;
    Ok(Envelope::ok())
}
