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

//! API to delete a person.

use crate::driver::Driver;
use crate::rest::IdRequest;
use axum::extract::State;
use people_core::rest::{Envelope, JsonBody, RestError, RestResult};

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    JsonBody(request): JsonBody<IdRequest>,
) -> RestResult<Envelope> {
    driver
        .delete_person(request.id)
        .await
        .map_err(|e| RestError::from(e).with_summary("failed to delete person"))?;
    Ok(Envelope::ok())
}

#[cfg(test)]
mod tests {
    use crate::model::*;
    use crate::rest::testutils::*;
    use axum::http;
    use people_core::db::DbError;
    use people_core::rest::testutils::*;
    use serde_json::json;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/del".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let fields = PersonFields {
            name: "Bob".to_owned(),
            surname: "Jones".to_owned(),
            ..Default::default()
        };
        let id1 = context.create_person(&fields).await;
        let id2 = context.create_person(&fields).await;

        OneShotBuilder::new(context.app(), route())
            .send_json(json!({"id": id1.as_i32()}))
            .await
            .expect_ok()
            .await;

        assert_eq!(Err(DbError::NotFound), context.get_person(id1).await);
        context.get_person(id2).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_is_ok() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_json(json!({"id": 123}))
            .await
            .expect_ok()
            .await;
    }

    #[tokio::test]
    async fn test_id_is_required() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_json(json!({"name": "Bob"}))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("^failed to decode request$")
            .await;
    }

    #[tokio::test]
    async fn test_backend_error() {
        let context = TestContext::setup().await;
        context.break_db().await;

        OneShotBuilder::new(context.app(), route())
            .send_json(json!({"id": 1}))
            .await
            .expect_status(http::StatusCode::INTERNAL_SERVER_ERROR)
            .expect_error("^failed to delete person$")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.app(), route());
}
