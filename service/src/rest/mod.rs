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

//! REST interface for the people registry.

use crate::driver::Driver;
use crate::model::PersonId;
use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::middleware;
use axum::routing::post;
use people_core::driver::DriverError;
use people_core::rest::{RestError, panic_response, request_context, timeout_error};
use serde::Deserialize;
use std::time::Duration;
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::catch_panic::CatchPanicLayer;

mod add_post;
mod del_post;
mod editbyid_post;
mod searchbyid_post;
mod searchbyname_post;
#[cfg(test)]
mod testutils;

/// Request body for the APIs that operate on a single person by identifier.
#[derive(Deserialize)]
pub(crate) struct IdRequest {
    /// Identifier of the person to operate on.
    id: PersonId,
}

/// Converts a `DriverError` from a search into a `RestError`.
fn search_error(e: DriverError) -> RestError {
    match e {
        DriverError::NotFound(_) => RestError::NotFound("person not found".to_owned()),
        e => RestError::from(e).with_summary("failed to search person"),
    }
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver, request_timeout: Duration) -> Router {
    Router::new()
        .route("/add", post(add_post::handler))
        .route("/del", post(del_post::handler))
        .route("/editbyid", post(editbyid_post::handler))
        .route("/searchbyid", post(searchbyid_post::handler))
        .route("/searchbyname", post(searchbyname_post::handler))
        .with_state(driver)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(timeout_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(middleware::from_fn(request_context))
}
