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

//! HTTP plumbing shared by the services' REST layers.
//!
//! A service exposes an `app` function that assembles its `Router`, with one file per endpoint
//! named after the endpoint and its method (as in `add_post.rs`).  Each endpoint's tests define a
//! `route` helper returning the method and path they exercise.
//!
//! Every response, successful or not, is a JSON object carrying a `status` field, possibly merged
//! with the fields of a payload.  See `Envelope`.

use crate::driver::DriverError;
use async_trait::async_trait;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::time::Instant;

/// Name of the header that carries the identifier of a request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Message returned to the caller when the request body cannot be decoded.
const DECODE_ERROR_MESSAGE: &str = "failed to decode request";

/// Errors reported to HTTP clients.  The message becomes the `error` field of the envelope.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// Something broke on our side (500).
    #[error("{0}")]
    InternalError(String),

    /// The request cannot be served as sent (400).
    #[error("{0}")]
    InvalidRequest(String),

    /// The entity named by the request does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// The request did not finish within the server's deadline (408).
    #[error("request timed out")]
    Timeout,
}

impl RestError {
    /// Replaces the details of an internal error with a generic `summary` so that backend
    /// details do not leak to callers.  The details are logged instead.
    pub fn with_summary(self, summary: &str) -> Self {
        match self {
            RestError::InternalError(details) => {
                warn!("{}: {}", summary, details);
                RestError::InternalError(summary.to_owned())
            }
            e => e,
        }
    }
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(detail) | DriverError::InvalidInput(detail) => {
                RestError::InvalidRequest(detail)
            }
            DriverError::BackendError(detail) => RestError::InternalError(detail),
            DriverError::NotFound(detail) => RestError::NotFound(detail),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = match self {
            RestError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::Timeout => StatusCode::REQUEST_TIMEOUT,
        };

        (status, Envelope::error(self.to_string())).into_response()
    }
}

/// Result type for handlers.
pub type RestResult<T> = Result<T, RestError>;

/// Outcome of a request as reported in the `status` field of an `Envelope`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum Status {
    /// The request succeeded.
    #[serde(rename = "OK")]
    Ok,

    /// The request failed and the envelope carries an error message.
    #[serde(rename = "Error")]
    Error,
}

/// The wrapper shared by all responses: `{"status": "OK"|"Error", "error": "..."}`.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct Envelope {
    /// Outcome of the request.
    pub status: Status,

    /// Textual description of the failure, only present when `status` is `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Creates an envelope for a successful request.
    pub fn ok() -> Self {
        Self { status: Status::Ok, error: None }
    }

    /// Creates an envelope for a failed request described by `message`.
    pub fn error<S: Into<String>>(message: S) -> Self {
        Self { status: Status::Error, error: Some(message.into()) }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// A successful envelope whose `payload` fields are merged at the top level of the response.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct Enveloped<T> {
    /// The status fields of the response.
    #[serde(flatten)]
    pub envelope: Envelope,

    /// The actual contents of the response.
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Enveloped<T> {
    /// Wraps `payload` in an OK envelope.
    pub fn ok(payload: T) -> Self {
        Self { envelope: Envelope::ok(), payload }
    }
}

impl<T: Serialize> IntoResponse for Enveloped<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// A request body extractor that decodes JSON regardless of the request's content type.
///
/// Decoding failures are reported as a `RestError` so that they are rendered as an `Envelope`
/// like any other failure.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|e| {
            warn!("Failed to read request body: {}", e);
            RestError::InvalidRequest(DECODE_ERROR_MESSAGE.to_owned())
        })?;
        match serde_json::from_slice::<T>(&body) {
            Ok(value) => Ok(JsonBody(value)),
            Err(e) => {
                warn!("Failed to decode request body: {}", e);
                Err(RestError::InvalidRequest(DECODE_ERROR_MESSAGE.to_owned()))
            }
        }
    }
}

/// Middleware that tags every request with an identifier and emits one access log line for it.
///
/// The identifier is taken from the `x-request-id` header of the request if present, or freshly
/// generated otherwise, and is echoed back in the same header of the response.
pub async fn request_context(req: Request, next: Next) -> Response {
    let request_id = match req.headers().get(REQUEST_ID_HEADER).map(HeaderValue::to_str) {
        Some(Ok(value)) => value.to_owned(),
        _ => uuid::Uuid::new_v4().to_string(),
    };

    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let start = Instant::now();

    let mut response = next.run(req).await;

    info!(
        "request_id={} method={} path={} status={} elapsed_ms={}",
        request_id,
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Converts an error raised by the timeout layer into a response.
pub async fn timeout_error(e: axum::BoxError) -> RestError {
    warn!("Request aborted: {}", e);
    RestError::Timeout
}

/// Converts a panic caught while handling a request into a response.
pub fn panic_response(details: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = details.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = details.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    error!("Request handler panicked: {}", details);
    RestError::InternalError("internal error".to_owned()).into_response()
}

/// Helpers to drive a `Router` in tests without opening sockets.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{self, HeaderName};
    use serde::Serialize;
    use tower::util::ServiceExt;

    /// Responses larger than this fail the test.
    const MAX_BODY_SIZE: usize = 4096;

    /// Describes one request to send to an app.
    #[must_use]
    pub struct OneShotBuilder {
        /// App that will serve the request.
        app: Router,

        /// Request under construction.
        builder: http::request::Builder,
    }

    impl OneShotBuilder {
        /// Starts a request to `route`, a method and path pair, served by `app`.
        pub fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
            let builder = http::Request::builder().method(method).uri(uri.as_ref());
            Self { app, builder }
        }

        /// Adds the header `name` with `value` to the request.
        pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
        where
            HeaderName: TryFrom<K>,
            <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
            HeaderValue: TryFrom<V>,
            <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
        {
            self.builder = self.builder.header(name, value);
            self
        }

        /// Sends the request with `body`, declaring `content_type` unless the caller already set
        /// one.
        async fn send(self, content_type: Option<&str>, body: Body) -> ResponseChecker {
            let mut builder = self.builder;
            let preset = builder
                .headers_ref()
                .is_some_and(|headers| headers.contains_key(http::header::CONTENT_TYPE));
            if let (Some(content_type), false) = (content_type, preset) {
                builder = builder.header(http::header::CONTENT_TYPE, content_type);
            }
            let request = builder.body(body).unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Sends the request without a body.
        pub async fn send_empty(self) -> ResponseChecker {
            self.send(None, Body::empty()).await
        }

        /// Sends the request with `text` as a `text/plain` body.
        pub async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
            self.send(Some(mime::TEXT_PLAIN.as_ref()), Body::from(text.into())).await
        }

        /// Sends the request with `payload` serialized as a JSON body.
        pub async fn send_json<T: Serialize>(self, payload: T) -> ResponseChecker {
            let body = Body::from(serde_json::to_vec(&payload).unwrap());
            self.send(Some(mime::APPLICATION_JSON.as_ref()), body).await
        }
    }

    /// Assertions over the response to a `OneShotBuilder` request.
    #[must_use]
    pub struct ResponseChecker {
        /// Response produced by the app.
        response: Response,

        /// Status code the response must carry; 200 unless told otherwise.
        exp_status: http::StatusCode,
    }

    impl From<Response> for ResponseChecker {
        fn from(response: Response) -> Self {
            Self { response, exp_status: http::StatusCode::OK }
        }
    }

    impl ResponseChecker {
        /// Expects the response to carry `status` instead of 200.
        pub fn expect_status(mut self, status: http::StatusCode) -> Self {
            self.exp_status = status;
            self
        }

        /// Checks the status code.
        pub fn verify(&self) {
            assert_eq!(self.exp_status, self.response.status());
        }

        /// Checks the status code and reads the whole body.
        async fn take_body(self) -> Bytes {
            self.verify();
            axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap()
        }

        /// Expects the body to be exactly `{"status":"OK"}`.
        pub async fn expect_ok(self) {
            let body = self.take_body().await;
            assert_eq!(r#"{"status":"OK"}"#, String::from_utf8_lossy(&body));
        }

        /// Expects the body to be an error envelope whose message matches the `exp_re` regex.
        pub async fn expect_error(self, exp_re: &str) {
            let body = self.take_body().await;
            let envelope = serde_json::from_slice::<Envelope>(&body).unwrap_or_else(|e| {
                panic!("Not an envelope ({}): {}", e, String::from_utf8_lossy(&body))
            });
            assert_eq!(Status::Error, envelope.status, "Envelope {:?} is not an error", envelope);
            let message = envelope.error.as_deref().unwrap_or("");
            assert!(
                regex::Regex::new(exp_re).unwrap().is_match(message),
                "Error message '{}' does not match '{}'",
                message,
                exp_re
            );
        }

        /// Expects the body to deserialize as `T` and returns it.
        pub async fn expect_json<T: DeserializeOwned>(self) -> T {
            let body = self.take_body().await;
            serde_json::from_slice::<T>(&body).unwrap()
        }

        /// Checks the status code and hands back the response for checks not covered here, such
        /// as headers.
        pub async fn take_response(self) -> Response {
            self.verify();
            self.response
        }
    }

    /// Defines a test checking that the endpoint at `route` of `app` answers 400 with an error
    /// envelope to bodies that are not valid JSON.
    #[macro_export]
    macro_rules! test_payload_must_be_json {
        ( $app:expr, $route:expr ) => {
            #[tokio::test]
            async fn test_payload_must_be_json() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .send_text("name=Dmitriy&surname=Ushakov")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_error("^failed to decode request$")
                    .await;

                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .with_header(axum::http::header::CONTENT_TYPE, "application/json")
                    .send_text("{\"unterminated\": ")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_error("^failed to decode request$")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_json;
}
