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

//! HTTP service to manage a registry of people.
//!
//! New people get their unknown age, gender and country guessed from their first name at creation
//! time.  See the `rest` module for the exposed APIs.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use axum::Router;
use axum_server::Handle;
use hyper_util::rt::TokioTimer;
use log::info;
use people_core::db::Db;
use people_core::env::get_optional_var;
use people_lookup::NameLookup;
use std::error::Error;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub mod db;
mod driver;
pub use driver::DriverOptions;
use driver::Driver;
pub(crate) mod model;
mod rest;
use rest::app;

/// Default address to listen on.
const DEFAULT_ADDRESS: ([u8; 4], u16) = ([127, 0, 0, 1], 8082);

/// Default maximum time to process a request.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Default maximum time a connection may wait for the headers of its next request.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration options for the HTTP server.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerOptions {
    /// Address to listen on.
    pub address: SocketAddr,

    /// Maximum time to process a request before responding with a timeout error.
    pub request_timeout: Duration,

    /// Maximum time a connection can stay open without delivering the headers of a request.
    pub idle_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(DEFAULT_ADDRESS),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl ServerOptions {
    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_ADDRESS`, `<prefix>_TIMEOUT` and
    /// `<prefix>_IDLE_TIMEOUT`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            address: get_optional_var::<SocketAddr>(prefix, "ADDRESS")?
                .unwrap_or(defaults.address),
            request_timeout: get_optional_var::<Duration>(prefix, "TIMEOUT")?
                .unwrap_or(defaults.request_timeout),
            idle_timeout: get_optional_var::<Duration>(prefix, "IDLE_TIMEOUT")?
                .unwrap_or(defaults.idle_timeout),
        })
    }
}

/// Checks that a stalled lookup gives up before the request that issued it does.
///
/// Otherwise the request timeout aborts an add before the unknown values can be stored.
pub fn check_timeouts(
    server_opts: &ServerOptions,
    driver_opts: &DriverOptions,
) -> Result<(), String> {
    if driver_opts.lookup_timeout >= server_opts.request_timeout {
        return Err(format!(
            "Lookup timeout {:?} must be shorter than the request timeout {:?}",
            driver_opts.lookup_timeout, server_opts.request_timeout
        ));
    }
    Ok(())
}

/// Serves `app` on `server_opts.address` until `handle` is told to shut down.
async fn serve_app(server_opts: &ServerOptions, app: Router, handle: Handle) -> io::Result<()> {
    let mut server = axum_server::bind(server_opts.address).handle(handle);
    server
        .http_builder()
        .http1()
        .timer(TokioTimer::new())
        .keep_alive(true)
        .header_read_timeout(server_opts.idle_timeout);
    server.serve(app.into_make_service()).await
}

/// Instantiates all resources to serve the application and serves it until `shutdown` resolves.
///
/// Requests in flight when `shutdown` resolves get up to the request timeout to complete.
pub async fn serve(
    server_opts: ServerOptions,
    driver_opts: DriverOptions,
    db: Arc<dyn Db + Send + Sync>,
    lookup: Arc<dyn NameLookup + Send + Sync>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn Error>> {
    check_timeouts(&server_opts, &driver_opts)?;

    let driver = Driver::new(db, lookup, driver_opts);
    let app = app(driver, server_opts.request_timeout);

    let handle = Handle::new();
    {
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Some(address) = handle.listening().await {
                info!("Listening on {}", address);
            }
        });
    }
    {
        let handle = handle.clone();
        let grace = server_opts.request_timeout;
        tokio::spawn(async move {
            shutdown.await;
            handle.graceful_shutdown(Some(grace));
        });
    }

    serve_app(&server_opts, app, handle).await?;
    Ok(())
}
