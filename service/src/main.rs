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

//! Entry point to the people registry service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use log::{error, info, warn};
use people_core::db::Db;
use people_core::db::postgres::{PostgresDb, PostgresOptions};
use people_core::env::get_optional_var;
use people_lookup::{PublicApisLookup, PublicApisOptions};
use people_service::db::init_schema;
use people_service::{DriverOptions, ServerOptions, check_timeouts, serve};
use std::process;
use std::sync::Arc;

/// Configures logging based on the `PEOPLE_ENV` variable.
///
/// `debug` enables verbose logs and `text`, the default, only shows informational messages.  In
/// both cases, `RUST_LOG` takes precedence to select the log level.
fn setup_logging() -> Result<(), String> {
    let mode = get_optional_var::<String>("PEOPLE", "ENV")?.unwrap_or_else(|| "text".to_owned());
    let default_level = match mode.as_str() {
        "debug" => "debug",
        "text" => "info",
        mode => return Err(format!("Invalid PEOPLE_ENV value '{}'", mode)),
    };

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if mode == "debug" {
        builder.format_timestamp_millis().format_target(true);
    }
    builder.init();
    info!("Starting people registry with env={}", mode);
    Ok(())
}

/// Waits until the process is asked to terminate.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to wait for the interrupt signal: {}", e);
    }
    info!("Shutting down");
}

/// Loads the configuration, sets up all resources and serves the app.
async fn run() -> Result<(), String> {
    let server_opts = ServerOptions::from_env("PEOPLE")?;
    let driver_opts = DriverOptions::from_env("PEOPLE")?;
    check_timeouts(&server_opts, &driver_opts)?;
    let db_opts = PostgresOptions::from_env("PGSQL_PROD")?;
    let lookup_opts = PublicApisOptions::from_env("LOOKUP")?;

    let db = Arc::new(PostgresDb::connect(db_opts).map_err(|e| e.to_string())?);
    let result = match db.ex().await {
        Ok(mut ex) => match init_schema(&mut ex).await {
            Ok(()) => {
                drop(ex);
                let lookup = Arc::new(PublicApisLookup::new(lookup_opts));
                serve(server_opts, driver_opts, db.clone(), lookup, shutdown_signal())
                    .await
                    .map_err(|e| e.to_string())
            }
            Err(e) => Err(format!("Failed to initialize database schema: {}", e)),
        },
        Err(e) => Err(format!("Failed to connect to the database: {}", e)),
    };
    db.close().await;
    result
}

#[tokio::main]
async fn main() {
    if let Err(e) = setup_logging() {
        eprintln!("{}", e);
        process::exit(2);
    }

    if let Err(e) = run().await {
        error!("{}", e);
        process::exit(1);
    }
}
