// Ridehail
// Copyright 2025 Julio Merino
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

//! REST service implementing a minimal ride-hailing backend.
//!
//! Riders register, request rides, and rate drivers after a completed ride;
//! drivers claim pending rides and complete them.  The code is structured in
//! the usual layered fashion:
//!
//! 1.  `model`: High-level data types that represent concepts in the domain of
//!     the application.  There is no logic in here beyond construction-time
//!     validation.  Extensive use of the newtype pattern.
//!
//! 1.  `db`: The persistence layer.  Exposes free functions that run queries
//!     against a generic `Executor`, which can be backed by PostgreSQL (the
//!     production database) or SQLite (for tests).
//!
//! 1.  `driver`: The business logic layer.  The `Driver` type coordinates
//!     access to the database and enforces the authorization rules and the
//!     ride state machine.
//!
//! 1.  `rest`: The HTTP layer, offering the REST APIs.  Every API lives in
//!     its own file and is backed by a `Driver` instance.
//!
//! 1.  `main`: The app launcher.  Its sole purpose is to gather configuration
//!     data from environment variables and call `serve`.
//!
//! There are result and error types in every layer, such as `DbResult` and
//! `DbError`.  Errors transparently float to the top of the app using the `?`
//! operator and are translated to HTTP status codes once returned from the
//! REST layer.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use crate::clocks::SystemClock;
use crate::db::Db;
use crate::driver::Driver;
use log::info;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub mod clocks;
pub mod db;
pub mod driver;
pub mod env;
pub(crate) mod model;
mod rest;

/// Instantiates all resources to serve the application on `bind_addr`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would
/// force us to expose many crate-internal types to the public, which in turn
/// would make dead code detection harder.
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    db: Box<dyn Db + Send + Sync>,
) -> Result<(), Box<dyn Error>> {
    let driver = Driver::new(Arc::from(db), Arc::from(SystemClock::default()));
    let app = rest::app(driver);

    let listener = tokio::net::TcpListener::bind(bind_addr.into()).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
