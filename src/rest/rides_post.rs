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

//! API to request a new ride.

use crate::driver::Driver;
use crate::rest::{get_bearer_auth, RestError, RideResponse, REALM};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{http, Json};
use serde::Deserialize;
#[cfg(test)]
use serde::Serialize;

/// Message sent to the server to request a new ride.
#[derive(Debug, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct RideRequest {
    /// Where the rider wants to be picked up.
    pub(crate) origin: String,

    /// Where the rider wants to go.
    pub(crate) destination: String,

    /// How the rider intends to pay.
    pub(crate) payment_method: String,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    Json(request): Json<RideRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let token = get_bearer_auth(&headers, REALM)?;
    let ride = driver
        .request_ride(token, request.origin, request.destination, request.payment_method)
        .await?;
    Ok((http::StatusCode::CREATED, Json(RideResponse::from(ride))))
}
