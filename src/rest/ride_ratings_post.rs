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

//! API for a participant of a completed ride to rate the other participant.

use crate::driver::Driver;
use crate::model::{RideId, Score};
use crate::rest::{get_bearer_auth, RatingResponse, RestError, REALM};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{http, Json};
use serde::Deserialize;
#[cfg(test)]
use serde::Serialize;

/// Message sent to the server to rate the counterpart of a ride.
#[derive(Debug, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct RateRequest {
    /// Score to hand out.
    pub(crate) score: Score,

    /// Free-form comment accompanying the score.
    #[serde(default)]
    pub(crate) comment: Option<String>,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(ride_id): Path<RideId>,
    headers: HeaderMap,
    Json(request): Json<RateRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let token = get_bearer_auth(&headers, REALM)?;
    let rating = driver.rate_ride(token, ride_id, request.score, request.comment).await?;
    Ok((http::StatusCode::CREATED, Json(RatingResponse::from(rating))))
}
