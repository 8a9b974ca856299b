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

//! API to register a new user.

use crate::driver::Driver;
use crate::model::{DisplayName, EmailAddress, Password, Role};
use crate::rest::{RestError, UserResponse};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{http, Json};
use serde::Deserialize;
#[cfg(test)]
use serde::Serialize;

/// Message sent to the server to register a new user.
#[derive(Debug, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct RegisterRequest {
    /// Name of the user.
    pub(crate) name: DisplayName,

    /// Email of the user.
    pub(crate) email: EmailAddress,

    /// Password in plain text.
    pub(crate) password: Password,

    /// Role to register under.  Defaults to rider when not given.
    #[serde(default)]
    pub(crate) role: Role,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(request): Json<RegisterRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let user =
        driver.register(request.name, request.email, request.password, request.role).await?;
    Ok((http::StatusCode::CREATED, Json(UserResponse::from(user))))
}
