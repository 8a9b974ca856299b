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

//! Entry point to the REST server.
//!
//! Every API is put in its own `.rs` file, using a name like `<entity>_<method>.rs`.  This
//! may seem overkill, but putting every API in its own file makes it easy to ensure all the
//! integration tests for the given API truly belong to that API.
//!
//! More specifically, the `tests` module within an API defines a `route` method that returns
//! the HTTP method and the API path under test.  All integration tests within the module then
//! rely on `route` to obtain this information, ensuring that they all test the desired API.

use crate::driver::{Driver, DriverError};
use crate::model::{EmailAddress, ModelError, Price, Rating, RatingId, Ride, RideId};
use crate::model::{RideStatus, Role, Score, User, UserId};
use async_trait::async_trait;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

mod httputils;
pub(crate) use httputils::{get_basic_auth, get_bearer_auth};
mod login_post;
mod ride_accept_put;
mod ride_complete_put;
mod ride_get;
mod ride_ratings_post;
mod rides_assigned_get;
mod rides_mine_get;
mod rides_pending_get;
mod rides_post;
mod user_ratings_get;
mod users_post;
#[cfg(test)]
pub(crate) mod testutils;

/// Authentication realm to return to unauthenticated requests.
pub(crate) const REALM: &str = "ridehail";

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum RestError {
    /// Indicates that a request conflicts with existing state: a duplicate entry or a ride
    /// transition that the state machine does not allow.
    #[error("{0}")]
    Conflict(String),

    /// Indicates an authorization problem.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that a request that should have empty content did not.
    #[error("Content should be empty")]
    PayloadNotEmpty,

    /// Indicates an authentication problem.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Expected authorization scheme.
        scheme: &'static str,

        /// Expected authorization realm.
        realm: &'static str,

        /// Descriptive message explaining the nature of the problem.
        message: String,
    },
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) => RestError::Conflict(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::Forbidden(_) => RestError::Forbidden(e.to_string()),
            DriverError::InvalidInput(_) => RestError::InvalidRequest(e.to_string()),
            DriverError::InvalidTransition(_) => RestError::Conflict(e.to_string()),
            DriverError::NotFound(_) => RestError::NotFound(e.to_string()),
            DriverError::Unauthenticated(message) => {
                RestError::Unauthorized { scheme: "Bearer", realm: REALM, message }
            }
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> axum::response::Response {
        let status;
        let mut headers = HeaderMap::new();
        match self {
            RestError::Conflict(_) => {
                status = http::StatusCode::CONFLICT;
            }
            RestError::Forbidden(_) => {
                status = http::StatusCode::FORBIDDEN;
            }
            RestError::InternalError(_) => {
                status = http::StatusCode::INTERNAL_SERVER_ERROR;
            }
            RestError::InvalidRequest(_) => {
                status = http::StatusCode::BAD_REQUEST;
            }
            RestError::NotFound(_) => {
                status = http::StatusCode::NOT_FOUND;
            }
            RestError::PayloadNotEmpty => {
                status = http::StatusCode::PAYLOAD_TOO_LARGE;
            }
            RestError::Unauthorized { scheme, realm, message: _ } => {
                status = http::StatusCode::UNAUTHORIZED;
                headers.insert(
                    "WWW-Authenticate",
                    format!("{} realm=\"{}\"", scheme, realm)
                        .parse()
                        .expect("Static realm and scheme must form a valid header"),
                );
            }
        };

        let response = ErrorResponse { message: self.to_string() };

        (status, headers, Json(response)).into_response()
    }
}

/// Result type for this module.
pub(crate) type RestResult<T> = Result<T, RestError>;

/// Representation of the details of an error response.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct ErrorResponse {
    /// Textual representation of the error message.
    pub(crate) message: String,
}

/// Representation of a user in API responses.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub(crate) struct UserResponse {
    /// Identifier of the user.
    pub(crate) id: UserId,

    /// Name of the user.
    pub(crate) name: String,

    /// Email of the user.
    pub(crate) email: EmailAddress,

    /// Role of the user.
    pub(crate) role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id(),
            name: user.name().as_str().to_owned(),
            email: user.email().clone(),
            role: user.role(),
        }
    }
}

/// Representation of a ride in API responses.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub(crate) struct RideResponse {
    /// Identifier of the ride.
    pub(crate) id: RideId,

    /// Where the rider wants to be picked up.
    pub(crate) origin: String,

    /// Where the rider wants to go.
    pub(crate) destination: String,

    /// How the rider intends to pay.
    pub(crate) payment_method: String,

    /// Fare quoted at creation time.
    pub(crate) price: Price,

    /// Current state of the ride.
    pub(crate) status: RideStatus,

    /// The rider that requested the ride.
    pub(crate) rider_id: UserId,

    /// The driver that claimed the ride, if any.
    pub(crate) driver_id: Option<UserId>,
}

impl From<Ride> for RideResponse {
    fn from(ride: Ride) -> Self {
        Self {
            id: ride.id(),
            origin: ride.origin().to_owned(),
            destination: ride.destination().to_owned(),
            payment_method: ride.payment_method().to_owned(),
            price: ride.price(),
            status: ride.status(),
            rider_id: ride.rider_id(),
            driver_id: ride.driver_id(),
        }
    }
}

/// Representation of a rating in API responses.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub(crate) struct RatingResponse {
    /// Identifier of the rating.
    pub(crate) id: RatingId,

    /// The ride this rating refers to.
    pub(crate) ride_id: RideId,

    /// The participant that left the rating.
    pub(crate) rater_id: UserId,

    /// The participant the rating is about.
    pub(crate) rated_id: UserId,

    /// Score handed out by the rater.
    pub(crate) score: Score,

    /// Free-form comment accompanying the score, if any.
    pub(crate) comment: Option<String>,
}

impl From<Rating> for RatingResponse {
    fn from(rating: Rating) -> Self {
        Self {
            id: *rating.id(),
            ride_id: *rating.ride_id(),
            rater_id: *rating.rater_id(),
            rated_id: *rating.rated_id(),
            score: *rating.score(),
            comment: rating.comment().clone(),
        }
    }
}

/// A request body extractor that forbids any content.
///
/// Any API that doesn't expect a body should use this to ensure we don't get garbage data that
/// we don't care about.  This future-proofs the service.
pub(crate) struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if req.into_body().is_end_stream() {
            Ok(EmptyBody {})
        } else {
            Err(RestError::PayloadNotEmpty)
        }
    }
}

/// Extracts the header `name` from `headers` and ensures it has at most one value.
pub(crate) fn get_unique_header<'a>(
    headers: &'a HeaderMap,
    name: &str,
) -> RestResult<Option<&'a HeaderValue>> {
    let mut iter = headers.get_all(name).iter();
    let value = iter.next();
    if iter.next().is_some() {
        return Err(RestError::InvalidRequest(format!(
            "Header {} cannot have more than one value",
            name.to_ascii_lowercase()
        )));
    }
    Ok(value)
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::{get, post, put};

    Router::new()
        .route("/api/v1/login", post(login_post::handler))
        .route("/api/v1/users", post(users_post::handler))
        .route("/api/v1/users/:user_id/ratings", get(user_ratings_get::handler))
        .route("/api/v1/rides", post(rides_post::handler))
        .route("/api/v1/rides/pending", get(rides_pending_get::handler))
        .route("/api/v1/rides/mine", get(rides_mine_get::handler))
        .route("/api/v1/rides/assigned", get(rides_assigned_get::handler))
        .route("/api/v1/rides/:ride_id", get(ride_get::handler))
        .route("/api/v1/rides/:ride_id/accept", put(ride_accept_put::handler))
        .route("/api/v1/rides/:ride_id/complete", put(ride_complete_put::handler))
        .route("/api/v1/rides/:ride_id/ratings", post(ride_ratings_post::handler))
        .with_state(driver)
}
