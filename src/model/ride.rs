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

//! The `Ride` data type and its companions.

use crate::model::{ModelError, ModelResult, RideId, UserId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// States a ride moves through during its lifetime.
///
/// The only valid transitions are pending to in-progress (when a driver claims
/// the ride) and in-progress to completed.  There is no cancellation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(rename_all = "snake_case")]
pub(crate) enum RideStatus {
    /// The ride has been requested but no driver has claimed it yet.
    Pending,

    /// A driver claimed the ride and is carrying it out.
    InProgress,

    /// The assigned driver finished the ride.  Terminal state.
    Completed,
}

impl RideStatus {
    /// Returns the status as persisted in the database.
    pub(crate) fn as_db_str(&self) -> &'static str {
        match self {
            RideStatus::Pending => "pending",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
        }
    }

    /// Parses a status as extracted from the database.
    pub(crate) fn from_db_str(s: &str) -> ModelResult<RideStatus> {
        match s {
            "pending" => Ok(RideStatus::Pending),
            "in_progress" => Ok(RideStatus::InProgress),
            "completed" => Ok(RideStatus::Completed),
            s => Err(ModelError(format!("Unknown ride status '{}'", s))),
        }
    }
}

/// Fare charged for a ride, in currency units with two-decimal precision.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(transparent)]
pub(crate) struct Price(f64);

impl Price {
    /// Creates a new price from a raw `amount`, making sure it is representable.
    pub(crate) fn new(amount: f64) -> ModelResult<Self> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ModelError(format!("Price {} is not a positive amount", amount)));
        }
        Ok(Self(amount))
    }

    /// Returns the raw amount of the price.
    pub(crate) fn as_f64(&self) -> f64 {
        self.0
    }
}

/// Representation of a ride and its current position in the lifecycle.
#[cfg_attr(test, derive(Clone, Debug, PartialEq))]
pub(crate) struct Ride {
    /// Identifier of the ride.
    id: RideId,

    /// Where the rider wants to be picked up.
    origin: String,

    /// Where the rider wants to go.
    destination: String,

    /// How the rider intends to pay, as a free-form label.
    payment_method: String,

    /// Fare quoted at creation time.
    price: Price,

    /// Current state of the ride.
    status: RideStatus,

    /// The rider that requested the ride.  Immutable.
    rider_id: UserId,

    /// The driver that claimed the ride.  None while the ride is pending.
    driver_id: Option<UserId>,

    /// Timestamp of the ride request.
    created_at: OffsetDateTime,
}

impl Ride {
    /// Creates a new ride in the pending state with no driver assigned yet.
    pub(crate) fn new(
        id: RideId,
        origin: String,
        destination: String,
        payment_method: String,
        price: Price,
        rider_id: UserId,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            origin,
            destination,
            payment_method,
            price,
            status: RideStatus::Pending,
            rider_id,
            driver_id: None,
            created_at,
        }
    }

    /// Modifies a ride to reflect a different status.
    pub(crate) fn with_status(mut self, status: RideStatus) -> Self {
        self.status = status;
        self
    }

    /// Modifies a ride to reflect its assigned driver.
    pub(crate) fn with_driver(mut self, driver_id: UserId) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    /// Gets the ride's identifier.
    pub(crate) fn id(&self) -> RideId {
        self.id
    }

    /// Gets the ride's origin.
    pub(crate) fn origin(&self) -> &str {
        &self.origin
    }

    /// Gets the ride's destination.
    pub(crate) fn destination(&self) -> &str {
        &self.destination
    }

    /// Gets the ride's payment method.
    pub(crate) fn payment_method(&self) -> &str {
        &self.payment_method
    }

    /// Gets the ride's quoted fare.
    pub(crate) fn price(&self) -> Price {
        self.price
    }

    /// Gets the ride's current status.
    pub(crate) fn status(&self) -> RideStatus {
        self.status
    }

    /// Gets the rider that requested the ride.
    pub(crate) fn rider_id(&self) -> UserId {
        self.rider_id
    }

    /// Gets the driver assigned to the ride, if any.
    pub(crate) fn driver_id(&self) -> Option<UserId> {
        self.driver_id
    }

    /// Gets the timestamp of the ride request.
    pub(crate) fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Checks whether `user_id` is the rider or the assigned driver of this ride.
    pub(crate) fn is_participant(&self, user_id: UserId) -> bool {
        self.rider_id == user_id || self.driver_id == Some(user_id)
    }
}
