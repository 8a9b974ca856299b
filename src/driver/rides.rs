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

//! Extends the driver with the operations on rides.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{AccessToken, ModelResult, Price, Ride, RideId, RideStatus};
use rand::Rng;

/// Lower bound of the fare quote, inclusive.
const MIN_FARE: f64 = 15.0;

/// Upper bound of the fare quote, inclusive.
const MAX_FARE: f64 = 80.0;

/// Computes the fare to quote for a new ride.
///
/// This is a placeholder policy inherited from the first version of the service: a uniform
/// random amount within a fixed band, rounded to cents.  A real pricing model would look at
/// the route instead.
fn quote_fare() -> ModelResult<Price> {
    let amount = rand::rng().random_range(MIN_FARE..=MAX_FARE);
    Price::new((amount * 100.0).round() / 100.0)
}

impl Driver {
    /// Creates a new pending ride on behalf of the rider identified by `token`.
    pub(crate) async fn request_ride(
        self,
        token: AccessToken,
        origin: String,
        destination: String,
        payment_method: String,
    ) -> DriverResult<Ride> {
        let mut ex = self.db.ex().await?;
        let now = self.clock.now_utc();

        let caller = self.resolve_caller(&mut ex, now, token).await?;
        if caller.role().is_driver() {
            return Err(DriverError::Forbidden("Only riders can request rides".to_owned()));
        }

        let ride = Ride::new(
            RideId::random(),
            origin,
            destination,
            payment_method,
            quote_fare()?,
            caller.id(),
            now,
        );
        db::create_ride(&mut ex, &ride).await?;
        Ok(ride)
    }

    /// Returns all rides that no driver has claimed yet, oldest first.
    pub(crate) async fn list_pending_rides(self, token: AccessToken) -> DriverResult<Vec<Ride>> {
        let mut ex = self.db.ex().await?;
        let now = self.clock.now_utc();

        let caller = self.resolve_caller(&mut ex, now, token).await?;
        if !caller.role().is_driver() {
            return Err(DriverError::Forbidden("Only drivers can list pending rides".to_owned()));
        }

        Ok(db::list_rides_by_status(&mut ex, RideStatus::Pending).await?)
    }

    /// Returns all rides requested by the rider identified by `token`, oldest first.
    pub(crate) async fn list_rides_as_rider(self, token: AccessToken) -> DriverResult<Vec<Ride>> {
        let mut ex = self.db.ex().await?;
        let now = self.clock.now_utc();

        let caller = self.resolve_caller(&mut ex, now, token).await?;
        if caller.role().is_driver() {
            return Err(DriverError::Forbidden(
                "Only riders can list their requested rides".to_owned(),
            ));
        }

        Ok(db::list_rides_by_rider(&mut ex, caller.id()).await?)
    }

    /// Returns all rides claimed by the driver identified by `token`, oldest first.
    pub(crate) async fn list_rides_as_driver(self, token: AccessToken) -> DriverResult<Vec<Ride>> {
        let mut ex = self.db.ex().await?;
        let now = self.clock.now_utc();

        let caller = self.resolve_caller(&mut ex, now, token).await?;
        if !caller.role().is_driver() {
            return Err(DriverError::Forbidden(
                "Only drivers can list their claimed rides".to_owned(),
            ));
        }

        Ok(db::list_rides_by_driver(&mut ex, caller.id()).await?)
    }

    /// Claims the pending ride `ride_id` for the driver identified by `token`, moving it to
    /// in-progress.
    ///
    /// The first driver whose claim lands wins; any later claim observes the ride out of the
    /// pending state and fails with `InvalidTransition`.
    pub(crate) async fn accept_ride(
        self,
        token: AccessToken,
        ride_id: RideId,
    ) -> DriverResult<Ride> {
        let mut tx = self.db.begin().await?;
        let now = self.clock.now_utc();

        let caller = self.resolve_caller(tx.ex(), now, token).await?;
        if !caller.role().is_driver() {
            return Err(DriverError::Forbidden("Only drivers can accept rides".to_owned()));
        }

        let claimed = db::claim_ride(tx.ex(), ride_id, caller.id()).await?;
        if !claimed {
            // The guarded update did not take effect, so re-read the ride to find out why.
            match db::get_ride(tx.ex(), ride_id).await {
                Ok(_ride) => {
                    return Err(DriverError::InvalidTransition(
                        "Ride has already been accepted or completed".to_owned(),
                    ));
                }
                Err(DbError::NotFound) => {
                    return Err(DriverError::NotFound(format!("Ride {} does not exist", ride_id)));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let ride = db::get_ride(tx.ex(), ride_id).await?;
        tx.commit().await?;
        Ok(ride)
    }

    /// Completes the in-progress ride `ride_id` on behalf of its assigned driver.
    pub(crate) async fn complete_ride(
        self,
        token: AccessToken,
        ride_id: RideId,
    ) -> DriverResult<Ride> {
        let mut tx = self.db.begin().await?;
        let now = self.clock.now_utc();

        let caller = self.resolve_caller(tx.ex(), now, token).await?;
        if !caller.role().is_driver() {
            return Err(DriverError::Forbidden("Only drivers can complete rides".to_owned()));
        }

        let finished = db::finish_ride(tx.ex(), ride_id, caller.id()).await?;
        if !finished {
            // The guarded update did not take effect, so re-read the ride to find out why.
            let ride = match db::get_ride(tx.ex(), ride_id).await {
                Ok(ride) => ride,
                Err(DbError::NotFound) => {
                    return Err(DriverError::NotFound(format!("Ride {} does not exist", ride_id)));
                }
                Err(e) => return Err(e.into()),
            };
            if ride.driver_id() != Some(caller.id()) {
                return Err(DriverError::Forbidden(
                    "Caller is not the driver of this ride".to_owned(),
                ));
            }
            return Err(DriverError::InvalidTransition(
                "Only in-progress rides can be completed".to_owned(),
            ));
        }

        let ride = db::get_ride(tx.ex(), ride_id).await?;
        tx.commit().await?;
        Ok(ride)
    }

    /// Returns the ride `ride_id`, which must have the caller as one of its participants.
    pub(crate) async fn get_ride(self, token: AccessToken, ride_id: RideId) -> DriverResult<Ride> {
        let mut ex = self.db.ex().await?;
        let now = self.clock.now_utc();

        let caller = self.resolve_caller(&mut ex, now, token).await?;

        let ride = match db::get_ride(&mut ex, ride_id).await {
            Ok(ride) => ride,
            Err(DbError::NotFound) => {
                return Err(DriverError::NotFound(format!("Ride {} does not exist", ride_id)));
            }
            Err(e) => return Err(e.into()),
        };

        if !ride.is_participant(caller.id()) {
            return Err(DriverError::Forbidden(
                "Caller is not a participant of this ride".to_owned(),
            ));
        }

        Ok(ride)
    }
}
