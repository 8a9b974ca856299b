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

//! Extends the driver with the operations on ratings.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{AccessToken, Rating, RatingId, RideId, RideStatus, Score, UserId};

impl Driver {
    /// Rates the counterpart of the completed ride `ride_id` on behalf of the participant
    /// identified by `token`: a rider rates the assigned driver and vice versa.
    ///
    /// Nothing prevents the same participant from rating the same ride more than once: every
    /// call records a new rating.
    pub(crate) async fn rate_ride(
        self,
        token: AccessToken,
        ride_id: RideId,
        score: Score,
        comment: Option<String>,
    ) -> DriverResult<Rating> {
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

        if ride.status() != RideStatus::Completed {
            return Err(DriverError::InvalidTransition(
                "Only completed rides can be rated".to_owned(),
            ));
        }

        let rated_id = if caller.id() == ride.rider_id() {
            ride.driver_id()
        } else if Some(caller.id()) == ride.driver_id() {
            Some(ride.rider_id())
        } else {
            return Err(DriverError::Forbidden(
                "Caller is not a participant of this ride".to_owned(),
            ));
        };
        // Completion requires an assigned driver, but the row comes straight from the store.
        let rated_id = match rated_id {
            Some(rated_id) => rated_id,
            None => {
                return Err(DriverError::InvalidTransition(
                    "Ride has nobody to rate".to_owned(),
                ));
            }
        };

        let rating = Rating::new(
            RatingId::random(),
            ride_id,
            caller.id(),
            rated_id,
            score,
            comment,
            now,
        );
        db::create_rating(&mut ex, &rating).await?;
        Ok(rating)
    }

    /// Returns all ratings received by `user_id`, oldest first.
    ///
    /// Ratings are public reputation, so there is no authorization requirement here.
    pub(crate) async fn list_ratings(self, user_id: UserId) -> DriverResult<Vec<Rating>> {
        let mut ex = self.db.ex().await?;
        Ok(db::list_ratings_by_rated(&mut ex, user_id).await?)
    }
}
