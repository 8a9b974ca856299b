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

//! The `Rating` data type and its companion `Score`.

use crate::model::{ModelError, ModelResult, RatingId, RideId, UserId};
use derive_getters::Getters;
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Smallest score a participant can hand out.
const MIN_SCORE: u8 = 1;

/// Largest score a participant can hand out.
const MAX_SCORE: u8 = 5;

/// Score assigned in a rating, in the 1 to 5 scale.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct Score(u8);

impl Score {
    /// Creates a new score from an untrusted `value`, making sure it is in range.
    pub(crate) fn new(value: u8) -> ModelResult<Self> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
            return Err(ModelError(format!(
                "Score {} is out of the {}-{} range",
                value, MIN_SCORE, MAX_SCORE
            )));
        }
        Ok(Self(value))
    }

    /// Creates a score from an `i16` with range validation, as needed when reading
    /// from the database.
    pub(crate) fn from_i16(value: i16) -> ModelResult<Self> {
        match u8::try_from(value) {
            Ok(value) => Score::new(value),
            Err(_) => Err(ModelError(format!("Score {} cannot be represented", value))),
        }
    }

    /// Returns the score as an `i16` for storage purposes.
    pub(crate) fn as_i16(&self) -> i16 {
        i16::from(self.0)
    }
}

/// Visitor to deserialize a `Score` from an integer.
struct ScoreVisitor;

impl serde::de::Visitor<'_> for ScoreVisitor {
    type Value = Score;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "an integer between {} and {}", MIN_SCORE, MAX_SCORE)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        let v = u8::try_from(v)
            .map_err(|_| E::custom(format!("Score {} is out of range", v)))?;
        Score::new(v).map_err(|e| E::custom(format!("{}", e)))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        let v = u8::try_from(v)
            .map_err(|_| E::custom(format!("Score {} is out of range", v)))?;
        Score::new(v).map_err(|e| E::custom(format!("{}", e)))
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_u8(ScoreVisitor)
    }
}

/// Representation of a rating left by one ride participant about the other.
///
/// Ratings are immutable once created.
#[derive(Constructor, Getters)]
#[cfg_attr(test, derive(Clone, Debug, PartialEq))]
pub(crate) struct Rating {
    /// Identifier of the rating.
    id: RatingId,

    /// The completed ride this rating refers to.
    ride_id: RideId,

    /// The participant that left the rating.
    rater_id: UserId,

    /// The participant the rating is about.
    rated_id: UserId,

    /// Score handed out by the rater.
    score: Score,

    /// Free-form comment accompanying the score, if any.
    comment: Option<String>,

    /// Timestamp of the rating creation.
    created_at: OffsetDateTime,
}
