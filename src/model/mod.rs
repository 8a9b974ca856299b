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

//! High-level data types to represent the domain of the application.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

mod accesstoken;
mod emailaddress;
mod passwords;
mod rating;
mod ride;
mod session;
mod user;

pub(crate) use accesstoken::AccessToken;
pub(crate) use emailaddress::EmailAddress;
pub(crate) use passwords::{HashedPassword, Password};
pub(crate) use rating::{Rating, Score};
pub(crate) use ride::{Price, Ride, RideStatus};
pub(crate) use session::Session;
pub(crate) use user::User;

/// Errors caused by invalid values when constructing model types.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;

/// Maximum length of display names per the schema.
const MAX_NAME_LENGTH: usize = 128;

/// Generates a UUID-backed identifier newtype.
macro_rules! uuid_id [
    ( $(#[$docs:meta])+ $name:ident ) => {
        $(#[$docs])+
        #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
        #[serde(transparent)]
        pub(crate) struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            pub(crate) fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID value.
            pub(crate) fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    }
];

uuid_id!(
    /// Identifier of a registered user.
    UserId
);

uuid_id!(
    /// Identifier of a ride.
    RideId
);

uuid_id!(
    /// Identifier of a rating.
    RatingId
);

/// Distinguishes the two kinds of users known to the system.
///
/// The role is declared by the caller at registration time and is immutable
/// afterwards.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Role {
    /// A user that requests rides.
    Rider,

    /// A user that claims and completes rides.
    Driver,
}

impl Default for Role {
    fn default() -> Self {
        Role::Rider
    }
}

impl Role {
    /// Returns true if this is the driver role.
    pub(crate) fn is_driver(&self) -> bool {
        matches!(self, Role::Driver)
    }

    /// Returns the role as persisted in the database.
    pub(crate) fn as_db_str(&self) -> &'static str {
        match self {
            Role::Rider => "rider",
            Role::Driver => "driver",
        }
    }

    /// Parses a role as extracted from the database.
    pub(crate) fn from_db_str(s: &str) -> ModelResult<Role> {
        match s {
            "rider" => Ok(Role::Rider),
            "driver" => Ok(Role::Driver),
            s => Err(ModelError(format!("Unknown role '{}'", s))),
        }
    }
}

/// Represents the free-form name a user registers under.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct DisplayName(String);

impl DisplayName {
    /// Creates a new display name from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();

        if s.trim().is_empty() {
            return Err(ModelError("Name cannot be empty".to_owned()));
        }
        if s.len() > MAX_NAME_LENGTH {
            return Err(ModelError("Name is too long".to_owned()));
        }

        Ok(Self(s))
    }

    /// Returns a string view of the display name.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
impl From<&str> for DisplayName {
    fn from(raw_name: &str) -> Self {
        Self::new(raw_name).expect("Hardcoded names for testing must be valid")
    }
}

/// Visitor to deserialize a `DisplayName` from a string.
struct DisplayNameVisitor;

impl serde::de::Visitor<'_> for DisplayNameVisitor {
    type Value = DisplayName;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a non-empty name")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        DisplayName::new(v).map_err(|e| E::custom(format!("{}", e)))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        DisplayName::new(v).map_err(|e| E::custom(format!("{}", e)))
    }
}

impl<'de> Deserialize<'de> for DisplayName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_string(DisplayNameVisitor)
    }
}
