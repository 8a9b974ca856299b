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

//! Extends the driver with the `register` method.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{DisplayName, EmailAddress, Password, Role, User, UserId};

/// Verifies that a password is acceptable.
fn password_validator(s: &str) -> Option<&'static str> {
    if s.is_empty() {
        return Some("Cannot be empty");
    }
    None
}

impl Driver {
    /// Creates a new account for a user with the caller-declared `role`.
    ///
    /// There is no restriction on who may register as a driver.
    pub(crate) async fn register(
        self,
        name: DisplayName,
        email: EmailAddress,
        password: Password,
        role: Role,
    ) -> DriverResult<User> {
        let mut ex = self.db.ex().await?;

        let password = password.validate_and_hash(password_validator)?;

        let user = User::new(UserId::random(), name, email, password, role);
        match db::create_user(&mut ex, &user).await {
            Ok(()) => (),
            Err(DbError::AlreadyExists) => {
                // The unique index on emails is the authoritative guard here: checking for an
                // existing user before inserting would still race with other registrations.
                return Err(DriverError::AlreadyExists(
                    "Email address is already registered".to_owned(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(user)
    }
}
