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

//! Extends the driver with the `login` method.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult, LOGIN_TOKEN_TTL};
use crate::model::{EmailAddress, Password, Session};

impl Driver {
    /// Logs a user in with `email` and `password`, issuing a new session.
    ///
    /// The error for an unknown email and the error for a bad password are indistinguishable
    /// on purpose: responding differently would reveal which addresses have accounts.
    pub(crate) async fn login(self, email: EmailAddress, password: Password) -> DriverResult<Session> {
        let mut tx = self.db.begin().await?;

        let user = match db::get_user_by_email(tx.ex(), &email).await {
            Ok(user) => user,
            Err(DbError::NotFound) => {
                return Err(DriverError::Unauthenticated("Invalid credentials".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        if !password.verify(user.password())? {
            return Err(DriverError::Unauthenticated("Invalid credentials".to_owned()));
        }

        let session = self.issue_token(tx.ex(), user.id(), Some(LOGIN_TOKEN_TTL)).await?;
        tx.commit().await?;
        Ok(session)
    }
}
