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

//! Test utilities for the business layer.

use crate::clocks::testutils::SettableClock;
use crate::clocks::Clock;
use crate::db::sqlite::SqliteDb;
use crate::db::{self, Db, Executor};
use crate::driver::Driver;
use crate::model::{
    AccessToken, DisplayName, EmailAddress, HashedPassword, Password, Role, User, UserId,
};
use std::sync::{Arc, OnceLock};
use time::macros::datetime;
use time::OffsetDateTime;

/// Password given to every user created through the `TestContext`.
pub(crate) const TEST_PASSWORD: &str = "the-password";

/// Hash of `TEST_PASSWORD`, computed only once because bcrypt is deliberately slow.
static TEST_PASSWORD_HASH: OnceLock<HashedPassword> = OnceLock::new();

/// Returns the hash of `TEST_PASSWORD`.
fn test_password_hash() -> HashedPassword {
    TEST_PASSWORD_HASH
        .get_or_init(|| {
            Password::from(TEST_PASSWORD).validate_and_hash(|_| None).unwrap()
        })
        .clone()
}

/// State of a running test.
pub(crate) struct TestContext {
    /// The database used by the driver under test.
    db: SqliteDb,

    /// The clock used by the driver under test.
    pub(crate) clock: Arc<SettableClock>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes an in-memory database and a driver on top of it.
    pub(crate) async fn setup() -> Self {
        let db = db::sqlite::connect(":memory:").await.unwrap();
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let clock = Arc::from(SettableClock::new(datetime!(2025-06-12 08:00:00 UTC)));
        let driver = Driver::new(Arc::from(db.clone()), clock.clone());
        Self { db, clock, driver }
    }

    /// Returns a driver clone to run one operation against.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Returns an executor for direct database manipulation.
    ///
    /// The pool behind the test database holds a single connection, so the returned executor
    /// must be dropped before the driver can run any operation.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Returns the current time as the driver under test sees it.
    pub(crate) fn now(&self) -> OffsetDateTime {
        self.clock.now_utc()
    }

    /// Directly inserts a user with the given `role`, deriving its name and unique email from
    /// `tag`.  The password is always `TEST_PASSWORD`.
    pub(crate) async fn create_user(&self, tag: &str, role: Role) -> User {
        let user = User::new(
            UserId::random(),
            DisplayName::new(format!("User {}", tag)).unwrap(),
            EmailAddress::new(format!("{}@example.com", tag)).unwrap(),
            test_password_hash(),
            role,
        );
        db::create_user(&mut self.ex().await, &user).await.unwrap();
        user
    }

    /// Logs `user` in and returns the new session's access token.
    pub(crate) async fn login(&self, user: &User) -> AccessToken {
        let session = self
            .driver()
            .login(user.email().clone(), Password::from(TEST_PASSWORD))
            .await
            .unwrap();
        session.take_access_token()
    }
}
