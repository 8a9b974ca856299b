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

//! Business logic for the service.

use crate::clocks::Clock;
use crate::db::{self, Db, DbError, Executor};
use crate::model::{AccessToken, ModelError, Session, User, UserId};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

mod login;
mod ratings;
mod register;
mod rides;
#[cfg(test)]
pub(crate) mod testutils;

/// Amount of time an issued access token stays valid for when not specified otherwise.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Amount of time the access tokens issued by the login flow stay valid for.
const LOGIN_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Business logic errors.  These errors encompass backend and logical errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// Catch-all error type for unexpected database errors.
    #[error("{0}")]
    BackendError(String),

    /// Indicates that the caller is not allowed to perform the requested operation.
    #[error("{0}")]
    Forbidden(String),

    /// Indicates an error in the input data.
    #[error("{0}")]
    InvalidInput(String),

    /// Indicates an operation that the ride state machine does not allow in the current state.
    #[error("{0}")]
    InvalidTransition(String),

    /// Indicates that a requested entry does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that the caller could not be identified.
    #[error("{0}")]
    Unauthenticated(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(e.to_string()),
            DbError::BackendError(_) => DriverError::BackendError(e.to_string()),
            DbError::DataIntegrityError(_) => DriverError::BackendError(e.to_string()),
            DbError::NotFound => DriverError::NotFound(e.to_string()),
            DbError::Unavailable => DriverError::BackendError(e.to_string()),
        }
    }
}

impl From<ModelError> for DriverError {
    fn from(e: ModelError) -> Self {
        DriverError::InvalidInput(e.to_string())
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they acquire a database
/// executor and finish their work before returning, so it's incorrect for the caller to use
/// two separate calls.  For this reason, these operations consume the driver in an attempt to
/// minimize the possibility of executing two operations.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self { db, clock }
    }

    /// Issues a new access token for `user_id` and persists the backing session.
    ///
    /// The token is valid for `ttl`, or for a short default period when unspecified.
    pub(crate) async fn issue_token(
        &self,
        ex: &mut Executor,
        user_id: UserId,
        ttl: Option<Duration>,
    ) -> DriverResult<Session> {
        let expires_at = self.clock.now_utc() + ttl.unwrap_or(DEFAULT_TOKEN_TTL);
        let session = Session::new(AccessToken::generate(), user_id, expires_at);
        db::put_session(ex, &session).await?;
        Ok(session)
    }

    /// Decodes the session in `token`, validates it against `now` and returns the user that
    /// owns it.
    ///
    /// All failure modes map to `Unauthenticated`: an unknown token, a lapsed session, and a
    /// session whose subject no longer resolves to a user.
    pub(crate) async fn resolve_caller(
        &self,
        ex: &mut Executor,
        now: OffsetDateTime,
        token: AccessToken,
    ) -> DriverResult<User> {
        let session = match db::get_session(ex, &token).await {
            Ok(session) => session,
            Err(DbError::NotFound) => {
                return Err(DriverError::Unauthenticated("Invalid session".to_owned()))
            }
            Err(e) => return Err(e.into()),
        };

        if session.expires_at() <= now {
            return Err(DriverError::Unauthenticated(
                "Session expired; please log in again".to_owned(),
            ));
        }

        match db::get_user_by_id(ex, session.user_id()).await {
            Ok(user) => Ok(user),
            Err(DbError::NotFound) => {
                Err(DriverError::Unauthenticated("Invalid session".to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use crate::model::Role;
    use std::time::Duration;

    #[tokio::test]
    async fn test_issue_token_default_ttl() {
        let context = TestContext::setup().await;

        let user = context.create_user("user", Role::Rider).await;

        let mut ex = context.ex().await;
        let session =
            context.driver().issue_token(&mut ex, user.id(), None).await.unwrap();
        assert_eq!(context.now() + Duration::from_secs(15 * 60), session.expires_at());
        assert_eq!(user.id(), session.user_id());
    }

    #[tokio::test]
    async fn test_issue_token_explicit_ttl() {
        let context = TestContext::setup().await;

        let user = context.create_user("user", Role::Rider).await;

        let mut ex = context.ex().await;
        let session = context
            .driver()
            .issue_token(&mut ex, user.id(), Some(Duration::from_secs(120)))
            .await
            .unwrap();
        assert_eq!(context.now() + Duration::from_secs(120), session.expires_at());
    }

    #[tokio::test]
    async fn test_resolve_caller_ok() {
        let context = TestContext::setup().await;

        let user = context.create_user("user", Role::Driver).await;
        let token = context.login(&user).await;

        let mut ex = context.ex().await;
        let whoami =
            context.driver().resolve_caller(&mut ex, context.now(), token).await.unwrap();
        assert_eq!(user, whoami);
    }

    #[tokio::test]
    async fn test_resolve_caller_unknown_token() {
        let context = TestContext::setup().await;

        let mut ex = context.ex().await;
        match context
            .driver()
            .resolve_caller(&mut ex, context.now(), AccessToken::generate())
            .await
        {
            Err(DriverError::Unauthenticated(msg)) => assert!(msg.contains("Invalid session")),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_resolve_caller_expired_session() {
        let context = TestContext::setup().await;

        let user = context.create_user("user", Role::Rider).await;
        let token = context.login(&user).await;

        {
            let mut ex = context.ex().await;
            context
                .driver()
                .resolve_caller(&mut ex, context.now(), token.clone())
                .await
                .unwrap();
        }

        context.clock.advance(Duration::from_secs(30 * 60));

        let mut ex = context.ex().await;
        match context.driver().resolve_caller(&mut ex, context.now(), token).await {
            Err(DriverError::Unauthenticated(msg)) => assert!(msg.contains("expired")),
            e => panic!("{:?}", e),
        }
    }
}
