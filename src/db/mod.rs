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

//! Database abstraction to persist users, sessions, rides and ratings.
//!
//! The facilities in this module provide an abstraction over different database systems.  The
//! PostgreSQL backend is for production use and the SQLite backend is primarily intended to
//! support unit tests.

use crate::model::{
    AccessToken, EmailAddress, HashedPassword, ModelError, Price, Rating, RatingId, Ride, RideId,
    RideStatus, Role, Session, User, UserId,
};
use crate::model::{DisplayName, Score};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
#[cfg(test)]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod postgres;
#[cfg(test)]
pub mod sqlite;
#[cfg(test)]
mod tests;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active concurrent
    /// connections).
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// A database executor that can talk to multiple database implementations.
///
/// Users of this type are forced to destructure it and issue different queries for each
/// database, which is needed by sqlx to offer type safety guarantees during query compilation.
///
/// Note that this can wrap an executor that talks directly to a pool or to an open transaction.
pub enum Executor {
    /// A PostgreSQL executor.
    Postgres(postgres::PostgresExecutor),

    /// A SQLite executor.
    #[cfg(test)]
    Sqlite(sqlite::SqliteExecutor),
}

/// A wrapper for a database executor backed by an open transaction.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Returns the executor wrapped by this transaction.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            Executor::Postgres(e) => e.commit().await,

            #[cfg(test)]
            Executor::Sqlite(e) => e.commit().await,
        }
    }
}

/// Abstraction over the database connection.
#[async_trait]
pub trait Db {
    /// Obtains an executor for direct access to the pool.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    async fn ex(&self) -> DbResult<Executor>;

    /// Begins a transaction.
    ///
    /// It is the responsibility of the caller to call `commit` on the returned executor.  Otherwise
    /// the transaction is rolled back on drop.
    async fn begin(&self) -> DbResult<TxExecutor>;
}

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(test)]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,
    }
}

impl TryFrom<PgRow> for User {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: Uuid = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(postgres::map_sqlx_error)?;
        let password: String = row.try_get("password").map_err(postgres::map_sqlx_error)?;
        let role: String = row.try_get("role").map_err(postgres::map_sqlx_error)?;

        Ok(User::new(
            UserId::from(id),
            DisplayName::new(name)?,
            EmailAddress::new(email)?,
            HashedPassword::new(password),
            Role::from_db_str(&role)?,
        ))
    }
}

impl TryFrom<PgRow> for Session {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let access_token: String = row.try_get("access_token").map_err(postgres::map_sqlx_error)?;
        let user_id: Uuid = row.try_get("user_id").map_err(postgres::map_sqlx_error)?;
        let expires_at: OffsetDateTime =
            row.try_get("expires_at").map_err(postgres::map_sqlx_error)?;

        Ok(Session::new(AccessToken::new(access_token)?, UserId::from(user_id), expires_at))
    }
}

impl TryFrom<PgRow> for Ride {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: Uuid = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let origin: String = row.try_get("origin").map_err(postgres::map_sqlx_error)?;
        let destination: String = row.try_get("destination").map_err(postgres::map_sqlx_error)?;
        let payment_method: String =
            row.try_get("payment_method").map_err(postgres::map_sqlx_error)?;
        let price: f64 = row.try_get("price").map_err(postgres::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(postgres::map_sqlx_error)?;
        let rider_id: Uuid = row.try_get("rider_id").map_err(postgres::map_sqlx_error)?;
        let driver_id: Option<Uuid> = row.try_get("driver_id").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        let mut ride = Ride::new(
            RideId::from(id),
            origin,
            destination,
            payment_method,
            Price::new(price)?,
            UserId::from(rider_id),
            created_at,
        )
        .with_status(RideStatus::from_db_str(&status)?);
        if let Some(driver_id) = driver_id {
            ride = ride.with_driver(UserId::from(driver_id));
        }
        Ok(ride)
    }
}

impl TryFrom<PgRow> for Rating {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: Uuid = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let ride_id: Uuid = row.try_get("ride_id").map_err(postgres::map_sqlx_error)?;
        let rater_id: Uuid = row.try_get("rater_id").map_err(postgres::map_sqlx_error)?;
        let rated_id: Uuid = row.try_get("rated_id").map_err(postgres::map_sqlx_error)?;
        let score: i16 = row.try_get("score").map_err(postgres::map_sqlx_error)?;
        let comment: Option<String> = row.try_get("comment").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        Ok(Rating::new(
            RatingId::from(id),
            RideId::from(ride_id),
            UserId::from(rater_id),
            UserId::from(rated_id),
            Score::from_i16(score)?,
            comment,
            created_at,
        ))
    }
}

#[cfg(test)]
impl TryFrom<SqliteRow> for User {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(sqlite::map_sqlx_error)?;
        let password: String = row.try_get("password").map_err(sqlite::map_sqlx_error)?;
        let role: String = row.try_get("role").map_err(sqlite::map_sqlx_error)?;

        Ok(User::new(
            UserId::from(sqlite::parse_uuid(&id)?),
            DisplayName::new(name)?,
            EmailAddress::new(email)?,
            HashedPassword::new(password),
            Role::from_db_str(&role)?,
        ))
    }
}

#[cfg(test)]
impl TryFrom<SqliteRow> for Session {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let access_token: String = row.try_get("access_token").map_err(sqlite::map_sqlx_error)?;
        let user_id: String = row.try_get("user_id").map_err(sqlite::map_sqlx_error)?;
        let expires_at_secs: i64 =
            row.try_get("expires_at_secs").map_err(sqlite::map_sqlx_error)?;
        let expires_at_nsecs: i64 =
            row.try_get("expires_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        Ok(Session::new(
            AccessToken::new(access_token)?,
            UserId::from(sqlite::parse_uuid(&user_id)?),
            sqlite::build_timestamp(expires_at_secs, expires_at_nsecs)?,
        ))
    }
}

#[cfg(test)]
impl TryFrom<SqliteRow> for Ride {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let origin: String = row.try_get("origin").map_err(sqlite::map_sqlx_error)?;
        let destination: String = row.try_get("destination").map_err(sqlite::map_sqlx_error)?;
        let payment_method: String =
            row.try_get("payment_method").map_err(sqlite::map_sqlx_error)?;
        let price: f64 = row.try_get("price").map_err(sqlite::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(sqlite::map_sqlx_error)?;
        let rider_id: String = row.try_get("rider_id").map_err(sqlite::map_sqlx_error)?;
        let driver_id: Option<String> =
            row.try_get("driver_id").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 =
            row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        let mut ride = Ride::new(
            RideId::from(sqlite::parse_uuid(&id)?),
            origin,
            destination,
            payment_method,
            Price::new(price)?,
            UserId::from(sqlite::parse_uuid(&rider_id)?),
            sqlite::build_timestamp(created_at_secs, created_at_nsecs)?,
        )
        .with_status(RideStatus::from_db_str(&status)?);
        if let Some(driver_id) = driver_id {
            ride = ride.with_driver(UserId::from(sqlite::parse_uuid(&driver_id)?));
        }
        Ok(ride)
    }
}

#[cfg(test)]
impl TryFrom<SqliteRow> for Rating {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let ride_id: String = row.try_get("ride_id").map_err(sqlite::map_sqlx_error)?;
        let rater_id: String = row.try_get("rater_id").map_err(sqlite::map_sqlx_error)?;
        let rated_id: String = row.try_get("rated_id").map_err(sqlite::map_sqlx_error)?;
        let score: i16 = row.try_get("score").map_err(sqlite::map_sqlx_error)?;
        let comment: Option<String> = row.try_get("comment").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 =
            row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        Ok(Rating::new(
            RatingId::from(sqlite::parse_uuid(&id)?),
            RideId::from(sqlite::parse_uuid(&ride_id)?),
            UserId::from(sqlite::parse_uuid(&rater_id)?),
            UserId::from(sqlite::parse_uuid(&rated_id)?),
            Score::from_i16(score)?,
            comment,
            sqlite::build_timestamp(created_at_secs, created_at_nsecs)?,
        ))
    }
}

/// Creates the `user` record.  Fails with `AlreadyExists` if the email is already registered,
/// as enforced by the unique index in the store.
pub(crate) async fn create_user(ex: &mut Executor, user: &User) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str =
                "INSERT INTO users (id, name, email, password, role) VALUES ($1, $2, $3, $4, $5)";
            let done = sqlx::query(query_str)
                .bind(user.id().as_uuid())
                .bind(user.name().as_str())
                .bind(user.email().as_str())
                .bind(user.password().as_str())
                .bind(user.role().as_db_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str =
                "INSERT INTO users (id, name, email, password, role) VALUES (?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(user.id().as_uuid().to_string())
                .bind(user.name().as_str())
                .bind(user.email().as_str())
                .bind(user.password().as_str())
                .bind(user.role().as_db_str())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Gets information about an existing user given its `id`.
pub(crate) async fn get_user_by_id(ex: &mut Executor, id: UserId) -> DbResult<User> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT id, name, email, password, role FROM users WHERE id = $1";
            let raw_user = sqlx::query(query_str)
                .bind(id.as_uuid())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            User::try_from(raw_user)
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT id, name, email, password, role FROM users WHERE id = ?";
            let raw_user = sqlx::query(query_str)
                .bind(id.as_uuid().to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(raw_user)
        }
    }
}

/// Gets information about an existing user given its `email`.
pub(crate) async fn get_user_by_email(ex: &mut Executor, email: &EmailAddress) -> DbResult<User> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT id, name, email, password, role FROM users WHERE email = $1";
            let raw_user = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            User::try_from(raw_user)
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT id, name, email, password, role FROM users WHERE email = ?";
            let raw_user = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(raw_user)
        }
    }
}

/// Saves a session.
pub(crate) async fn put_session(ex: &mut Executor, session: &Session) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str =
                "INSERT INTO sessions (access_token, user_id, expires_at) VALUES ($1, $2, $3)";
            let done = sqlx::query(query_str)
                .bind(session.access_token().as_str())
                .bind(session.user_id().as_uuid())
                .bind(session.expires_at())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let (expires_at_secs, expires_at_nsecs) =
                sqlite::unpack_timestamp(session.expires_at());

            let query_str = "
                INSERT INTO sessions (access_token, user_id, expires_at_secs, expires_at_nsecs)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(session.access_token().as_str())
                .bind(session.user_id().as_uuid().to_string())
                .bind(expires_at_secs)
                .bind(expires_at_nsecs)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Gets a session from its `access_token`.
///
/// Expiry is not checked here: callers must validate `expires_at` against the current time.
pub(crate) async fn get_session(ex: &mut Executor, access_token: &AccessToken) -> DbResult<Session> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT access_token, user_id, expires_at
                FROM sessions
                WHERE access_token = $1";
            let raw_session = sqlx::query(query_str)
                .bind(access_token.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Session::try_from(raw_session)
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT access_token, user_id, expires_at_secs, expires_at_nsecs
                FROM sessions
                WHERE access_token = ?";
            let raw_session = sqlx::query(query_str)
                .bind(access_token.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Session::try_from(raw_session)
        }
    }
}

/// Creates the `ride` record.
pub(crate) async fn create_ride(ex: &mut Executor, ride: &Ride) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO rides
                    (id, origin, destination, payment_method, price, status, rider_id, driver_id,
                    created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";
            let done = sqlx::query(query_str)
                .bind(ride.id().as_uuid())
                .bind(ride.origin())
                .bind(ride.destination())
                .bind(ride.payment_method())
                .bind(ride.price().as_f64())
                .bind(ride.status().as_db_str())
                .bind(ride.rider_id().as_uuid())
                .bind(ride.driver_id().map(|id| id.as_uuid()))
                .bind(ride.created_at())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = sqlite::unpack_timestamp(ride.created_at());

            let query_str = "
                INSERT INTO rides
                    (id, origin, destination, payment_method, price, status, rider_id, driver_id,
                    created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(ride.id().as_uuid().to_string())
                .bind(ride.origin())
                .bind(ride.destination())
                .bind(ride.payment_method())
                .bind(ride.price().as_f64())
                .bind(ride.status().as_db_str())
                .bind(ride.rider_id().as_uuid().to_string())
                .bind(ride.driver_id().map(|id| id.as_uuid().to_string()))
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Gets an existing ride given its `id`.
pub(crate) async fn get_ride(ex: &mut Executor, id: RideId) -> DbResult<Ride> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM rides WHERE id = $1";
            let raw_ride = sqlx::query(query_str)
                .bind(id.as_uuid())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Ride::try_from(raw_ride)
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM rides WHERE id = ?";
            let raw_ride = sqlx::query(query_str)
                .bind(id.as_uuid().to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ride::try_from(raw_ride)
        }
    }
}

/// Gets all rides currently in `status`, oldest first.
pub(crate) async fn list_rides_by_status(
    ex: &mut Executor,
    status: RideStatus,
) -> DbResult<Vec<Ride>> {
    let raw_rides = match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM rides WHERE status = $1 ORDER BY created_at, id";
            sqlx::query(query_str)
                .bind(status.as_db_str())
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .into_iter()
                .map(Ride::try_from)
                .collect::<Vec<DbResult<Ride>>>()
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT * FROM rides WHERE status = ?
                ORDER BY created_at_secs, created_at_nsecs, id";
            sqlx::query(query_str)
                .bind(status.as_db_str())
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .into_iter()
                .map(Ride::try_from)
                .collect::<Vec<DbResult<Ride>>>()
        }
    };
    raw_rides.into_iter().collect()
}

/// Gets all rides requested by the `rider_id` user, oldest first.
pub(crate) async fn list_rides_by_rider(
    ex: &mut Executor,
    rider_id: UserId,
) -> DbResult<Vec<Ride>> {
    let raw_rides = match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM rides WHERE rider_id = $1 ORDER BY created_at, id";
            sqlx::query(query_str)
                .bind(rider_id.as_uuid())
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .into_iter()
                .map(Ride::try_from)
                .collect::<Vec<DbResult<Ride>>>()
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT * FROM rides WHERE rider_id = ?
                ORDER BY created_at_secs, created_at_nsecs, id";
            sqlx::query(query_str)
                .bind(rider_id.as_uuid().to_string())
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .into_iter()
                .map(Ride::try_from)
                .collect::<Vec<DbResult<Ride>>>()
        }
    };
    raw_rides.into_iter().collect()
}

/// Gets all rides claimed by the `driver_id` user, oldest first.
pub(crate) async fn list_rides_by_driver(
    ex: &mut Executor,
    driver_id: UserId,
) -> DbResult<Vec<Ride>> {
    let raw_rides = match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM rides WHERE driver_id = $1 ORDER BY created_at, id";
            sqlx::query(query_str)
                .bind(driver_id.as_uuid())
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .into_iter()
                .map(Ride::try_from)
                .collect::<Vec<DbResult<Ride>>>()
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT * FROM rides WHERE driver_id = ?
                ORDER BY created_at_secs, created_at_nsecs, id";
            sqlx::query(query_str)
                .bind(driver_id.as_uuid().to_string())
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .into_iter()
                .map(Ride::try_from)
                .collect::<Vec<DbResult<Ride>>>()
        }
    };
    raw_rides.into_iter().collect()
}

/// Attempts to assign `driver_id` to the pending ride `id`, moving it to in-progress.
///
/// This is a guarded update: the write only takes effect if the ride is still pending and has
/// no driver, which makes concurrent claims safe.  Returns true if the claim took effect and
/// false otherwise, in which case the caller must re-read the ride to figure out why.
pub(crate) async fn claim_ride(
    ex: &mut Executor,
    id: RideId,
    driver_id: UserId,
) -> DbResult<bool> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE rides SET status = $1, driver_id = $2
                WHERE id = $3 AND status = $4 AND driver_id IS NULL";
            let done = sqlx::query(query_str)
                .bind(RideStatus::InProgress.as_db_str())
                .bind(driver_id.as_uuid())
                .bind(id.as_uuid())
                .bind(RideStatus::Pending.as_db_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE rides SET status = ?, driver_id = ?
                WHERE id = ? AND status = ? AND driver_id IS NULL";
            let done = sqlx::query(query_str)
                .bind(RideStatus::InProgress.as_db_str())
                .bind(driver_id.as_uuid().to_string())
                .bind(id.as_uuid().to_string())
                .bind(RideStatus::Pending.as_db_str())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Attempts to move the in-progress ride `id` to completed on behalf of its assigned
/// `driver_id`.
///
/// This is a guarded update like `claim_ride`: returns true if the transition took effect
/// and false otherwise.
pub(crate) async fn finish_ride(
    ex: &mut Executor,
    id: RideId,
    driver_id: UserId,
) -> DbResult<bool> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE rides SET status = $1
                WHERE id = $2 AND status = $3 AND driver_id = $4";
            let done = sqlx::query(query_str)
                .bind(RideStatus::Completed.as_db_str())
                .bind(id.as_uuid())
                .bind(RideStatus::InProgress.as_db_str())
                .bind(driver_id.as_uuid())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE rides SET status = ?
                WHERE id = ? AND status = ? AND driver_id = ?";
            let done = sqlx::query(query_str)
                .bind(RideStatus::Completed.as_db_str())
                .bind(id.as_uuid().to_string())
                .bind(RideStatus::InProgress.as_db_str())
                .bind(driver_id.as_uuid().to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Creates the `rating` record.
pub(crate) async fn create_rating(ex: &mut Executor, rating: &Rating) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO ratings
                    (id, ride_id, rater_id, rated_id, score, comment, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)";
            let done = sqlx::query(query_str)
                .bind(rating.id().as_uuid())
                .bind(rating.ride_id().as_uuid())
                .bind(rating.rater_id().as_uuid())
                .bind(rating.rated_id().as_uuid())
                .bind(rating.score().as_i16())
                .bind(rating.comment().as_deref())
                .bind(*rating.created_at())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) =
                sqlite::unpack_timestamp(*rating.created_at());

            let query_str = "
                INSERT INTO ratings
                    (id, ride_id, rater_id, rated_id, score, comment, created_at_secs,
                    created_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(rating.id().as_uuid().to_string())
                .bind(rating.ride_id().as_uuid().to_string())
                .bind(rating.rater_id().as_uuid().to_string())
                .bind(rating.rated_id().as_uuid().to_string())
                .bind(rating.score().as_i16())
                .bind(rating.comment().as_deref())
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Gets all ratings received by the `rated_id` user, oldest first.
pub(crate) async fn list_ratings_by_rated(
    ex: &mut Executor,
    rated_id: UserId,
) -> DbResult<Vec<Rating>> {
    let raw_ratings = match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM ratings WHERE rated_id = $1 ORDER BY created_at, id";
            sqlx::query(query_str)
                .bind(rated_id.as_uuid())
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .into_iter()
                .map(Rating::try_from)
                .collect::<Vec<DbResult<Rating>>>()
        }

        #[cfg(test)]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT * FROM ratings WHERE rated_id = ?
                ORDER BY created_at_secs, created_at_nsecs, id";
            sqlx::query(query_str)
                .bind(rated_id.as_uuid().to_string())
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .into_iter()
                .map(Rating::try_from)
                .collect::<Vec<DbResult<Rating>>>()
        }
    };
    raw_ratings.into_iter().collect()
}
