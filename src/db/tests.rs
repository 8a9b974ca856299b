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

//! Tests for the database layer, running against an in-memory SQLite database.

use super::*;
use time::macros::datetime;

/// Initializes an in-memory database with the schema.
async fn setup() -> sqlite::SqliteDb {
    let db = sqlite::connect(":memory:").await.unwrap();
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();
    db
}

/// Syntactic sugar to create a user given only a distinguishing `tag` and its `role`.
fn make_user(tag: &str, role: Role) -> User {
    User::new(
        UserId::random(),
        DisplayName::new(format!("User {}", tag)).unwrap(),
        EmailAddress::new(format!("{}@example.com", tag)).unwrap(),
        HashedPassword::new("some-hash"),
        role,
    )
}

/// Syntactic sugar to create a pending ride requested by `rider_id` at `created_at`.
fn make_ride(rider_id: UserId, created_at: OffsetDateTime) -> Ride {
    Ride::new(
        RideId::random(),
        "Origin St.".to_owned(),
        "Destination Ave.".to_owned(),
        "card".to_owned(),
        Price::new(42.5).unwrap(),
        rider_id,
        created_at,
    )
}

#[tokio::test]
async fn test_users_create_and_get() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let user = make_user("first", Role::Rider);
    create_user(&mut ex, &user).await.unwrap();

    assert_eq!(user, get_user_by_id(&mut ex, user.id()).await.unwrap());
    assert_eq!(user, get_user_by_email(&mut ex, user.email()).await.unwrap());
}

#[tokio::test]
async fn test_users_duplicate_email() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let user = make_user("first", Role::Rider);
    create_user(&mut ex, &user).await.unwrap();

    let duplicate = User::new(
        UserId::random(),
        DisplayName::from("Another Body"),
        user.email().clone(),
        HashedPassword::new("other-hash"),
        Role::Driver,
    );
    assert_eq!(DbError::AlreadyExists, create_user(&mut ex, &duplicate).await.unwrap_err());
}

#[tokio::test]
async fn test_users_email_is_case_sensitive() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let user = make_user("first", Role::Rider);
    create_user(&mut ex, &user).await.unwrap();

    let other = User::new(
        UserId::random(),
        DisplayName::from("Another Body"),
        EmailAddress::from("FIRST@example.com"),
        HashedPassword::new("other-hash"),
        Role::Rider,
    );
    create_user(&mut ex, &other).await.unwrap();

    assert_eq!(other, get_user_by_email(&mut ex, other.email()).await.unwrap());
}

#[tokio::test]
async fn test_users_not_found() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    assert_eq!(DbError::NotFound, get_user_by_id(&mut ex, UserId::random()).await.unwrap_err());
    assert_eq!(
        DbError::NotFound,
        get_user_by_email(&mut ex, &EmailAddress::from("none@example.com")).await.unwrap_err()
    );
}

#[tokio::test]
async fn test_sessions_put_and_get() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let user = make_user("first", Role::Rider);
    create_user(&mut ex, &user).await.unwrap();

    let session = Session::new(
        AccessToken::generate(),
        user.id(),
        datetime!(2025-02-03 10:30:00.000001 UTC),
    );
    put_session(&mut ex, &session).await.unwrap();

    assert_eq!(session, get_session(&mut ex, session.access_token()).await.unwrap());
}

#[tokio::test]
async fn test_sessions_not_found() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    assert_eq!(
        DbError::NotFound,
        get_session(&mut ex, &AccessToken::generate()).await.unwrap_err()
    );
}

#[tokio::test]
async fn test_rides_create_and_get_roundtrip() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let rider = make_user("rider", Role::Rider);
    let driver = make_user("driver", Role::Driver);
    create_user(&mut ex, &rider).await.unwrap();
    create_user(&mut ex, &driver).await.unwrap();

    let pending = make_ride(rider.id(), datetime!(2025-02-03 10:00:00 UTC));
    create_ride(&mut ex, &pending).await.unwrap();
    assert_eq!(pending, get_ride(&mut ex, pending.id()).await.unwrap());

    let completed = make_ride(rider.id(), datetime!(2025-02-03 11:00:00 UTC))
        .with_status(RideStatus::Completed)
        .with_driver(driver.id());
    create_ride(&mut ex, &completed).await.unwrap();
    assert_eq!(completed, get_ride(&mut ex, completed.id()).await.unwrap());
}

#[tokio::test]
async fn test_rides_get_not_found() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    assert_eq!(DbError::NotFound, get_ride(&mut ex, RideId::random()).await.unwrap_err());
}

#[tokio::test]
async fn test_rides_list_by_status_filters_and_orders() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let rider = make_user("rider", Role::Rider);
    let driver = make_user("driver", Role::Driver);
    create_user(&mut ex, &rider).await.unwrap();
    create_user(&mut ex, &driver).await.unwrap();

    let ride2 = make_ride(rider.id(), datetime!(2025-02-03 11:00:00 UTC));
    let ride1 = make_ride(rider.id(), datetime!(2025-02-03 10:00:00 UTC));
    let claimed = make_ride(rider.id(), datetime!(2025-02-03 09:00:00 UTC))
        .with_status(RideStatus::InProgress)
        .with_driver(driver.id());
    create_ride(&mut ex, &ride2).await.unwrap();
    create_ride(&mut ex, &ride1).await.unwrap();
    create_ride(&mut ex, &claimed).await.unwrap();

    let pending = list_rides_by_status(&mut ex, RideStatus::Pending).await.unwrap();
    assert_eq!(vec![ride1, ride2], pending);

    let in_progress = list_rides_by_status(&mut ex, RideStatus::InProgress).await.unwrap();
    assert_eq!(vec![claimed], in_progress);

    assert!(list_rides_by_status(&mut ex, RideStatus::Completed).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rides_list_by_rider() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let rider1 = make_user("rider1", Role::Rider);
    let rider2 = make_user("rider2", Role::Rider);
    create_user(&mut ex, &rider1).await.unwrap();
    create_user(&mut ex, &rider2).await.unwrap();

    let ride1 = make_ride(rider1.id(), datetime!(2025-02-03 10:00:00 UTC));
    let ride2 = make_ride(rider2.id(), datetime!(2025-02-03 11:00:00 UTC));
    let ride3 = make_ride(rider1.id(), datetime!(2025-02-03 12:00:00 UTC));
    for ride in [&ride1, &ride2, &ride3] {
        create_ride(&mut ex, ride).await.unwrap();
    }

    assert_eq!(vec![ride1, ride3], list_rides_by_rider(&mut ex, rider1.id()).await.unwrap());
    assert_eq!(vec![ride2], list_rides_by_rider(&mut ex, rider2.id()).await.unwrap());
    assert!(list_rides_by_rider(&mut ex, UserId::random()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rides_list_by_driver() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let rider = make_user("rider", Role::Rider);
    let driver = make_user("driver", Role::Driver);
    create_user(&mut ex, &rider).await.unwrap();
    create_user(&mut ex, &driver).await.unwrap();

    let claimed = make_ride(rider.id(), datetime!(2025-02-03 10:00:00 UTC))
        .with_status(RideStatus::InProgress)
        .with_driver(driver.id());
    let unclaimed = make_ride(rider.id(), datetime!(2025-02-03 11:00:00 UTC));
    create_ride(&mut ex, &claimed).await.unwrap();
    create_ride(&mut ex, &unclaimed).await.unwrap();

    assert_eq!(vec![claimed], list_rides_by_driver(&mut ex, driver.id()).await.unwrap());
    assert!(list_rides_by_driver(&mut ex, rider.id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_claim_ride_ok() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let rider = make_user("rider", Role::Rider);
    let driver = make_user("driver", Role::Driver);
    create_user(&mut ex, &rider).await.unwrap();
    create_user(&mut ex, &driver).await.unwrap();

    let ride = make_ride(rider.id(), datetime!(2025-02-03 10:00:00 UTC));
    create_ride(&mut ex, &ride).await.unwrap();

    assert!(claim_ride(&mut ex, ride.id(), driver.id()).await.unwrap());

    let updated = get_ride(&mut ex, ride.id()).await.unwrap();
    assert_eq!(RideStatus::InProgress, updated.status());
    assert_eq!(Some(driver.id()), updated.driver_id());
}

#[tokio::test]
async fn test_claim_ride_only_first_claim_wins() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let rider = make_user("rider", Role::Rider);
    let driver1 = make_user("driver1", Role::Driver);
    let driver2 = make_user("driver2", Role::Driver);
    create_user(&mut ex, &rider).await.unwrap();
    create_user(&mut ex, &driver1).await.unwrap();
    create_user(&mut ex, &driver2).await.unwrap();

    let ride = make_ride(rider.id(), datetime!(2025-02-03 10:00:00 UTC));
    create_ride(&mut ex, &ride).await.unwrap();

    assert!(claim_ride(&mut ex, ride.id(), driver1.id()).await.unwrap());
    assert!(!claim_ride(&mut ex, ride.id(), driver2.id()).await.unwrap());

    let updated = get_ride(&mut ex, ride.id()).await.unwrap();
    assert_eq!(Some(driver1.id()), updated.driver_id());
}

#[tokio::test]
async fn test_claim_ride_missing() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let driver = make_user("driver", Role::Driver);
    create_user(&mut ex, &driver).await.unwrap();

    assert!(!claim_ride(&mut ex, RideId::random(), driver.id()).await.unwrap());
}

#[tokio::test]
async fn test_finish_ride_ok() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let rider = make_user("rider", Role::Rider);
    let driver = make_user("driver", Role::Driver);
    create_user(&mut ex, &rider).await.unwrap();
    create_user(&mut ex, &driver).await.unwrap();

    let ride = make_ride(rider.id(), datetime!(2025-02-03 10:00:00 UTC))
        .with_status(RideStatus::InProgress)
        .with_driver(driver.id());
    create_ride(&mut ex, &ride).await.unwrap();

    assert!(finish_ride(&mut ex, ride.id(), driver.id()).await.unwrap());
    assert_eq!(RideStatus::Completed, get_ride(&mut ex, ride.id()).await.unwrap().status());
}

#[tokio::test]
async fn test_finish_ride_wrong_driver() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let rider = make_user("rider", Role::Rider);
    let driver = make_user("driver", Role::Driver);
    let other = make_user("other", Role::Driver);
    create_user(&mut ex, &rider).await.unwrap();
    create_user(&mut ex, &driver).await.unwrap();
    create_user(&mut ex, &other).await.unwrap();

    let ride = make_ride(rider.id(), datetime!(2025-02-03 10:00:00 UTC))
        .with_status(RideStatus::InProgress)
        .with_driver(driver.id());
    create_ride(&mut ex, &ride).await.unwrap();

    assert!(!finish_ride(&mut ex, ride.id(), other.id()).await.unwrap());
    assert_eq!(RideStatus::InProgress, get_ride(&mut ex, ride.id()).await.unwrap().status());
}

#[tokio::test]
async fn test_finish_ride_not_in_progress() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let rider = make_user("rider", Role::Rider);
    let driver = make_user("driver", Role::Driver);
    create_user(&mut ex, &rider).await.unwrap();
    create_user(&mut ex, &driver).await.unwrap();

    let ride = make_ride(rider.id(), datetime!(2025-02-03 10:00:00 UTC));
    create_ride(&mut ex, &ride).await.unwrap();

    assert!(!finish_ride(&mut ex, ride.id(), driver.id()).await.unwrap());
    assert_eq!(RideStatus::Pending, get_ride(&mut ex, ride.id()).await.unwrap().status());
}

#[tokio::test]
async fn test_ratings_create_and_list() {
    let db = setup().await;
    let mut ex = db.ex().await.unwrap();

    let rider = make_user("rider", Role::Rider);
    let driver = make_user("driver", Role::Driver);
    create_user(&mut ex, &rider).await.unwrap();
    create_user(&mut ex, &driver).await.unwrap();

    let ride = make_ride(rider.id(), datetime!(2025-02-03 10:00:00 UTC))
        .with_status(RideStatus::Completed)
        .with_driver(driver.id());
    create_ride(&mut ex, &ride).await.unwrap();

    let rating1 = Rating::new(
        RatingId::random(),
        ride.id(),
        rider.id(),
        driver.id(),
        Score::new(5).unwrap(),
        Some("Nice trip".to_owned()),
        datetime!(2025-02-03 11:00:00 UTC),
    );
    let rating2 = Rating::new(
        RatingId::random(),
        ride.id(),
        driver.id(),
        rider.id(),
        Score::new(4).unwrap(),
        None,
        datetime!(2025-02-03 11:05:00 UTC),
    );
    create_rating(&mut ex, &rating1).await.unwrap();
    create_rating(&mut ex, &rating2).await.unwrap();

    assert_eq!(vec![rating1], list_ratings_by_rated(&mut ex, driver.id()).await.unwrap());
    assert_eq!(vec![rating2], list_ratings_by_rated(&mut ex, rider.id()).await.unwrap());
    assert!(list_ratings_by_rated(&mut ex, UserId::random()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tx_commit_makes_writes_visible() {
    let db = setup().await;

    let user = make_user("first", Role::Rider);
    {
        let mut tx = db.begin().await.unwrap();
        create_user(tx.ex(), &user).await.unwrap();
        tx.commit().await.unwrap();
    }

    let mut ex = db.ex().await.unwrap();
    assert_eq!(user, get_user_by_id(&mut ex, user.id()).await.unwrap());
}

#[tokio::test]
async fn test_tx_rollback_on_drop() {
    let db = setup().await;

    let user = make_user("first", Role::Rider);
    {
        let mut tx = db.begin().await.unwrap();
        create_user(tx.ex(), &user).await.unwrap();
    }

    let mut ex = db.ex().await.unwrap();
    assert_eq!(DbError::NotFound, get_user_by_id(&mut ex, user.id()).await.unwrap_err());
}
