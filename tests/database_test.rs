//! Flows against a real Postgres. `#[sqlx::test]` creates a fresh database
//! per test and applies ./migrations; DATABASE_URL must point at a server
//! the test user can create databases on.

mod helpers;

use chrono::{Duration, Utc};
use feastride_backend::error::{AppError, RepositoryError};
use feastride_backend::models::*;
use feastride_backend::services::CourierStatus;
use helpers::*;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tokio_test::{assert_err, assert_ok};

// ============================================================================
// Migration Tests
// ============================================================================

#[sqlx::test]
async fn test_migrations_ran(pool: PgPool) {
    let tables = vec![
        "customers",
        "restaurants",
        "drivers",
        "riders",
        "menu_items",
        "offers",
        "reservations",
        "orders",
        "rides",
        "ratings",
        "notifications",
        "otp_challenges",
    ];

    for table in tables {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .expect("Failed to query information_schema");

        let exists: bool = row.get(0);
        assert!(exists, "Table {} should exist", table);
    }
}

// ============================================================================
// Account Tests
// ============================================================================

#[sqlx::test]
async fn test_usernames_unique_per_kind(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    db.cleanup().await;
    let accounts = &db.state.account_service;

    accounts
        .register(&new_customer("casey"))
        .await
        .expect("Failed to register customer");

    let err = accounts.register(&new_customer("casey")).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

    // Kinds are independent namespaces
    let driver = accounts
        .register(&new_driver("casey"))
        .await
        .expect("Same username as a driver should be allowed");
    assert_eq!(driver.kind(), AccountKind::Driver);
}

#[sqlx::test]
async fn test_login_with_one_time_code(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let auth = &db.state.auth_service;

    let err = auth
        .login(AccountKind::Customer, "casey", "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    // Right password, wrong kind
    let err = auth
        .login(AccountKind::Restaurant, "casey", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let challenge = auth
        .login(AccountKind::Customer, "casey", PASSWORD)
        .await
        .expect("Login failed");
    assert!(challenge.otp_required);
    let code = challenge.otp.expect("Code should be echoed in tests");

    let grant = auth
        .verify_otp(AccountKind::Customer, "casey", &code)
        .await
        .expect("Verification failed");
    assert_eq!(grant.session.sub, fixtures.customer.id);
    assert_eq!(grant.session.kind, AccountKind::Customer);
    assert_eq!(grant.session.profile["email"], "casey@example.com");

    let claims = auth.authenticate(&grant.token).expect("Token should decode");
    assert_eq!(claims, grant.session);

    // Single use
    let err = auth
        .verify_otp(AccountKind::Customer, "casey", &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[sqlx::test]
async fn test_code_discarded_after_too_many_guesses(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    TestFixtures::create(&db).await;
    let auth = &db.state.auth_service;

    let code = auth
        .login(AccountKind::Driver, "dana", PASSWORD)
        .await
        .expect("Login failed")
        .otp
        .expect("Code should be echoed in tests");
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..5 {
        let err = auth
            .verify_otp(AccountKind::Driver, "dana", wrong)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    // The right code no longer works either
    let err = auth
        .verify_otp(AccountKind::Driver, "dana", &code)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[sqlx::test]
async fn test_right_code_on_last_attempt(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    TestFixtures::create(&db).await;
    let auth = &db.state.auth_service;

    let code = auth
        .login(AccountKind::Rider, "robin", PASSWORD)
        .await
        .unwrap()
        .otp
        .unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..4 {
        assert_err!(auth.verify_otp(AccountKind::Rider, "robin", wrong).await);
    }
    assert_ok!(auth.verify_otp(AccountKind::Rider, "robin", &code).await);
}

#[sqlx::test]
async fn test_attempt_reservations_are_capped(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let expires_at = Utc::now().naive_utc() + Duration::minutes(5);
    db.state
        .otp_repo
        .upsert(AccountKind::Customer, fixtures.customer.id, "hash", expires_at)
        .await
        .unwrap();

    let mut guesses = tokio::task::JoinSet::new();
    for _ in 0..40 {
        let state = db.state.clone();
        let customer_id = fixtures.customer.id;
        guesses.spawn(async move {
            state
                .otp_repo
                .reserve_attempt(AccountKind::Customer, customer_id, 5)
                .await
        });
    }

    let mut reserved = Vec::new();
    while let Some(result) = guesses.join_next().await {
        if let Some((_, attempts)) = result.expect("Guess task panicked").unwrap() {
            reserved.push(attempts);
        }
    }
    reserved.sort_unstable();
    assert_eq!(reserved, vec![1, 2, 3, 4, 5]);

    let challenge = db
        .state
        .otp_repo
        .find(AccountKind::Customer, fixtures.customer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(challenge.attempts, 5);

    // Budget spent
    assert!(db
        .state
        .otp_repo
        .reserve_attempt(AccountKind::Customer, fixtures.customer.id, 5)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test]
async fn test_concurrent_guesses_share_one_budget(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;

    let code = db
        .state
        .auth_service
        .login(AccountKind::Customer, "casey", PASSWORD)
        .await
        .unwrap()
        .otp
        .unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let mut guesses = tokio::task::JoinSet::new();
    for i in 0..41 {
        let state = db.state.clone();
        let guess = if i == 40 { code.clone() } else { wrong.to_string() };
        guesses.spawn(async move {
            let result = state
                .auth_service
                .verify_otp(AccountKind::Customer, "casey", &guess)
                .await;
            (guess, result)
        });
    }

    let mut wrong_rejections = 0;
    let mut accepted = 0;
    while let Some(joined) = guesses.join_next().await {
        let (guess, result) = joined.expect("Guess task panicked");
        match result {
            Ok(_) => {
                assert_eq!(guess, code, "a wrong code was accepted");
                accepted += 1;
            }
            Err(AppError::Unauthorized(_)) => {
                if guess != code {
                    wrong_rejections += 1;
                }
            }
            Err(other) => panic!("Unexpected error: {:?}", other),
        }
    }
    assert_eq!(wrong_rejections, 40);
    assert!(accepted <= 1);

    // However the race went, the challenge is spent
    assert!(db
        .state
        .otp_repo
        .find(AccountKind::Customer, fixtures.customer.id)
        .await
        .unwrap()
        .is_none());
    assert_err!(
        db.state
            .auth_service
            .verify_otp(AccountKind::Customer, "casey", &code)
            .await
    );
}

#[sqlx::test]
async fn test_new_login_replaces_code(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    TestFixtures::create(&db).await;
    let auth = &db.state.auth_service;

    let first = auth
        .login(AccountKind::Rider, "robin", PASSWORD)
        .await
        .unwrap()
        .otp
        .unwrap();
    let second = auth
        .login(AccountKind::Rider, "robin", PASSWORD)
        .await
        .unwrap()
        .otp
        .unwrap();

    if first != second {
        assert_err!(auth.verify_otp(AccountKind::Rider, "robin", &first).await);
    }
    assert_ok!(auth.verify_otp(AccountKind::Rider, "robin", &second).await);
}

#[sqlx::test]
async fn test_purge_expired_codes(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let otp_repo = &db.state.otp_repo;

    let past = Utc::now().naive_utc() - Duration::minutes(1);
    otp_repo
        .upsert(AccountKind::Customer, fixtures.customer.id, "stale", past)
        .await
        .expect("Failed to store challenge");

    assert_eq!(otp_repo.purge_expired().await.unwrap(), 1);
    assert!(otp_repo
        .find(AccountKind::Customer, fixtures.customer.id)
        .await
        .unwrap()
        .is_none());
}

// ============================================================================
// Restaurant Tests
// ============================================================================

#[sqlx::test]
async fn test_restaurant_detail_hides_unavailable_items(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let restaurants = &db.state.restaurant_service;

    restaurants
        .update_menu_item(
            fixtures.restaurant.id,
            fixtures.noodles.id,
            &MenuItemUpdate {
                is_available: Some(false),
                ..MenuItemUpdate::default()
            },
        )
        .await
        .expect("Failed to update menu item");

    let detail = restaurants.get(fixtures.restaurant.id).await.unwrap();
    let names: Vec<&str> = detail.menu.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Dumplings"]);
}

#[sqlx::test]
async fn test_restaurant_filters(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let restaurants = &db.state.restaurant_service;

    let taqueria = match db
        .state
        .account_service
        .register(&Registration::Restaurant(NewRestaurant {
            username: "lataqueria".to_string(),
            password: PASSWORD.to_string(),
            name: "La Taqueria".to_string(),
            email: "taqueria@example.com".to_string(),
            phone: "+1 555 0104".to_string(),
            address: "2 Mission St".to_string(),
            cuisine: "Mexican".to_string(),
            latitude: 37.7749,
            longitude: -122.4194,
        }))
        .await
    {
        Ok(Account::Restaurant(r)) => r,
        other => panic!("Failed to create restaurant: {:?}", other),
    };

    restaurants
        .update_profile(
            fixtures.restaurant.id,
            &feastride_backend::repositories::restaurant_repository::RestaurantUpdate {
                is_open: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(restaurants.list(false, None).await.unwrap().len(), 2);

    let open: Vec<_> = restaurants
        .list(true, None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(open, vec![taqueria.id]);

    let chinese: Vec<_> = restaurants
        .list(false, Some(" chinese "))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(chinese, vec![fixtures.restaurant.id]);

    // Both filters at once: the only Chinese place is closed
    assert!(restaurants.list(true, Some("Chinese")).await.unwrap().is_empty());
}

// ============================================================================
// Order Tests
// ============================================================================

#[sqlx::test]
async fn test_order_lifecycle(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let orders = &db.state.order_service;

    let order = fixtures.place_order(&db).await;
    assert_eq!(order.status_enum(), OrderStatus::Pending);
    assert_eq!(order.total, Decimal::new(1700, 2));

    // Riders only see confirmed orders
    assert!(orders.available_deliveries().await.unwrap().is_empty());

    let order = orders
        .transition(AccountKind::Restaurant, fixtures.restaurant.id, order.id, "confirm")
        .await
        .expect("Restaurant should confirm");
    assert_eq!(order.status_enum(), OrderStatus::Confirmed);
    assert_eq!(orders.available_deliveries().await.unwrap().len(), 1);

    let order = orders
        .transition(AccountKind::Rider, fixtures.rider.id, order.id, "pickup")
        .await
        .expect("Rider should pick up");
    assert_eq!(order.rider_id, Some(fixtures.rider.id));
    assert!(orders.available_deliveries().await.unwrap().is_empty());

    // Customer cannot cancel once it is on the way
    let err = orders
        .transition(AccountKind::Customer, fixtures.customer.id, order.id, "cancel")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

    let order = orders
        .transition(AccountKind::Rider, fixtures.rider.id, order.id, "deliver")
        .await
        .expect("Rider should deliver");
    assert_eq!(order.status_enum(), OrderStatus::Delivered);

    let tracking = orders
        .tracking(AccountKind::Customer, fixtures.customer.id, order.id)
        .await
        .unwrap();
    assert_eq!(tracking.rider.map(|r| r.id), Some(fixtures.rider.id));

    // Everyone but the actor heard about each step
    let restaurant_inbox = db
        .state
        .notification_service
        .list(AccountKind::Restaurant, fixtures.restaurant.id, false)
        .await
        .unwrap();
    assert!(!restaurant_inbox.is_empty());
}

#[sqlx::test]
async fn test_only_one_rider_claims_an_order(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let other_rider = match db.state.account_service.register(&new_rider("sam")).await {
        Ok(Account::Rider(r)) => r,
        other => panic!("Failed to create rider: {:?}", other),
    };

    let order = fixtures.place_order(&db).await;
    db.state
        .order_service
        .transition(AccountKind::Restaurant, fixtures.restaurant.id, order.id, "confirm")
        .await
        .unwrap();

    let claimed = db
        .state
        .order_repo
        .transition(order.id, OrderAction::Pickup, fixtures.rider.id)
        .await
        .expect("First pickup should win");
    assert_eq!(claimed.rider_id, Some(fixtures.rider.id));

    let err = db
        .state
        .order_repo
        .transition(order.id, OrderAction::Pickup, other_rider.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::StaleStatus(_)), "got {:?}", err);

    // Only the holder may deliver
    let err = db
        .state
        .order_repo
        .transition(order.id, OrderAction::Deliver, other_rider.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::StaleStatus(_)));

    // And the loser cannot even see it any more
    let err = db
        .state
        .order_service
        .get(AccountKind::Rider, other_rider.id, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test]
async fn test_order_rejects_foreign_and_closed(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let orders = &db.state.order_service;

    let other = match db
        .state
        .account_service
        .register(&new_restaurant("tacoplace"))
        .await
    {
        Ok(Account::Restaurant(r)) => r,
        other => panic!("Failed to create restaurant: {:?}", other),
    };

    // Item from another restaurant's menu
    let err = orders
        .place_order(
            fixtures.customer.id,
            &NewOrder {
                restaurant_id: other.id,
                items: vec![OrderLine {
                    menu_item_id: fixtures.dumplings.id,
                    quantity: 1,
                }],
                delivery_address: "1 Main St".to_string(),
                offer_code: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);

    db.state
        .restaurant_service
        .update_profile(
            fixtures.restaurant.id,
            &feastride_backend::repositories::restaurant_repository::RestaurantUpdate {
                is_open: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = orders
        .place_order(
            fixtures.customer.id,
            &NewOrder {
                restaurant_id: fixtures.restaurant.id,
                items: vec![OrderLine {
                    menu_item_id: fixtures.dumplings.id,
                    quantity: 1,
                }],
                delivery_address: "1 Main St".to_string(),
                offer_code: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[sqlx::test]
async fn test_offer_code_discount(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;

    db.state
        .restaurant_service
        .create_offer(
            fixtures.restaurant.id,
            &NewOffer {
                title: "Ten off".to_string(),
                code: "WOK10".to_string(),
                discount_percent: 10,
                min_order_amount: Decimal::new(1000, 2),
                valid_until: None,
            },
        )
        .await
        .expect("Failed to create offer");

    let order = db
        .state
        .order_service
        .place_order(
            fixtures.customer.id,
            &NewOrder {
                restaurant_id: fixtures.restaurant.id,
                items: vec![OrderLine {
                    menu_item_id: fixtures.noodles.id,
                    quantity: 1,
                }],
                delivery_address: "1 Main St".to_string(),
                offer_code: Some(" wok10 ".to_string()),
            },
        )
        .await
        .expect("Order with offer failed");

    assert_eq!(order.subtotal, Decimal::new(1200, 2));
    assert_eq!(order.discount, Decimal::new(120, 2));
    assert_eq!(order.total, Decimal::new(1080, 2));
}

#[sqlx::test]
async fn test_restaurant_cancels_confirmed_order(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let orders = &db.state.order_service;

    let order = fixtures.place_order(&db).await;
    orders
        .transition(AccountKind::Restaurant, fixtures.restaurant.id, order.id, "confirm")
        .await
        .unwrap();

    // Too late for the customer
    let err = orders
        .transition(AccountKind::Customer, fixtures.customer.id, order.id, "cancel")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

    let order = orders
        .transition(AccountKind::Restaurant, fixtures.restaurant.id, order.id, "cancel")
        .await
        .expect("Restaurant should cancel a confirmed order");
    assert_eq!(order.status_enum(), OrderStatus::Cancelled);
    assert!(orders.available_deliveries().await.unwrap().is_empty());

    let err = orders
        .transition(AccountKind::Rider, fixtures.rider.id, order.id, "pickup")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_) | AppError::NotFound(_)), "got {:?}", err);
}

#[sqlx::test]
async fn test_deactivated_offer_code_is_rejected(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let restaurants = &db.state.restaurant_service;

    let offer = restaurants
        .create_offer(
            fixtures.restaurant.id,
            &NewOffer {
                title: "Happy hour".to_string(),
                code: "HAPPY".to_string(),
                discount_percent: 25,
                min_order_amount: Decimal::ZERO,
                valid_until: None,
            },
        )
        .await
        .unwrap();

    let deactivated = restaurants
        .deactivate_offer(fixtures.restaurant.id, offer.id)
        .await
        .expect("Failed to deactivate offer");
    assert!(!deactivated.is_active);
    assert!(restaurants
        .get(fixtures.restaurant.id)
        .await
        .unwrap()
        .offers
        .is_empty());

    let err = db
        .state
        .order_service
        .place_order(
            fixtures.customer.id,
            &NewOrder {
                restaurant_id: fixtures.restaurant.id,
                items: vec![OrderLine {
                    menu_item_id: fixtures.noodles.id,
                    quantity: 1,
                }],
                delivery_address: "1 Main St".to_string(),
                offer_code: Some("happy".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
}

#[sqlx::test]
async fn test_order_total_beyond_money_range_is_rejected(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;

    let caviar = db
        .state
        .restaurant_service
        .add_menu_item(
            fixtures.restaurant.id,
            &NewMenuItem {
                name: "Caviar tower".to_string(),
                description: String::new(),
                price: feastride_backend::models::menu::MAX_AMOUNT,
                category: "Specials".to_string(),
            },
        )
        .await
        .expect("The largest storable price should be accepted");

    let err = db
        .state
        .order_service
        .place_order(
            fixtures.customer.id,
            &NewOrder {
                restaurant_id: fixtures.restaurant.id,
                items: vec![OrderLine {
                    menu_item_id: caviar.id,
                    quantity: 2,
                }],
                delivery_address: "1 Main St".to_string(),
                offer_code: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
}

// ============================================================================
// Ride Tests
// ============================================================================

#[sqlx::test]
async fn test_ride_lifecycle_toggles_driver(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let rides = &db.state.ride_service;
    let quote = RideQuote {
        pickup: waypoint(40.7580, -73.9855),
        dropoff: waypoint(40.7061, -74.0087),
    };

    let ride = rides
        .request(fixtures.customer.id, &quote)
        .await
        .expect("Ride request failed");
    assert_eq!(ride.status_enum(), RideStatus::Requested);

    let err = rides.request(fixtures.customer.id, &quote).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

    let ride = rides
        .transition(AccountKind::Driver, fixtures.driver.id, ride.id, "accept")
        .await
        .expect("Driver should accept");
    assert_eq!(ride.driver_id, Some(fixtures.driver.id));

    let driver = db.state.account_repo.find_driver(fixtures.driver.id).await.unwrap().unwrap();
    assert!(!driver.is_available);

    // Cannot go back on shift mid-ride
    let err = db
        .state
        .account_service
        .update_courier_status(
            AccountKind::Driver,
            fixtures.driver.id,
            &CourierStatus {
                is_available: Some(true),
                ..CourierStatus::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    rides
        .transition(AccountKind::Driver, fixtures.driver.id, ride.id, "start")
        .await
        .expect("Driver should start");
    let ride = rides
        .transition(AccountKind::Driver, fixtures.driver.id, ride.id, "complete")
        .await
        .expect("Driver should complete");
    assert_eq!(ride.status_enum(), RideStatus::Completed);

    let driver = db.state.account_repo.find_driver(fixtures.driver.id).await.unwrap().unwrap();
    assert!(driver.is_available);

    // The customer is free to ride again
    assert_ok!(rides.request(fixtures.customer.id, &quote).await);
}

#[sqlx::test]
async fn test_only_one_driver_accepts(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let other_driver = match db.state.account_service.register(&new_driver("devon")).await {
        Ok(Account::Driver(d)) => d,
        other => panic!("Failed to create driver: {:?}", other),
    };
    db.state
        .account_repo
        .update_courier_status(AccountKind::Driver, other_driver.id, Some(true), None)
        .await
        .unwrap();

    let ride = db
        .state
        .ride_service
        .request(
            fixtures.customer.id,
            &RideQuote {
                pickup: waypoint(51.5007, -0.1246),
                dropoff: waypoint(51.5033, -0.1196),
            },
        )
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        db.state.ride_repo.accept(ride.id, fixtures.driver.id),
        db.state.ride_repo.accept(ride.id, other_driver.id),
    );
    assert!(first.is_ok() != second.is_ok(), "exactly one accept should win");

    let winner = db.state.ride_repo.find_by_id(ride.id).await.unwrap().unwrap();
    let loser_id = if winner.driver_id == Some(fixtures.driver.id) {
        other_driver.id
    } else {
        fixtures.driver.id
    };

    // The losing driver stays available
    let loser = db.state.account_repo.find_driver(loser_id).await.unwrap().unwrap();
    assert!(loser.is_available);
}

#[sqlx::test]
async fn test_unavailable_driver_cannot_accept(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    db.state
        .account_repo
        .update_courier_status(AccountKind::Driver, fixtures.driver.id, Some(false), None)
        .await
        .unwrap();

    let ride = db
        .state
        .ride_service
        .request(
            fixtures.customer.id,
            &RideQuote {
                pickup: waypoint(48.8584, 2.2945),
                dropoff: waypoint(48.8606, 2.3376),
            },
        )
        .await
        .unwrap();

    let err = db
        .state
        .ride_service
        .transition(AccountKind::Driver, fixtures.driver.id, ride.id, "accept")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
}

#[sqlx::test]
async fn test_cancelling_accepted_ride_releases_driver(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let rides = &db.state.ride_service;
    let quote = RideQuote {
        pickup: waypoint(41.8902, 12.4922),
        dropoff: waypoint(41.9029, 12.4534),
    };

    for canceller in [AccountKind::Customer, AccountKind::Driver] {
        let ride = rides.request(fixtures.customer.id, &quote).await.unwrap();
        rides
            .transition(AccountKind::Driver, fixtures.driver.id, ride.id, "accept")
            .await
            .unwrap();

        let actor = match canceller {
            AccountKind::Customer => fixtures.customer.id,
            _ => fixtures.driver.id,
        };
        let ride = rides
            .transition(canceller, actor, ride.id, "cancel")
            .await
            .unwrap_or_else(|e| panic!("{} should cancel an accepted ride: {:?}", canceller, e));
        assert_eq!(ride.status_enum(), RideStatus::Cancelled);

        let driver = db.state.account_repo.find_driver(fixtures.driver.id).await.unwrap().unwrap();
        assert!(driver.is_available, "driver still busy after {} cancel", canceller);
    }
}

#[sqlx::test]
async fn test_driver_cannot_cancel_unaccepted_ride(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let rides = &db.state.ride_service;

    let ride = rides
        .request(
            fixtures.customer.id,
            &RideQuote {
                pickup: waypoint(35.6586, 139.7454),
                dropoff: waypoint(35.7101, 139.8107),
            },
        )
        .await
        .unwrap();

    assert_err!(
        rides
            .transition(AccountKind::Driver, fixtures.driver.id, ride.id, "cancel")
            .await
    );

    // The customer may still withdraw a request nobody took
    let ride = rides
        .transition(AccountKind::Customer, fixtures.customer.id, ride.id, "cancel")
        .await
        .unwrap();
    assert_eq!(ride.status_enum(), RideStatus::Cancelled);
}

// ============================================================================
// Reservation Tests
// ============================================================================

#[sqlx::test]
async fn test_reservation_flow(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let reservations = &db.state.reservation_service;

    let reservation = reservations
        .create(
            fixtures.customer.id,
            &NewReservation {
                restaurant_id: fixtures.restaurant.id,
                party_size: 4,
                reserved_for: Utc::now().naive_utc() + Duration::days(1),
                note: Some("Window seat".to_string()),
            },
        )
        .await
        .expect("Reservation failed");
    assert_eq!(reservation.status_enum(), ReservationStatus::Pending);

    let err = reservations
        .transition(AccountKind::Customer, fixtures.customer.id, reservation.id, "confirm")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let confirmed = reservations
        .transition(AccountKind::Restaurant, fixtures.restaurant.id, reservation.id, "confirm")
        .await
        .unwrap();
    assert_eq!(confirmed.status_enum(), ReservationStatus::Confirmed);

    let err = reservations
        .transition(AccountKind::Restaurant, fixtures.restaurant.id, reservation.id, "confirm")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = reservations
        .transition(AccountKind::Restaurant, fixtures.restaurant.id, reservation.id, "teleport")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let listed = reservations
        .list(AccountKind::Restaurant, fixtures.restaurant.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[sqlx::test]
async fn test_reservation_reject_and_cancel(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let reservations = &db.state.reservation_service;
    let booking = NewReservation {
        restaurant_id: fixtures.restaurant.id,
        party_size: 2,
        reserved_for: Utc::now().naive_utc() + Duration::days(3),
        note: None,
    };

    let first = reservations.create(fixtures.customer.id, &booking).await.unwrap();
    let rejected = reservations
        .transition(AccountKind::Restaurant, fixtures.restaurant.id, first.id, "reject")
        .await
        .expect("Restaurant should reject");
    assert_eq!(rejected.status_enum(), ReservationStatus::Rejected);

    // Rejected is final
    let err = reservations
        .transition(AccountKind::Customer, fixtures.customer.id, first.id, "cancel")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

    let second = reservations.create(fixtures.customer.id, &booking).await.unwrap();
    reservations
        .transition(AccountKind::Restaurant, fixtures.restaurant.id, second.id, "confirm")
        .await
        .unwrap();

    let err = reservations
        .transition(AccountKind::Restaurant, fixtures.restaurant.id, second.id, "cancel")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {:?}", err);

    let cancelled = reservations
        .transition(AccountKind::Customer, fixtures.customer.id, second.id, "cancel")
        .await
        .expect("Customer should cancel a confirmed booking");
    assert_eq!(cancelled.status_enum(), ReservationStatus::Cancelled);

    let customer_inbox = db
        .state
        .notification_service
        .list(AccountKind::Customer, fixtures.customer.id, false)
        .await
        .unwrap();
    assert!(customer_inbox.len() >= 2);
}

// ============================================================================
// Rating Tests
// ============================================================================

#[sqlx::test]
async fn test_rating_updates_average_once(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let orders = &db.state.order_service;
    let ratings = &db.state.rating_service;

    let order = fixtures.place_order(&db).await;
    let rate_restaurant = NewRating {
        subject_kind: SubjectKind::Order,
        subject_id: order.id,
        target_kind: AccountKind::Restaurant,
        score: 4,
        comment: Some("Crispy".to_string()),
    };

    // Not delivered yet
    let err = ratings.rate(fixtures.customer.id, &rate_restaurant).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);

    for (kind, actor, action) in [
        (AccountKind::Restaurant, fixtures.restaurant.id, "confirm"),
        (AccountKind::Rider, fixtures.rider.id, "pickup"),
        (AccountKind::Rider, fixtures.rider.id, "deliver"),
    ] {
        orders.transition(kind, actor, order.id, action).await.unwrap();
    }

    let rating = ratings
        .rate(fixtures.customer.id, &rate_restaurant)
        .await
        .expect("Rating failed");
    assert_eq!(rating.target_id, fixtures.restaurant.id);

    let err = ratings.rate(fixtures.customer.id, &rate_restaurant).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    ratings
        .rate(
            fixtures.customer.id,
            &NewRating {
                subject_kind: SubjectKind::Order,
                subject_id: order.id,
                target_kind: AccountKind::Rider,
                score: 5,
                comment: None,
            },
        )
        .await
        .expect("Rider rating failed");

    let restaurant = db
        .state
        .account_repo
        .find_restaurant(fixtures.restaurant.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restaurant.rating_count, 1);
    assert_eq!(restaurant.rating_avg, Decimal::new(400, 2));

    let rider = db.state.account_repo.find_rider(fixtures.rider.id).await.unwrap().unwrap();
    assert_eq!(rider.rating_count, 1);
    assert_eq!(rider.rating_avg, Decimal::new(500, 2));

    let listed = ratings
        .list_for_target(AccountKind::Restaurant, fixtures.restaurant.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[sqlx::test]
async fn test_rating_average_does_not_drift(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let orders = &db.state.order_service;

    // Folding each score into a rounded running average would give 1.15
    for score in [1, 1, 1, 1, 1, 2, 1] {
        let order = fixtures.place_order(&db).await;
        for (kind, actor, action) in [
            (AccountKind::Restaurant, fixtures.restaurant.id, "confirm"),
            (AccountKind::Rider, fixtures.rider.id, "pickup"),
            (AccountKind::Rider, fixtures.rider.id, "deliver"),
        ] {
            orders.transition(kind, actor, order.id, action).await.unwrap();
        }
        db.state
            .rating_service
            .rate(
                fixtures.customer.id,
                &NewRating {
                    subject_kind: SubjectKind::Order,
                    subject_id: order.id,
                    target_kind: AccountKind::Restaurant,
                    score,
                    comment: None,
                },
            )
            .await
            .unwrap();
    }

    let restaurant = db
        .state
        .account_repo
        .find_restaurant(fixtures.restaurant.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restaurant.rating_count, 7);
    assert_eq!(restaurant.rating_avg, Decimal::new(114, 2));
}

// ============================================================================
// Notification Tests
// ============================================================================

#[sqlx::test]
async fn test_notifications_are_private(pool: PgPool) {
    let db = TestDatabase::from_pool(pool).await;
    let fixtures = TestFixtures::create(&db).await;
    let notifications = &db.state.notification_service;

    fixtures.place_order(&db).await;

    let inbox = notifications
        .list(AccountKind::Restaurant, fixtures.restaurant.id, true)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    let note = &inbox[0];

    let err = notifications
        .mark_read(AccountKind::Customer, fixtures.customer.id, note.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let read = notifications
        .mark_read(AccountKind::Restaurant, fixtures.restaurant.id, note.id)
        .await
        .unwrap();
    assert!(read.is_read);

    assert!(notifications
        .list(AccountKind::Restaurant, fixtures.restaurant.id, true)
        .await
        .unwrap()
        .is_empty());
}
