mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use pharmacy_backend::database::Database;
use pharmacy_backend::handlers;
use pharmacy_backend::services::Services;
use pharmacy_shared::{CartView, UserRole, MSG_CART_EMPTY, MSG_ORDER_NOT_FOUND};
use rust_decimal::Decimal;
use std::time::Duration;
use uuid::Uuid;

use common::*;

macro_rules! storefront {
    ($pool:expr) => {{
        let pool = $pool.clone();
        let services = Services::new(pool.clone(), Duration::from_secs(3600), false);
        let jwt = jwt();
        test::init_service(
            App::new()
                .app_data(web::Data::new(Database::from_pool(pool)))
                .app_data(web::Data::new(jwt.clone()))
                .configure(|cfg| services.register(cfg))
                .configure(|cfg| handlers::configure(cfg, jwt.clone())),
        )
        .await
    }};
}

#[actix_web::test]
async fn guest_add_to_cart_counts_every_call() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let category = create_category(&pool).await;
    let medicine = create_medicine(&pool, &category, "Cetirizine", Decimal::new(4500, 2)).await;

    let req = test::TestRequest::post()
        .uri(&format!("/add-to-cart/{}/", medicine.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart/");
    let cookie = session_cookie(&resp).expect("session cookie");

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/add-to-cart/{}/", medicine.id))
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    let req = test::TestRequest::get().uri("/cart/").cookie(cookie.clone()).to_request();
    let cart: CartView = test::call_and_read_body_json(&app, req).await;
    assert!(cart.is_guest);
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].quantity, 3);
    assert_eq!(cart.total, Decimal::new(13500, 2));
    assert_eq!(cart.messages.len(), 3);
    assert_eq!(cart.messages[0].message, format!("{} added to cart!", medicine.name));

    // Messages are shown once
    let req = test::TestRequest::get().uri("/cart/").cookie(cookie).to_request();
    let cart: CartView = test::call_and_read_body_json(&app, req).await;
    assert!(cart.messages.is_empty());
}

#[actix_web::test]
async fn member_cart_updates_to_zero_or_below_remove_the_line() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let category = create_category(&pool).await;
    let medicine = create_medicine(&pool, &category, "Loratadine", Decimal::new(6000, 2)).await;
    let auth = bearer(Uuid::new_v4(), UserRole::Customer);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/add-to-cart/{}/", medicine.id))
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::get()
        .uri("/cart/")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    let cart: CartView = test::call_and_read_body_json(&app, req).await;
    assert!(!cart.is_guest);
    assert_eq!(cart.lines[0].quantity, 2);

    for quantity in ["0", "-3"] {
        let req = test::TestRequest::post()
            .uri(&format!("/add-to-cart/{}/", medicine.id))
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/update-cart/{}/", medicine.id))
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .set_form([("quantity", quantity)])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let req = test::TestRequest::get()
            .uri("/cart/")
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .to_request();
        let cart: CartView = test::call_and_read_body_json(&app, req).await;
        assert!(cart.lines.is_empty(), "quantity {} should remove the line", quantity);
    }
}

#[actix_web::test]
async fn inactive_medicines_cannot_be_added() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let category = create_category(&pool).await;
    let medicine = create_medicine(&pool, &category, "Retired", Decimal::new(1000, 2)).await;
    sqlx::query("UPDATE medicines SET is_active = FALSE WHERE id = $1")
        .bind(medicine.id)
        .execute(&pool)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/add-to-cart/{}/", medicine.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn empty_cart_checkout_creates_no_order() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let phone = unique_phone();

    let req = test::TestRequest::post()
        .uri("/checkout/")
        .set_form([
            ("shipping_address", "1 Lake View Road"),
            ("phone_number", phone.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart/");
    let cookie = session_cookie(&resp).expect("session cookie");

    assert_eq!(orders_for_phone(&pool, &phone).await, 0);

    let req = test::TestRequest::get().uri("/cart/").cookie(cookie).to_request();
    let cart: CartView = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cart.messages[0].message, MSG_CART_EMPTY);
}

#[actix_web::test]
async fn guest_checkout_writes_order_items_and_empties_cart() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let category = create_category(&pool).await;
    let a = create_medicine(&pool, &category, "Medicine A", Decimal::new(9000, 2)).await;
    let b = create_medicine(&pool, &category, "Medicine B", Decimal::new(5000, 2)).await;
    let phone = unique_phone();

    let req = test::TestRequest::post().uri(&format!("/add-to-cart/{}/", a.id)).to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = session_cookie(&resp).expect("session cookie");
    for id in [a.id, b.id] {
        let req = test::TestRequest::post()
            .uri(&format!("/add-to-cart/{}/", id))
            .cookie(cookie.clone())
            .to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::post()
        .uri("/checkout/")
        .cookie(cookie.clone())
        .set_form([
            ("shipping_address", "12 MG Road, Bengaluru"),
            ("phone_number", phone.as_str()),
            ("customer_name", "Asha"),
            ("customer_email", "asha@example.com"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let target = location(&resp);
    assert!(target.starts_with("/order-success/"));

    let (order_id, total, address, user_id): (i64, Decimal, String, Option<Uuid>) = sqlx::query_as(
        "SELECT id, total_amount, shipping_address, user_id FROM orders WHERE phone_number = $1",
    )
    .bind(&phone)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(target, format!("/order-success/{}/", order_id));
    assert_eq!(total, Decimal::new(23000, 2));
    assert_eq!(address, "Asha\nasha@example.com\n12 MG Road, Bengaluru");
    assert_eq!(user_id, None);

    let items: Vec<(i64, i32, Decimal)> = sqlx::query_as(
        "SELECT medicine_id, quantity, price FROM order_items WHERE order_id = $1 ORDER BY price DESC",
    )
    .bind(order_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(
        items,
        vec![(a.id, 2, Decimal::new(9000, 2)), (b.id, 1, Decimal::new(5000, 2))]
    );

    let req = test::TestRequest::get().uri(&target).cookie(cookie.clone()).to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["order"]["id"], order_id);
    // The add-to-cart messages were never shown, so the order message comes last
    let messages = body["messages"].as_array().expect("messages");
    assert_eq!(messages.len(), 4);
    assert_eq!(
        messages[3]["message"],
        format!("Order #{} placed successfully! We will contact you soon.", order_id)
    );

    let req = test::TestRequest::get().uri("/cart/").cookie(cookie).to_request();
    let cart: CartView = test::call_and_read_body_json(&app, req).await;
    assert!(cart.lines.is_empty());
}

#[actix_web::test]
async fn member_checkout_uses_live_prices_and_clears_db_cart() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let category = create_category(&pool).await;
    let medicine = create_medicine(&pool, &category, "Zinc", Decimal::new(10000, 2)).await;
    let user_id = Uuid::new_v4();
    let auth = bearer(user_id, UserRole::Customer);
    let phone = unique_phone();

    let req = test::TestRequest::post()
        .uri(&format!("/add-to-cart/{}/", medicine.id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    test::call_service(&app, req).await;

    // Price drops after the item went into the cart
    sqlx::query("UPDATE medicines SET price = 80.00 WHERE id = $1")
        .bind(medicine.id)
        .execute(&pool)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/checkout/")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_form([("shipping_address", "4 Park Street"), ("phone_number", phone.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let (total, owner): (Decimal, Option<Uuid>) =
        sqlx::query_as("SELECT total_amount, user_id FROM orders WHERE phone_number = $1")
            .bind(&phone)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(total, Decimal::new(8000, 2));
    assert_eq!(owner, Some(user_id));

    let remaining: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM cart_items ci JOIN carts c ON c.id = ci.cart_id WHERE c.user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(remaining, 0);

    let req = test::TestRequest::get()
        .uri("/orders/")
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    let history: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(history.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn tracking_by_phone_and_by_order() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let category = create_category(&pool).await;
    let medicine = create_medicine(&pool, &category, "ORS", Decimal::new(2500, 2)).await;
    let phone = unique_phone();

    let mut placed = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/add-to-cart/{}/", medicine.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let cookie = session_cookie(&resp).expect("session cookie");

        let req = test::TestRequest::post()
            .uri("/checkout/")
            .cookie(cookie)
            .set_form([("shipping_address", "7 Beach Road"), ("phone_number", phone.as_str())])
            .to_request();
        let resp = test::call_service(&app, req).await;
        placed.push(location(&resp));
    }

    let req = test::TestRequest::post()
        .uri("/track-order/")
        .set_form([("order_id", ""), ("phone_number", phone.as_str())])
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["search_type"], "phone");
    let orders = body["orders"].as_array().expect("orders");
    assert_eq!(orders.len(), 2);
    // Newest first
    assert!(orders[0]["id"].as_i64() > orders[1]["id"].as_i64());

    let order_id = orders[1]["id"].as_i64().expect("id").to_string();
    let req = test::TestRequest::post()
        .uri("/track-order/")
        .set_form([("order_id", order_id.as_str()), ("phone_number", phone.as_str())])
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["search_type"], "specific");
    assert_eq!(body["order"]["id"].as_i64().map(|id| id.to_string()), Some(order_id.clone()));

    let req = test::TestRequest::post()
        .uri("/track-order/")
        .set_form([("order_id", order_id.as_str()), ("phone_number", "0000000000")])
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"], MSG_ORDER_NOT_FOUND);
    assert!(body["order"].is_null());
}

#[actix_web::test]
async fn member_add_to_cart_counts_every_call() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let category = create_category(&pool).await;
    let medicine = create_medicine(&pool, &category, "Montelukast", Decimal::new(12000, 2)).await;
    let auth = bearer(Uuid::new_v4(), UserRole::Customer);

    for expected in 1..=5 {
        let req = test::TestRequest::post()
            .uri(&format!("/add-to-cart/{}/", medicine.id))
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let req = test::TestRequest::get()
            .uri("/cart/")
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .to_request();
        let cart: CartView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, expected);
        assert_eq!(cart.total, Decimal::new(12000, 2) * Decimal::from(expected));
    }
}

#[actix_web::test]
async fn guest_checkout_ignores_the_price_seen_when_adding() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let category = create_category(&pool).await;
    let medicine = create_medicine(&pool, &category, "Omeprazole", Decimal::new(10000, 2)).await;
    let phone = unique_phone();

    let req = test::TestRequest::post()
        .uri(&format!("/add-to-cart/{}/", medicine.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = session_cookie(&resp).expect("session cookie");
    let req = test::TestRequest::post()
        .uri(&format!("/add-to-cart/{}/", medicine.id))
        .cookie(cookie.clone())
        .to_request();
    test::call_service(&app, req).await;

    let snapshot: String = sqlx::query_scalar(
        "SELECT data->'cart'->$1->>'price' FROM sessions WHERE session_key = $2::uuid",
    )
    .bind(medicine.id.to_string())
    .bind(cookie.value())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(snapshot, "100.00");

    sqlx::query("UPDATE medicines SET price = 75.50 WHERE id = $1")
        .bind(medicine.id)
        .execute(&pool)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/checkout/")
        .cookie(cookie)
        .set_form([("shipping_address", "3 Hill Road"), ("phone_number", phone.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let (order_id, total): (i64, Decimal) =
        sqlx::query_as("SELECT id, total_amount FROM orders WHERE phone_number = $1")
            .bind(&phone)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(total, Decimal::new(15100, 2));

    let price: Decimal = sqlx::query_scalar("SELECT price FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(price, Decimal::new(7550, 2));
}

#[actix_web::test]
async fn concurrent_member_checkouts_place_one_order() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let category = create_category(&pool).await;
    let medicine = create_medicine(&pool, &category, "Azithromycin", Decimal::new(15000, 2)).await;
    let auth = bearer(Uuid::new_v4(), UserRole::Customer);
    let phone = unique_phone();

    let req = test::TestRequest::post()
        .uri(&format!("/add-to-cart/{}/", medicine.id))
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .to_request();
    test::call_service(&app, req).await;

    let checkout = || {
        test::TestRequest::post()
            .uri("/checkout/")
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .set_form([("shipping_address", "9 Canal Street"), ("phone_number", phone.as_str())])
            .to_request()
    };
    let (first, second) = futures_util::future::join(
        test::call_service(&app, checkout()),
        test::call_service(&app, checkout()),
    )
    .await;

    assert_eq!(first.status(), StatusCode::SEE_OTHER);
    assert_eq!(second.status(), StatusCode::SEE_OTHER);
    let mut targets = vec![location(&first), location(&second)];
    targets.sort();
    assert_eq!(targets[0], "/cart/");
    assert!(targets[1].starts_with("/order-success/"));
    assert_eq!(orders_for_phone(&pool, &phone).await, 1);
}

#[actix_web::test]
async fn concurrent_guest_checkouts_place_one_order() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let category = create_category(&pool).await;
    let medicine = create_medicine(&pool, &category, "Doxycycline", Decimal::new(8000, 2)).await;
    let phone = unique_phone();

    let req = test::TestRequest::post()
        .uri(&format!("/add-to-cart/{}/", medicine.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = session_cookie(&resp).expect("session cookie");

    let checkout = || {
        test::TestRequest::post()
            .uri("/checkout/")
            .cookie(cookie.clone())
            .set_form([("shipping_address", "5 Station Road"), ("phone_number", phone.as_str())])
            .to_request()
    };
    let (first, second) = futures_util::future::join(
        test::call_service(&app, checkout()),
        test::call_service(&app, checkout()),
    )
    .await;

    let mut targets = vec![location(&first), location(&second)];
    targets.sort();
    assert_eq!(targets[0], "/cart/");
    assert!(targets[1].starts_with("/order-success/"));
    assert_eq!(orders_for_phone(&pool, &phone).await, 1);
}

/// Make every order-item insert for `medicine_id` fail, after the order row is written
async fn reject_order_items_for(pool: &sqlx::PgPool, medicine_id: i64) -> String {
    let name = format!("reject_order_item_{}", medicine_id);
    sqlx::query(&format!(
        r#"
        CREATE OR REPLACE FUNCTION {name}() RETURNS trigger AS $body$
        BEGIN
            IF NEW.medicine_id = {medicine_id} THEN
                RAISE EXCEPTION 'order items for medicine {medicine_id} are rejected';
            END IF;
            RETURN NEW;
        END
        $body$ LANGUAGE plpgsql
        "#
    ))
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(&format!(
        "CREATE TRIGGER {name} BEFORE INSERT ON order_items FOR EACH ROW EXECUTE FUNCTION {name}()"
    ))
    .execute(pool)
    .await
    .unwrap();
    name
}

async fn drop_rejection(pool: &sqlx::PgPool, name: &str) {
    sqlx::query(&format!("DROP TRIGGER IF EXISTS {name} ON order_items"))
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(&format!("DROP FUNCTION IF EXISTS {name}()"))
        .execute(pool)
        .await
        .unwrap();
}

#[actix_web::test]
async fn failed_checkout_rolls_back_and_keeps_the_cart() {
    let Some(pool) = test_pool().await else { return };
    let app = storefront!(pool);
    let category = create_category(&pool).await;
    let medicine = create_medicine(&pool, &category, "Rejected", Decimal::new(4000, 2)).await;
    let rejection = reject_order_items_for(&pool, medicine.id).await;

    // Member cart
    let auth = bearer(Uuid::new_v4(), UserRole::Customer);
    let member_phone = unique_phone();
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/add-to-cart/{}/", medicine.id))
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .to_request();
        test::call_service(&app, req).await;
    }
    let req = test::TestRequest::post()
        .uri("/checkout/")
        .insert_header((header::AUTHORIZATION, auth.clone()))
        .set_form([("shipping_address", "1 Mill Lane"), ("phone_number", member_phone.as_str())])
        .to_request();
    let member_status = test::call_service(&app, req).await.status();

    let req = test::TestRequest::get()
        .uri("/cart/")
        .insert_header((header::AUTHORIZATION, auth))
        .to_request();
    let member_cart: CartView = test::call_and_read_body_json(&app, req).await;

    // Guest cart
    let guest_phone = unique_phone();
    let req = test::TestRequest::post()
        .uri(&format!("/add-to-cart/{}/", medicine.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = session_cookie(&resp).expect("session cookie");
    let req = test::TestRequest::post()
        .uri("/checkout/")
        .cookie(cookie.clone())
        .set_form([("shipping_address", "2 Mill Lane"), ("phone_number", guest_phone.as_str())])
        .to_request();
    let guest_status = test::call_service(&app, req).await.status();

    let req = test::TestRequest::get().uri("/cart/").cookie(cookie).to_request();
    let guest_cart: CartView = test::call_and_read_body_json(&app, req).await;

    drop_rejection(&pool, &rejection).await;

    assert_eq!(member_status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(orders_for_phone(&pool, &member_phone).await, 0);
    assert_eq!(member_cart.lines.len(), 1);
    assert_eq!(member_cart.lines[0].quantity, 2);

    assert_eq!(guest_status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(orders_for_phone(&pool, &guest_phone).await, 0);
    assert_eq!(guest_cart.lines.len(), 1);
    assert_eq!(guest_cart.lines[0].quantity, 1);
}
