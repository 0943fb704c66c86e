//! Order placement, status changes and the price lookup API.

#![allow(clippy::unwrap_used)]

use abc_retailers_admin::storage::{ORDER_NOTIFICATIONS_QUEUE, STOCK_UPDATES_QUEUE};
use abc_retailers_core::{Customer, Email, Order, OrderStatus, Price, Product};
use abc_retailers_integration_tests::{TestApp, body_json, body_text};
use axum::http::{StatusCode, header};
use serde_json::json;

async fn seed(app: &TestApp, stock: u32) -> (Customer, Product) {
    let entities = app.storage.entities();
    let customer = entities
        .insert(Customer::new(
            "Naledi".to_string(),
            "Khumalo".to_string(),
            "naledik".to_string(),
            Email::parse("naledi@example.com").unwrap(),
            "3 Jacaranda St, Pretoria".to_string(),
        ))
        .await
        .unwrap();
    let product = entities
        .insert(Product::new(
            "Coffee Beans 1kg".to_string(),
            "Medium roast".to_string(),
            Price::parse_lenient("9.99").unwrap(),
            stock,
        ))
        .await
        .unwrap();
    (customer, product)
}

async fn place(app: &TestApp, customer: &Customer, product: &Product, quantity: &str) -> axum::response::Response {
    app.post_form(
        "/orders",
        &[
            ("customer_id", customer.id.as_str()),
            ("product_id", product.id.as_str()),
            ("quantity", quantity),
            ("order_date", "2024-03-09T14:30"),
        ],
    )
    .await
}

#[tokio::test]
async fn test_place_order_updates_stock_and_publishes_events() {
    let app = TestApp::new().await;
    let (customer, product) = seed(&app, 10).await;

    let response = place(&app, &customer, &product, "3").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/orders");

    let orders = app.storage.entities().list::<Order>().await.unwrap();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.quantity, 3);
    assert_eq!(order.total_price.to_string(), "29.97");
    assert_eq!(order.status, OrderStatus::Submitted);
    assert_eq!(order.username, "naledik");

    let product = app
        .storage
        .entities()
        .find::<Product>(product.id.as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock_available, 7);

    let created = app
        .storage
        .queues()
        .receive_one(ORDER_NOTIFICATIONS_QUEUE)
        .await
        .unwrap()
        .unwrap();
    let created: serde_json::Value = serde_json::from_str(&created).unwrap();
    assert_eq!(created["CustomerName"], "Naledi Khumalo");
    assert_eq!(created["Quantity"], 3);
    assert_eq!(created["Status"], "Submitted");

    let stock = app
        .storage
        .queues()
        .receive_one(STOCK_UPDATES_QUEUE)
        .await
        .unwrap()
        .unwrap();
    let stock: serde_json::Value = serde_json::from_str(&stock).unwrap();
    assert_eq!(stock["PreviousStock"], 10);
    assert_eq!(stock["NewStock"], 7);
    assert_eq!(stock["UpdatedBy"], "System");
}

#[tokio::test]
async fn test_place_order_with_insufficient_stock() {
    let app = TestApp::new().await;
    let (customer, product) = seed(&app, 2).await;

    let response = place(&app, &customer, &product, "5").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Available stock: 2."));

    assert!(app.storage.entities().list::<Order>().await.unwrap().is_empty());
    assert!(
        app.storage
            .queues()
            .receive_one(ORDER_NOTIFICATIONS_QUEUE)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_place_order_rejects_zero_quantity() {
    let app = TestApp::new().await;
    let (customer, product) = seed(&app, 10).await;

    let response = place(&app, &customer, &product, "0").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.storage.entities().list::<Order>().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_order_pages_render() {
    let app = TestApp::new().await;
    let (customer, product) = seed(&app, 10).await;
    place(&app, &customer, &product, "1").await;
    let order = app.storage.entities().list::<Order>().await.unwrap().remove(0);

    let list = body_text(app.get("/orders").await).await;
    assert!(list.contains("Coffee Beans 1kg"));
    assert!(list.contains("2024-03-09 14:30"));

    let detail = app.get(&format!("/orders/{}", order.id)).await;
    assert_eq!(detail.status(), StatusCode::OK);

    let new_form = body_text(app.get("/orders/new").await).await;
    assert!(new_form.contains("naledik"));

    assert_eq!(
        app.get("/orders/missing").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_status_update_json() {
    let app = TestApp::new().await;
    let (customer, product) = seed(&app, 10).await;
    place(&app, &customer, &product, "1").await;
    let order = app.storage.entities().list::<Order>().await.unwrap().remove(0);
    // Drain the placement event
    app.storage
        .queues()
        .receive_one(ORDER_NOTIFICATIONS_QUEUE)
        .await
        .unwrap();

    let response = app
        .post_json(
            &format!("/orders/{}/status", order.id),
            &json!({"newStatus": "Shipped"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Order status updated successfully to Shipped.");

    let event = app
        .storage
        .queues()
        .receive_one(ORDER_NOTIFICATIONS_QUEUE)
        .await
        .unwrap()
        .unwrap();
    let event: serde_json::Value = serde_json::from_str(&event).unwrap();
    assert_eq!(event["PreviousStatus"], "Submitted");
    assert_eq!(event["NewStatus"], "Shipped");
}

#[tokio::test]
async fn test_status_update_unknown_order() {
    let app = TestApp::new().await;
    let response = app
        .post_json("/orders/missing/status", &json!({"newStatus": "Shipped"}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Order not found.");
}

#[tokio::test]
async fn test_status_update_requires_status() {
    let app = TestApp::new().await;
    let response = app
        .post_json("/orders/any/status", &json!({"newStatus": "  "}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_product_price_api() {
    let app = TestApp::new().await;
    let (_, product) = seed(&app, 10).await;

    let body = body_json(app.get(&format!("/api/products/{}/price", product.id)).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["price"], 9.99);
    assert_eq!(body["stock"], 10);
    assert_eq!(body["productName"], "Coffee Beans 1kg");

    let body = body_json(app.get("/api/products/missing/price").await).await;
    assert_eq!(body, json!({"success": false}));
}
