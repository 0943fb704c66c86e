//! Customer pages driven through the router.

#![allow(clippy::unwrap_used)]

use abc_retailers_core::{Customer, Email, RecordKind};
use abc_retailers_integration_tests::{TestApp, body_text};
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};

const FIELDS: &[(&str, &str)] = &[
    ("name", "Thabo"),
    ("surname", "Mokoena"),
    ("username", "thabom"),
    ("email", "thabo@example.com"),
    ("shipping_address", "12 Long St, Cape Town"),
];

fn with(field: &str, value: &'static str) -> Vec<(&'static str, &'static str)> {
    FIELDS
        .iter()
        .map(|&(k, v)| if k == field { (k, value) } else { (k, v) })
        .collect()
}

#[tokio::test]
async fn test_create_customer_redirects_with_flash() {
    let app = TestApp::new().await;

    let response = app.post_form("/customers", FIELDS).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/customers");

    // Follow the redirect with the session cookie to see the flash
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let request = Request::get("/customers")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let body = body_text(app.send(request).await).await;
    assert!(body.contains("Customer created successfully."));
    assert!(body.contains("Thabo Mokoena"));

    let customers = app.storage.entities().list::<Customer>().await.unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].email.as_str(), "thabo@example.com");
}

#[tokio::test]
async fn test_create_customer_rejects_invalid_email() {
    let app = TestApp::new().await;

    let response = app
        .post_form("/customers", &with("email", "not-an-email"))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_text(response).await;
    assert!(body.contains("Please enter a valid email address"));
    // The submitted values are kept
    assert!(body.contains("not-an-email"));
    assert!(
        app.storage
            .entities()
            .list::<Customer>()
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_update_customer() {
    let app = TestApp::new().await;
    let customer = app
        .storage
        .entities()
        .insert(Customer::new(
            "Thabo".to_string(),
            "Mokoena".to_string(),
            "thabom".to_string(),
            Email::parse("thabo@example.com").unwrap(),
            "12 Long St, Cape Town".to_string(),
        ))
        .await
        .unwrap();

    let edit = app.get(&format!("/customers/{}/edit", customer.id)).await;
    assert_eq!(edit.status(), StatusCode::OK);
    assert!(body_text(edit).await.contains("12 Long St, Cape Town"));

    let response = app
        .post_form(
            &format!("/customers/{}", customer.id),
            &with("shipping_address", "7 Bree St, Cape Town"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let stored = app
        .storage
        .entities()
        .find::<Customer>(customer.id.as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.shipping_address, "7 Bree St, Cape Town");
    assert_ne!(stored.version, customer.version);
}

#[tokio::test]
async fn test_edit_missing_customer_is_not_found() {
    let app = TestApp::new().await;
    let response = app.get("/customers/does-not-exist/edit").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_customer() {
    let app = TestApp::new().await;
    let customer = app
        .storage
        .entities()
        .insert(Customer::new(
            "Naledi".to_string(),
            "Khumalo".to_string(),
            "naledik".to_string(),
            Email::parse("naledi@example.com").unwrap(),
            "3 Jacaranda St, Pretoria".to_string(),
        ))
        .await
        .unwrap();

    let response = app
        .post_form(&format!("/customers/{}/delete", customer.id), &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert!(
        app.storage
            .entities()
            .get::<Customer>(RecordKind::Customer.partition_key(), customer.id.as_str())
            .await
            .unwrap()
            .is_none()
    );
}
