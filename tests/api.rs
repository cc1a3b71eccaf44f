use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use unicart::api::{self, AppState, USER_ID_HEADER, USER_NAME_HEADER};
use unicart::media::MemoryMediaStore;
use unicart::publisher::RecordingPublisher;
use unicart::services::Services;
use unicart::store::{MemoryStore, Repositories};
use unicart::UserId;

const BOUNDARY: &str = "unicart-boundary";

fn app() -> Router {
    let repos = Repositories::from_store(Arc::new(MemoryStore::new()));
    let services = Services::new(repos, Arc::new(MemoryMediaStore::new()), Arc::new(RecordingPublisher::new()), "PHP", vec![UserId::new("admin")]);
    api::router(AppState::new(services), None)
}

async fn send(app: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(uid) = user {
        req = req.header(USER_ID_HEADER, uid).header(USER_NAME_HEADER, "Juan Dela Cruz");
    }
    let req = match body {
        Some(b) => req.header(CONTENT_TYPE, "application/json").body(Body::from(b.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    read(app.clone().oneshot(req).await.unwrap()).await
}

async fn read(res: axum::response::Response) -> (StatusCode, Value) {
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn product_form(name: &str, price: &str, category: &str) -> String {
    let mut body = String::new();
    for (field, value) in [("name", name), ("price", price), ("description", "Cotton"), ("category", category)] {
        body.push_str(&format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n"));
    }
    body.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"tee.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{BOUNDARY}--\r\n"
    ));
    body
}

async fn create_product(app: &Router, user: &str, name: &str, price: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/admin/products")
        .header(USER_ID_HEADER, user)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(product_form(name, price, "maleWear")))
        .unwrap();
    read(app.clone().oneshot(req).await.unwrap()).await
}

#[tokio::test]
async fn test_health_and_identity() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = send(&app, Method::GET, "/api/v1/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = send(&app, Method::GET, "/api/v1/me", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "user");
    assert_eq!(me["displayName"], "Juan Dela Cruz");
}

#[tokio::test]
async fn test_admin_product_management() {
    let app = app();
    let (status, _) = create_product(&app, "u1", "Tee", "1000").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, product) = create_product(&app, "admin", "Tee", "1000").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["category"], "maleWear");
    assert!(product["image"].as_str().unwrap().ends_with("_tee.png"));
    let id = product["id"].as_str().unwrap().to_string();

    let (status, _) = create_product(&app, "admin", " ", "1000").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = send(&app, Method::PATCH, &format!("/api/v1/admin/products/{id}"), Some("admin"), Some(json!({"name": "Updated Name"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Updated Name");

    let (_, listed) = send(&app, Method::GET, "/api/v1/products?category=maleWear&sort=price-low", None, None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (status, _) = send(&app, Method::GET, "/api/v1/products?category=hats", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/admin/products/{id}"), Some("admin"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/v1/products/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_and_checkout_flow() {
    let app = app();
    let (_, tee) = create_product(&app, "admin", "Tee", "1000").await;
    let (_, cap) = create_product(&app, "admin", "Cap", "250").await;

    let add = |product: &Value, size: &str, quantity: i64| json!({"productId": product["id"], "size": size, "quantity": quantity});
    let (status, line) = send(&app, Method::POST, "/api/v1/cart", Some("u1"), Some(add(&tee, "M", 1))).await;
    assert_eq!(status, StatusCode::CREATED);
    send(&app, Method::POST, "/api/v1/cart", Some("u1"), Some(add(&tee, "M", 1))).await;
    send(&app, Method::POST, "/api/v1/cart", Some("u1"), Some(add(&cap, "S", 1))).await;

    let line_uri = format!("/api/v1/cart/{}", line["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::PUT, &line_uri, Some("u1"), Some(json!({"quantity": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, cart) = send(&app, Method::GET, "/api/v1/cart", Some("u1"), None).await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 2);
    assert_eq!(cart["subtotalDisplay"], "₱2250.00");

    let (status, _) = send(&app, Method::POST, "/api/v1/checkout/address", Some("u1"), Some(json!({
        "fullName": "", "address": "1 Rizal St", "city": "Manila", "zipCode": "1000", "phoneNumber": "09171234567"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, order) = send(&app, Method::POST, "/api/v1/checkout/address", Some("u1"), Some(json!({
        "fullName": "Juan Dela Cruz", "address": "1 Rizal St", "city": "Manila", "zipCode": "1000", "phoneNumber": "09171234567"
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");
    let order_id = order["id"].as_str().unwrap().to_string();

    let pay_uri = format!("/api/v1/checkout/{order_id}/payment");
    let (status, _) = send(&app, Method::POST, &pay_uri, Some("u1"), Some(json!({"method": "paypal"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let ship_uri = format!("/api/v1/checkout/{order_id}/shipping");
    let (status, _) = send(&app, Method::POST, &ship_uri, Some("u1"), Some(json!({"method": "jnt"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::POST, &pay_uri, Some("u1"), Some(json!({"method": "card", "card": {
        "name": "Juan", "cardNumber": "1234", "expiryMonth": "12", "expiryYear": "2030", "cvc": "123"
    }}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, paid) = send(&app, Method::POST, &pay_uri, Some("u1"), Some(json!({"method": "card", "card": {
        "name": "Juan", "cardNumber": "4111111111111111", "expiryMonth": "12", "expiryYear": "2030", "cvc": "123"
    }}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["payment"]["card"]["last4"], "1111");

    let (_, cart) = send(&app, Method::GET, "/api/v1/cart", Some("u1"), None).await;
    assert!(cart["lines"].as_array().unwrap().is_empty());

    let (_, orders) = send(&app, Method::GET, "/api/v1/orders", Some("u1"), None).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    let (status, _) = send(&app, Method::GET, &format!("/api/v1/orders/{order_id}"), Some("u2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::POST, &format!("/api/v1/orders/{order_id}/cancel"), Some("u1"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cash_on_delivery_collection() {
    let app = app();
    let (_, tee) = create_product(&app, "admin", "Tee", "250").await;
    send(&app, Method::POST, "/api/v1/cart", Some("u1"), Some(json!({"productId": tee["id"], "size": "L"}))).await;
    let (_, order) = send(&app, Method::POST, "/api/v1/checkout/address", Some("u1"), Some(json!({
        "fullName": "Juan Dela Cruz", "address": "1 Rizal St", "city": "Manila", "zipCode": "1000", "phoneNumber": "09171234567"
    }))).await;
    let order_id = order["id"].as_str().unwrap().to_string();
    send(&app, Method::POST, &format!("/api/v1/checkout/{order_id}/shipping"), Some("u1"), Some(json!({"method": "ninja"}))).await;
    let (_, cod) = send(&app, Method::POST, &format!("/api/v1/checkout/{order_id}/payment"), Some("u1"), Some(json!({"method": "cod"}))).await;
    assert_eq!(cod["status"], "awaiting_payment");
    assert_eq!(cod["total"]["amount"], "295");

    let collect = format!("/api/v1/admin/orders/u1/{order_id}/collect");
    let (status, _) = send(&app, Method::POST, &collect, Some("u1"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, collected) = send(&app, Method::POST, &collect, Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(collected["status"], "paid");
}
