use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use clinic_api::app::{build_app, services::AppServices};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory backend, ephemeral port.
        let app = build_app(Arc::new(AppServices::in_memory()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn post_json(client: &reqwest::Client, url: String, body: Value) -> (StatusCode, Value) {
    let res = client.post(url).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn get_json(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let res = client.get(url).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn register_medication(client: &reqwest::Client, srv: &TestServer, stock: i64) -> String {
    let (status, body) = post_json(
        client,
        srv.url("/medications"),
        json!({
            "name": "Ibuprofen 200mg",
            "sku": "IBU-200",
            "minimum_stock": 20,
            "reorder_point": 50,
            "reorder_quantity": 200,
            "initial_stock": stock,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn register_patient(client: &reqwest::Client, srv: &TestServer) -> String {
    let (status, body) = post_json(
        client,
        srv.url("/patients"),
        json!({
            "name": "Hong Gildong",
            "resident_registration_number": "900101-1234567",
            "address": "Seoul",
            "contact": "010-1234-5678",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn notices_eventually(client: &reqwest::Client, srv: &TestServer, expected: usize) -> Value {
    // Notices reach the feed through the event bus listener thread.
    for _ in 0..50 {
        let (_, body) = get_json(client, srv.url("/notifications")).await;
        if body["count"].as_u64() == Some(expected as u64) {
            return body;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("expected {expected} reorder notices in the feed");
}

#[tokio::test]
async fn health_reports_backend() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, srv.url("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn prescription_below_reorder_point_raises_one_accumulating_order() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let med = register_medication(&client, &srv, 60).await;

    // 60 -> 45: below the reorder point of 50.
    let (status, first) = post_json(
        &client,
        srv.url("/prescriptions"),
        json!({ "medication_id": med, "quantity": 15 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["after_stock"], 45);
    let po = first["purchase_order_id"].as_str().unwrap().to_string();

    // 45 -> 40: tops up the same pending order.
    let (_, second) = post_json(
        &client,
        srv.url("/prescriptions"),
        json!({ "medication_id": med, "quantity": 5 }),
    )
    .await;
    assert_eq!(second["purchase_order_id"].as_str().unwrap(), po);

    let (_, orders) = get_json(&client, srv.url(&format!("/purchase-orders?medication_id={med}"))).await;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["quantity"], 400);
    assert_eq!(orders[0]["status"], "Pending");

    let feed = notices_eventually(&client, &srv, 2).await;
    assert_eq!(feed["notices"][0]["after_stock"], 40);
    assert_eq!(feed["notices"][0]["sku"], "IBU-200");

    let (_, check) = get_json(&client, srv.url(&format!("/medications/{med}/thresholds"))).await;
    assert_eq!(check["below_reorder_point"], true);
    assert_eq!(check["at_or_below_minimum"], false);
}

#[tokio::test]
async fn prescription_rejections_map_to_status_codes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let med = register_medication(&client, &srv, 10).await;

    let (status, body) = post_json(
        &client,
        srv.url("/prescriptions"),
        json!({ "medication_id": med, "quantity": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_quantity");

    let (status, body) = post_json(
        &client,
        srv.url("/prescriptions"),
        json!({ "medication_id": med, "quantity": 11 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_stock");

    let (_, stock) = get_json(&client, srv.url(&format!("/medications/{med}/stock"))).await;
    assert_eq!(stock["quantity"], 10);
}

#[tokio::test]
async fn oversized_restock_is_refused_and_server_keeps_serving() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let med = register_medication(&client, &srv, 10).await;

    let (status, body) = post_json(
        &client,
        srv.url(&format!("/medications/{med}/restock")),
        json!({ "quantity": i64::MAX }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "invalid_quantity");

    let (status, stock) = get_json(&client, srv.url(&format!("/medications/{med}/stock"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock["quantity"], 10);

    let (status, _) = get_json(&client, srv.url("/medications")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(
        &client,
        srv.url("/medications/0190a8f1-7c2e-7d3a-9b7f-0a1b2c3d4e5f"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = get_json(&client, srv.url("/appointments/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn receiving_a_purchase_order_adds_stock_once() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let med = register_medication(&client, &srv, 55).await;

    let (_, receipt) = post_json(
        &client,
        srv.url("/prescriptions"),
        json!({ "medication_id": med, "quantity": 10 }),
    )
    .await;
    let po = receipt["purchase_order_id"].as_str().unwrap().to_string();

    let (status, ordered) = post_json(
        &client,
        srv.url(&format!("/purchase-orders/{po}/status")),
        json!({ "status": "ordered" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{ordered}");
    assert_eq!(ordered["status"], "Ordered");

    let (status, received) = post_json(&client, srv.url(&format!("/purchase-orders/{po}/receive")), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{received}");
    assert_eq!(received["stock_after"], 245);
    assert_eq!(received["order"]["status"], "Received");

    let (status, again) = post_json(&client, srv.url(&format!("/purchase-orders/{po}/receive")), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT, "{again}");

    let (_, stock) = get_json(&client, srv.url(&format!("/medications/{med}/stock"))).await;
    assert_eq!(stock["quantity"], 245);
}

#[tokio::test]
async fn booking_a_taken_slot_conflicts_until_cancelled() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let patient = register_patient(&client, &srv).await;

    let booking = json!({
        "patient_id": patient,
        "doctor_name": "Dr. Kim",
        "date": "2026-03-02",
        "slot": "10:00",
        "reason": "checkup",
    });

    let (status, first) = post_json(&client, srv.url("/appointments"), booking.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    let appointment = first["id"].as_str().unwrap().to_string();

    // Doctor names match case-insensitively.
    let mut shouted = booking.clone();
    shouted["doctor_name"] = json!("DR. KIM");
    let (status, body) = post_json(&client, srv.url("/appointments"), shouted).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "slot_taken");

    let (_, slots) = get_json(&client, srv.url("/doctors/Dr.%20Kim/slots?date=2026-03-02")).await;
    let slots = slots["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 15);
    assert!(!slots.iter().any(|s| s == "10:00"));

    let (_, availability) = get_json(
        &client,
        srv.url("/doctors/Dr.%20Kim/availability?at=2026-03-02%2010:00"),
    )
    .await;
    assert_eq!(availability["available"], false);

    let (status, cancelled) = post_json(
        &client,
        srv.url(&format!("/appointments/{appointment}/cancel")),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "Cancelled");

    let (status, _) = post_json(&client, srv.url("/appointments"), booking).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn booking_requires_a_known_patient() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        srv.url("/appointments"),
        json!({
            "patient_id": "0190a8f1-7c2e-7d3a-9b7f-0a1b2c3d4e5f",
            "doctor_name": "Dr. Lee",
            "date_time": "2026-03-02 14:30",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown_patient");
}

#[tokio::test]
async fn patient_list_masks_registration_numbers() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let patient = register_patient(&client, &srv).await;

    let (_, list) = get_json(&client, srv.url("/patients")).await;
    assert_eq!(list[0]["resident_registration_number"], "900101-*******");

    let (status, detail) = get_json(&client, srv.url(&format!("/patients/{patient}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["resident_registration_number"], "900101-1234567");
}
