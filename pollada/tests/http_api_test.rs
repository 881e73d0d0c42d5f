//! HTTP API tests.
//!
//! Drives the full router with `tower::ServiceExt::oneshot` over the
//! in-memory store: status codes, error bodies, staff authentication and the
//! counter's colored outcomes.
//!
//! Run with: `cargo test --test http_api_test`

#![allow(clippy::expect_used, clippy::unwrap_used)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use pollada::{AppState, StaticTokenAuthenticator, TicketOffice, build_router};
use pollada_core::TicketStore;
use pollada_core::types::InventoryItem;
use pollada_testing::{InMemoryTicketStore, RecordingImageEncoder, SequenceCodeGenerator, fixtures, test_clock};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const STAFF_TOKEN: &str = "s3cret";

struct TestApp {
    router: Router,
    state: AppState<InMemoryTicketStore>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_codes(SequenceCodeGenerator::new())
    }

    fn with_codes(codes: SequenceCodeGenerator) -> Self {
        let office = TicketOffice::new(
            InMemoryTicketStore::new(),
            Arc::new(test_clock()),
            Arc::new(codes),
            Arc::new(RecordingImageEncoder::new()),
        )
        .with_public_base_url("https://pollada.example");
        let staff = Arc::new(StaticTokenAuthenticator::new([("ana", STAFF_TOKEN)]));
        let state = AppState::new(office, staff);

        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    fn store(&self) -> &InMemoryTicketStore {
        self.state.office.store()
    }

    async fn item(&self, name: &str, remaining: u32) -> InventoryItem {
        self.store()
            .create_item(&fixtures::item(name, remaining, 2000))
            .await
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: &Value) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let (status, _, body) = self
            .send(request.body(Body::from(body.to_string())).unwrap())
            .await;
        (status, body)
    }

    async fn staff_get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {STAFF_TOKEN}"))
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    async fn register(&self, name: &str, phone: &str) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/customers",
                None,
                &json!({ "name": name, "phone": phone, "delivery_mode": "pickup" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn issue(&self, customer_id: &str, item: &InventoryItem) -> (StatusCode, Value) {
        self.json(
            Method::POST,
            &format!("/api/customers/{customer_id}/tickets"),
            None,
            &json!({ "item_id": item.id }),
        )
        .await
    }

    async fn redeem(&self, code: &str) -> (StatusCode, Value) {
        self.json(Method::POST, "/api/redeem", Some(STAFF_TOKEN), &json!({ "code": code }))
            .await
    }

    async fn mark_paid(&self, codes: &[&str]) -> (StatusCode, Value) {
        self.json(
            Method::POST,
            "/api/admin/tickets/mark-paid",
            Some(STAFF_TOKEN),
            &json!({ "codes": codes }),
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// Probes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_and_readiness() {
    let app = TestApp::new();

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], true);

    app.store().set_unavailable(true);
    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::new();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (_, headers, _) = app.send(request).await;
    assert!(headers.contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = app.send(request).await;
    assert_eq!(headers["x-request-id"], "req-42");
}

// ---------------------------------------------------------------------------
// Customer flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registration_validates_phone() {
    let app = TestApp::new();

    let (status, body) = app
        .json(
            Method::POST,
            "/api/customers",
            None,
            &json!({ "name": "Ana", "phone": "12345", "delivery_mode": "pickup" }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field"], "phone");
}

#[tokio::test]
async fn registration_accepts_legacy_pickup_value() {
    let app = TestApp::new();

    let (status, body) = app
        .json(
            Method::POST,
            "/api/customers",
            None,
            &json!({ "name": "ana torres", "phone": "912345678", "delivery_mode": "recojo" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "ANA TORRES");
    assert_eq!(body["delivery_mode"], "pickup");
}

#[tokio::test]
async fn issuance_and_sold_out() {
    let app = TestApp::with_codes(SequenceCodeGenerator::with_codes(["ABCD1234"]));
    let item = app.item("Pierna", 1).await;
    let customer = app.register("Ana", "912345678").await;

    let (status, body) = app.get("/api/items/available").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app.issue(&customer, &item).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["code"], "ABCD1234");
    assert_eq!(body["paid"], false);

    let (status, body) = app.issue(&customer, &item).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "OUT_OF_STOCK");
    assert_eq!(body["message"], "Pierna is sold out, please select another item.");

    let (_, body) = app.get("/api/items/available").await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn issuing_for_unknown_customer_is_not_found() {
    let app = TestApp::new();
    let item = app.item("Pierna", 1).await;

    let (status, body) = app
        .issue("550e8400-e29b-41d4-a716-446655440000", &item)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "CUSTOMER_NOT_FOUND");
}

#[tokio::test]
async fn malformed_path_ids_get_json_errors() {
    let app = TestApp::new();
    let item = app.item("Pierna", 1).await;

    let (status, body) = app.issue("not-a-uuid", &item).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field"], "customer_id");

    let (status, body) = app
        .json(
            Method::PUT,
            "/api/admin/items/42/stock",
            Some(STAFF_TOKEN),
            &json!({ "remaining": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "item_id");
    assert_eq!(app.store().get_item(item.id).await.unwrap().remaining, 1);
}

#[tokio::test]
async fn ticket_display_and_card() {
    let app = TestApp::with_codes(SequenceCodeGenerator::with_codes(["ABCD1234"]));
    let item = app.item("Pierna", 1).await;
    let customer = app.register("Ana", "912345678").await;
    app.issue(&customer, &item).await;

    let (status, body) = app.get("/api/tickets/abcd1234").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["name"], "Pierna");

    let (status, body) = app.get("/api/tickets/ABCD1234/card").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redemption_url"], "https://pollada.example/api/redeem?code=ABCD1234");
    assert_eq!(body["image"]["media_type"], "image/png");

    let (status, body) = app.get("/api/tickets/ZZZZ0000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TICKET_NOT_FOUND");
}

#[tokio::test]
async fn search_by_name_or_phone() {
    let app = TestApp::new();
    let item = app.item("Pierna", 5).await;
    let ana = app.register("Ana Torres", "912345678").await;
    let luis = app.register("Luis Quispe", "987654321").await;
    app.issue(&ana, &item).await;
    app.issue(&luis, &item).await;

    let (status, body) = app.get("/api/tickets/search?q=torres").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "torres");
    let tickets = body["tickets"].as_array().unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0]["customer"]["name"], "ANA TORRES");

    let (_, body) = app.get("/api/tickets/search?q=98765").await;
    assert_eq!(body["tickets"].as_array().unwrap().len(), 1);

    let (status, body) = app.get("/api/tickets/search").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["tickets"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Counter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn redemption_requires_staff_token() {
    let app = TestApp::new();

    let (status, body) = app
        .json(Method::POST, "/api/redeem", None, &json!({ "code": "ABCD1234" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .json(Method::POST, "/api/redeem", Some("wrong"), &json!({ "code": "ABCD1234" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn redemption_outcomes_are_distinct() {
    let app = TestApp::with_codes(SequenceCodeGenerator::with_codes(["T1T1T1T1"]));
    let item = app.item("Pierna", 1).await;
    let customer = app.register("Ana", "912345678").await;
    app.issue(&customer, &item).await;

    let (status, body) = app.redeem("t1t1t1t1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["outcome"], "not_paid");
    assert_eq!(body["color"], "red");
    assert_eq!(body["message"], "This ticket has not been paid.");
    assert_eq!(body["ticket"]["redeemed"], false);

    let (status, body) = app.mark_paid(&["t1t1t1t1", "MISSING1"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let (status, body) = app.redeem("T1T1T1T1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "redeemed");
    assert_eq!(body["color"], "green");
    assert_eq!(body["message"], "Ticket redeemed: Pierna.");
    assert_eq!(body["ticket"]["redeemed"], true);

    let (status, body) = app.redeem("T1T1T1T1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["outcome"], "already_redeemed");
    assert_eq!(body["color"], "red");
    assert_eq!(body["message"], "This ticket has already been redeemed.");

    let (status, body) = app.redeem("NOPE0000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["outcome"], "not_found");
    assert_eq!(body["message"], "Invalid ticket code.");
    assert!(body.get("ticket").is_none());
}

#[tokio::test]
async fn redemption_reads_code_from_query() {
    let app = TestApp::with_codes(SequenceCodeGenerator::with_codes(["SCAN0001"]));
    let item = app.item("Pierna", 1).await;
    let customer = app.register("Ana", "912345678").await;
    app.issue(&customer, &item).await;
    app.mark_paid(&["SCAN0001"]).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/redeem?code=scan0001")
        .header(header::AUTHORIZATION, format!("Bearer {STAFF_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "redeemed");
}

#[tokio::test]
async fn scanned_card_url_redeems_at_the_counter() {
    let app = TestApp::with_codes(SequenceCodeGenerator::with_codes(["QRQR0001"]));
    let item = app.item("Pierna", 1).await;
    let customer = app.register("Ana", "912345678").await;
    app.issue(&customer, &item).await;
    app.mark_paid(&["QRQR0001"]).await;

    let (status, card) = app.get("/api/tickets/QRQR0001/card").await;
    assert_eq!(status, StatusCode::OK);
    let url = card["redemption_url"].as_str().unwrap();
    let path = url.strip_prefix("https://pollada.example").unwrap();

    let (status, body) = app.get(path).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = app.staff_get(path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "redeemed");
    assert_eq!(body["ticket"]["code"], "QRQR0001");

    let (status, body) = app.staff_get(path).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["outcome"], "already_redeemed");
}

#[tokio::test]
async fn redemption_without_code_is_rejected() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/redeem")
        .header(header::AUTHORIZATION, format!("Bearer {STAFF_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = app.send(request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "code");
}

// ---------------------------------------------------------------------------
// Administration and reports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_routes_require_staff() {
    let app = TestApp::new();

    let (status, _) = app.get("/api/admin/items").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .json(Method::POST, "/api/admin/tickets/mark-paid", None, &json!({ "codes": [] }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_manages_items() {
    let app = TestApp::new();

    let (status, body) = app
        .json(
            Method::POST,
            "/api/admin/items",
            Some(STAFF_TOKEN),
            &json!({ "name": "Pecho", "remaining": 0, "price": "25.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["price"], 2500);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .json(
            Method::POST,
            "/api/admin/items",
            Some(STAFF_TOKEN),
            &json!({ "name": "Ala", "remaining": 1, "price": "1.234" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "price");

    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/api/admin/items/{id}/stock"),
            Some(STAFF_TOKEN),
            &json!({ "remaining": 7 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remaining"], 7);

    let (status, body) = app.staff_get("/api/admin/items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app
        .json(
            Method::PUT,
            "/api/admin/items/550e8400-e29b-41d4-a716-446655440000/stock",
            Some(STAFF_TOKEN),
            &json!({ "remaining": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ITEM_NOT_FOUND");
}

#[tokio::test]
async fn admin_ticket_list_filters() {
    let app = TestApp::with_codes(SequenceCodeGenerator::with_codes(["AAAA0001", "BBBB0002"]));
    let item = app.item("Pierna", 2).await;
    let customer = app.register("Ana", "912345678").await;
    app.issue(&customer, &item).await;
    app.issue(&customer, &item).await;
    app.mark_paid(&["AAAA0001"]).await;

    let (status, body) = app.staff_get("/api/admin/tickets?paid=false").await;
    assert_eq!(status, StatusCode::OK);
    let tickets = body.as_array().unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0]["code"], "BBBB0002");

    let (_, body) = app.staff_get("/api/admin/tickets?q=aaaa").await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = app.staff_get("/api/admin/tickets").await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn report_endpoint() {
    let app = TestApp::with_codes(SequenceCodeGenerator::with_codes(["AAAA0001", "BBBB0002"]));
    let item = app.item("Pierna", 5).await;
    let customer = app.register("Ana", "912345678").await;
    app.issue(&customer, &item).await;
    app.issue(&customer, &item).await;
    app.mark_paid(&["AAAA0001"]).await;

    let (status, body) = app.get("/api/reports").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totals"]["revenue"], 2000);
    assert_eq!(body["totals"]["pending"], 2000);
    assert_eq!(body["totals"]["paid_tickets"], 1);
    assert_eq!(body["sales_by_item"][0]["sold"], 2);
    assert_eq!(body["unpaid_tickets"][0]["code"], "BBBB0002");
}

#[tokio::test]
async fn storage_outage_is_service_unavailable() {
    let app = TestApp::new();
    app.store().set_unavailable(true);

    let (status, body) = app.get("/api/reports").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Something went wrong, please try again.");
}
