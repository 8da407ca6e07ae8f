//! Integration tests for `ShopifyAdminClient` create/update calls.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made.

use invsync_core::{map_item, ExternalProductPayload, ItemRecord, SourceNumber};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use invsync_shopify::{CatalogError, ShopifyAdminClient};

const PRODUCTS_PATH: &str = "/admin/api/2024-04/products.json";

/// Builds a client against the mock server: 5-second timeout, no retries.
fn test_client(server: &MockServer) -> ShopifyAdminClient {
    ShopifyAdminClient::new(&server.uri(), "2024-04", "shpat_test", 5, 0, 0)
        .expect("failed to build test client")
}

fn test_client_with_retries(server: &MockServer, max_retries: u32) -> ShopifyAdminClient {
    ShopifyAdminClient::new(&server.uri(), "2024-04", "shpat_test", 5, max_retries, 0)
        .expect("failed to build test client")
}

fn payload() -> ExternalProductPayload {
    map_item(&ItemRecord {
        internal_id: 1001,
        item_code: "BOLT-M8".to_owned(),
        display_name: "M8 Bolt".to_owned(),
        sales_description: Some("Zinc plated".to_owned()),
        quantity_available: SourceNumber::parse(Some("40")),
        average_cost: SourceNumber::parse(Some("0.35")),
        external_product_id: None,
    })
}

fn expected_body() -> serde_json::Value {
    json!({
        "product": {
            "title": "1001 - M8 Bolt",
            "body_html": "Zinc plated",
            "variants": [{ "price": "0.35", "inventory_quantity": 40 }]
        }
    })
}

// ---------------------------------------------------------------------------
// create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_posts_envelope_with_credentials_and_returns_new_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .and(header("x-shopify-access-token", "shpat_test"))
        .and(header("content-type", "application/json"))
        .and(body_json(expected_body()))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"product": {"id": 8_123_456_789_012_i64, "title": "1001 - M8 Bolt"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = test_client(&server)
        .create_product(&payload())
        .await
        .expect("create should succeed");

    assert_eq!(created.remote_id, "8123456789012");
    assert!(created.raw_body.contains("8123456789012"));
}

#[tokio::test]
async fn create_with_malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .create_product(&payload())
        .await
        .expect_err("malformed body must fail");

    assert!(
        matches!(err, CatalogError::Deserialize { .. }),
        "expected Deserialize, got: {err:?}"
    );
    assert!(err.is_response_shape());
}

#[tokio::test]
async fn create_without_product_id_is_a_missing_id_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"product": {"title": "x"}})))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .create_product(&payload())
        .await
        .expect_err("missing id must fail");

    assert!(
        matches!(err, CatalogError::MissingProductId { .. }),
        "expected MissingProductId, got: {err:?}"
    );
}

#[tokio::test]
async fn create_unprocessable_entity_surfaces_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"errors": {"title": ["can't be blank"]}})),
        )
        .mount(&server)
        .await;

    let err = test_client(&server)
        .create_product(&payload())
        .await
        .expect_err("422 must fail");

    match err {
        CatalogError::UnexpectedStatus { status, body, .. } => {
            assert_eq!(status, 422);
            assert!(body.contains("can't be blank"));
        }
        other => panic!("expected UnexpectedStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn create_is_not_retried_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client_with_retries(&server, 3)
        .create_product(&payload())
        .await
        .expect_err("503 must fail");

    assert!(matches!(
        err,
        CatalogError::UnexpectedStatus { status: 503, .. }
    ));
}

#[tokio::test]
async fn create_is_retried_after_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"product": {"id": 5}})))
        .expect(1)
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let created = test_client_with_retries(&server, 2)
        .create_product(&payload())
        .await
        .expect("should succeed after one 429");

    assert_eq!(created.remote_id, "5");
    assert!(
        started.elapsed() >= std::time::Duration::from_secs(1),
        "retry must wait out Retry-After"
    );
}

#[tokio::test]
async fn rate_limit_reports_retry_after_when_retries_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .create_product(&payload())
        .await
        .expect_err("429 must fail");

    match err {
        CatalogError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 30),
        other => panic!("expected RateLimited, got: {other:?}"),
    }
}

#[tokio::test]
async fn invalid_token_maps_to_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .create_product(&payload())
        .await
        .expect_err("401 must fail");

    assert!(matches!(err, CatalogError::Unauthorized { status: 401 }));
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_puts_envelope_to_addressed_resource() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/admin/api/2024-04/products/632910392.json"))
        .and(header("x-shopify-access-token", "shpat_test"))
        .and(body_json(expected_body()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"product": {"id": 632_910_392}})))
        .expect(1)
        .mount(&server)
        .await;

    let updated = test_client(&server)
        .update_product("632910392", &payload())
        .await
        .expect("update should succeed");

    assert_eq!(updated.remote_id, "632910392");
    assert!(updated.raw_body.contains("632910392"));
}

#[tokio::test]
async fn update_is_retried_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/admin/api/2024-04/products/7.json"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/admin/api/2024-04/products/7.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"product": {"id": 7}})))
        .expect(1)
        .mount(&server)
        .await;

    test_client_with_retries(&server, 1)
        .update_product("7", &payload())
        .await
        .expect("update should succeed after one 502");
}

#[tokio::test]
async fn update_of_deleted_product_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/admin/api/2024-04/products/99.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .update_product("99", &payload())
        .await
        .expect_err("404 must fail");

    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[tokio::test]
async fn update_with_non_numeric_id_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .update_product("../orders", &payload())
        .await
        .expect_err("invalid id must fail");

    assert!(matches!(err, CatalogError::InvalidProductId(_)));
}
