use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use invsync_core::{AppConfig, Environment, LinkField};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCTS_PATH: &str = "/admin/api/2024-04/products.json";

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_unknown_code_maps_to_internal_error() {
    let response = ApiError::new("req-1", "internal_error", "boom").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn db_errors_map_to_domain_statuses() {
    let not_found = map_db_error("req-1".to_owned(), &invsync_db::DbError::NotFound);
    assert_eq!(not_found.error.code, "not_found");
    assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

    let linked = map_db_error(
        "req-2".to_owned(),
        &invsync_db::DbError::AlreadyLinked {
            internal_id: 7,
            existing: "55".to_owned(),
        },
    );
    assert_eq!(linked.error.code, "link_conflict");
    assert!(linked.error.message.contains("55"));
    assert_eq!(linked.into_response().status(), StatusCode::CONFLICT);

    let transition = map_db_error(
        "req-3".to_owned(),
        &invsync_db::DbError::InvalidSyncRunTransition {
            id: 1,
            expected_status: "running",
        },
    );
    assert_eq!(transition.into_response().status(), StatusCode::CONFLICT);

    let pool = map_db_error(
        "req-4".to_owned(),
        &invsync_db::DbError::Sqlx(sqlx::Error::PoolTimedOut),
    );
    assert_eq!(pool.error.message, "database query failed");
    assert_eq!(pool.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// -------------------------------------------------------------------------
// Route integration tests (with DB and a mock storefront)
// -------------------------------------------------------------------------

fn test_config(shopify_base_url: &str) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_owned(),
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("bind addr"),
        log_level: "info".to_owned(),
        db_max_connections: 5,
        db_min_connections: 1,
        db_acquire_timeout_secs: 5,
        shopify_shop_name: "acme-parts".to_owned(),
        shopify_access_token: "shpat_test".to_owned(),
        shopify_api_version: "2024-04".to_owned(),
        shopify_base_url: Some(shopify_base_url.to_owned()),
        request_timeout_secs: 5,
        max_retries: 0,
        retry_backoff_base_ms: 0,
        page_size: 10,
        link_field: LinkField::default(),
        link_write_attempts: 1,
        max_concurrent_items: 1,
    }
}

fn test_app(pool: sqlx::PgPool, server: &MockServer, auth: AuthState) -> Router {
    let reconciler = invsync_sync::build_reconciler(&test_config(&server.uri()), pool.clone())
        .expect("reconciler");
    build_app(
        AppState {
            pool,
            reconciler: Arc::new(reconciler),
        },
        auth,
        default_rate_limit_state(),
    )
}

fn open_auth() -> AuthState {
    AuthState::from_keys("", true).expect("auth")
}

async fn seed_item(pool: &sqlx::PgPool, internal_id: i64, link: Option<&str>) {
    sqlx::query(
        "INSERT INTO inventory_items \
         (internal_id, item_kind, item_code, display_name, quantity_available, average_cost, \
          shopify_product_id) \
         VALUES ($1, 'inventory_part', $2, $3, '12', '4.50', $4)",
    )
    .bind(internal_id)
    .bind(format!("PART-{internal_id}"))
    .bind(format!("Part {internal_id}"))
    .bind(link)
    .execute(pool)
    .await
    .expect("seed item");
}

async fn stored_link(pool: &sqlx::PgPool, internal_id: i64) -> Option<String> {
    sqlx::query_scalar("SELECT shopify_product_id FROM inventory_items WHERE internal_id = $1")
        .bind(internal_id)
        .fetch_one(pool)
        .await
        .expect("select link")
}

fn trigger_request(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/triggers")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_returns_ok(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let app = test_app(pool, &server, open_auth());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json = json_body(response).await;
    assert_eq!(json["data"]["database"], "ok");
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["open_reconciliation_notes"], 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_flags_open_reconciliation_notes(pool: sqlx::PgPool) {
    invsync_db::insert_reconciliation_note(&pool, 3, "8080", "link write failed")
        .await
        .expect("insert note");
    let server = MockServer::start().await;
    let app = test_app(pool, &server, open_auth());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "needs_review");
    assert_eq!(json["data"]["open_reconciliation_notes"], 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn edit_trigger_creates_links_and_records_run(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"product": {"id": 4242}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/admin/api/2024-04/products/777.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"product": {"id": 777}})))
        .expect(1)
        .mount(&server)
        .await;

    seed_item(&pool, 1, None).await;
    seed_item(&pool, 2, Some("777")).await;
    let app = test_app(pool.clone(), &server, open_auth());

    let response = app
        .oneshot(trigger_request(
            &json!({"record_id": 1, "event_kind": "edit"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "completed");
    assert_eq!(
        json["data"]["message"],
        "Successfully Updated or Created Products in Shopify."
    );
    assert_eq!(json["data"]["items_created"], 1);
    assert_eq!(json["data"]["items_updated"], 1);
    assert_eq!(stored_link(&pool, 1).await.as_deref(), Some("4242"));
    assert_eq!(stored_link(&pool, 2).await.as_deref(), Some("777"));

    let run_id: uuid::Uuid = json["data"]["run_id"]
        .as_str()
        .expect("run id")
        .parse()
        .expect("uuid");
    let run = invsync_db::get_sync_run(&pool, run_id)
        .await
        .expect("get run")
        .expect("run exists");
    assert_eq!(run.status, "succeeded");
    assert_eq!(run.items_seen, 2);
    assert_eq!(run.trigger_source, "api");
}

#[sqlx::test(migrations = "../../migrations")]
async fn failed_create_is_reported_with_200(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    seed_item(&pool, 5, None).await;
    let app = test_app(pool.clone(), &server, open_auth());

    let response = app
        .oneshot(trigger_request(
            &json!({"record_id": 5, "event_kind": "create"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "partial");
    assert_eq!(json["data"]["items_failed"], 1);
    assert_eq!(json["data"]["failures"][0]["internal_id"], 5);
    assert_eq!(json["data"]["failures"][0]["kind"], "transport");
    assert_eq!(stored_link(&pool, 5).await, None);
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_trigger_is_skipped_without_calls(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    seed_item(&pool, 1, None).await;
    let app = test_app(pool.clone(), &server, open_auth());

    let response = app
        .oneshot(trigger_request(
            &json!({"record_id": 1, "event_kind": "delete"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "skipped");
    assert!(json["data"]["run_id"].is_null());
    assert!(invsync_db::list_sync_runs(&pool, 10)
        .await
        .expect("runs")
        .is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_event_kind_is_rejected(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let app = test_app(pool, &server, open_auth());

    let response = app
        .oneshot(trigger_request(
            &json!({"record_id": 1, "event_kind": "archive"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[sqlx::test(migrations = "../../migrations")]
async fn trigger_requires_bearer_when_keys_configured(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let auth = AuthState::from_keys("secret-key", false).expect("auth");
    let app = test_app(pool, &server, auth);

    let response = app
        .clone()
        .oneshot(trigger_request(
            &json!({"record_id": 1, "event_kind": "edit"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let health = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(health.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_sync_run_returns_404(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    let app = test_app(pool, &server, open_auth());

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/sync-runs/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../migrations")]
async fn reconciliation_notes_are_listed(pool: sqlx::PgPool) {
    seed_item(&pool, 9, None).await;
    invsync_db::insert_reconciliation_note(&pool, 9, "31337", "link write timed out")
        .await
        .expect("insert note");
    let server = MockServer::start().await;
    let app = test_app(pool, &server, open_auth());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/reconciliation-notes")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let data = json["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["internal_id"], 9);
    assert_eq!(data[0]["remote_product_id"], "31337");
}
