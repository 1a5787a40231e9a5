use actix_web::http::{Method, StatusCode};
use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use waypoints_common::{Result, WaypointError};
use waypoints_embedding::{Embedder, EMBEDDING_DIM};
use waypoints_server::{routes, AppState, Cors, SiteToken, SITE_TOKEN_HEADER};
use waypoints_store::{WaypointRow, WaypointStore};

const TOKEN: &str = "trail-secret";
const ALLOWED_ORIGIN: &str = "https://maps.example.com";

enum EmbedOutcome {
    Vector(usize),
    Unreachable,
    Status(u16),
}

struct StubEmbedder {
    outcome: EmbedOutcome,
    calls: AtomicUsize,
}

impl StubEmbedder {
    fn new(outcome: EmbedOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            EmbedOutcome::Vector(len) => Ok(vec![0.1; len]),
            EmbedOutcome::Unreachable => {
                Err(WaypointError::embedding_unreachable("connection refused"))
            }
            EmbedOutcome::Status(code) => Err(WaypointError::EmbeddingStatus(code)),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

struct StubStore {
    rows: Vec<WaypointRow>,
    fail: bool,
    nearest_calls: AtomicUsize,
}

impl StubStore {
    fn with_rows(rows: Vec<WaypointRow>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            fail: false,
            nearest_calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            rows: Vec::new(),
            fail: true,
            nearest_calls: AtomicUsize::new(0),
        })
    }

    fn nearest_calls(&self) -> usize {
        self.nearest_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WaypointStore for StubStore {
    async fn count(&self) -> Result<i64> {
        if self.fail {
            return Err(WaypointError::database("connection reset"));
        }
        Ok(42)
    }

    async fn nearest(&self, embedding: &[f32], limit: i64) -> Result<Vec<WaypointRow>> {
        self.nearest_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(embedding.len(), EMBEDDING_DIM);
        if self.fail {
            return Err(WaypointError::database("relation \"waypoints\" does not exist"));
        }
        Ok(self.rows.iter().take(limit as usize).cloned().collect())
    }
}

macro_rules! init_app {
    ($embedder:expr, $store:expr, $origins:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new($embedder.clone(), $store.clone())))
                .wrap(SiteToken::new(TOKEN))
                .wrap(Cors::new($origins))
                .configure(routes::configure),
        )
        .await
    };
    ($embedder:expr, $store:expr) => {
        init_app!($embedder, $store, Vec::<String>::new())
    };
}

fn authed(uri: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .insert_header((SITE_TOKEN_HEADER, TOKEN))
}

#[actix_web::test]
async fn test_health_needs_no_token() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(Vec::new());
    let app = init_app!(embedder, store);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"status": "ok"}));
}

#[actix_web::test]
async fn test_protected_routes_reject_missing_or_wrong_token() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(Vec::new());
    let app = init_app!(embedder, store);

    for uri in ["/waypoints/count", "/waypoints/search?q=lighthouse"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "invalid or missing site token"}));

        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header((SITE_TOKEN_HEADER, "guess"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }

    assert_eq!(embedder.calls(), 0);
}

#[actix_web::test]
async fn test_count() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(Vec::new());
    let app = init_app!(embedder, store);

    let resp = test::call_service(&app, authed("/waypoints/count").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"count": 42}));
}

#[actix_web::test]
async fn test_count_store_failure() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::failing();
    let app = init_app!(embedder, store);

    let resp = test::call_service(&app, authed("/waypoints/count").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "database query failed"}));
}

#[actix_web::test]
async fn test_missing_query_fails_fast() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(Vec::new());
    let app = init_app!(embedder, store);

    for uri in ["/waypoints/search", "/waypoints/search?q=", "/waypoints/search?q=%20%20"] {
        let resp = test::call_service(&app, authed(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "missing query parameter q"}));
    }

    assert_eq!(embedder.calls(), 0);
    assert_eq!(store.nearest_calls(), 0);
}

#[actix_web::test]
async fn test_repeated_query_parameter_is_json_error() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(Vec::new());
    let app = init_app!(embedder, store);

    let resp = test::call_service(
        &app,
        authed("/waypoints/search?q=lighthouse&q=cove").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/json"
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "invalid query parameter q"}));

    assert_eq!(embedder.calls(), 0);
    assert_eq!(store.nearest_calls(), 0);
}

#[actix_web::test]
async fn test_search_scores_rows_in_store_order() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(vec![
        WaypointRow::new("Fanad Head", "Lighthouse on a rocky headland", 0.1),
        WaypointRow::new("Malin Beg", "Sandy cove below cliffs", 0.4),
    ]);
    let app = init_app!(embedder, store);

    let resp = test::call_service(&app, authed("/waypoints/search?q=lighthouse").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);

    assert_eq!(results[0]["name"], "Fanad Head");
    assert_eq!(results[0]["description"], "Lighthouse on a rocky headland");
    assert!((results[0]["distance"].as_f64().unwrap() - 0.1).abs() < 1e-9);
    assert!((results[0]["score"].as_f64().unwrap() - 90.0).abs() < 1e-9);

    assert_eq!(results[1]["name"], "Malin Beg");
    assert!((results[1]["distance"].as_f64().unwrap() - 0.4).abs() < 1e-9);
    assert!((results[1]["score"].as_f64().unwrap() - 60.0).abs() < 1e-9);

    assert_eq!(embedder.calls(), 1);
    assert_eq!(store.nearest_calls(), 1);
}

#[actix_web::test]
async fn test_search_returns_at_most_three() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(
        (0..5)
            .map(|i| WaypointRow::new(format!("wp{}", i), "desc", i as f64 * 0.1))
            .collect(),
    );
    let app = init_app!(embedder, store);

    let resp = test::call_service(&app, authed("/waypoints/search?q=coast").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_search_with_no_embedded_rows_is_empty_array() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(Vec::new());
    let app = init_app!(embedder, store);

    let resp = test::call_service(&app, authed("/waypoints/search?q=lighthouse").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn test_unreachable_embedder_skips_store() {
    let embedder = StubEmbedder::new(EmbedOutcome::Unreachable);
    let store = StubStore::with_rows(vec![WaypointRow::new("a", "b", 0.2)]);
    let app = init_app!(embedder, store);

    let resp = test::call_service(&app, authed("/waypoints/search?q=lighthouse").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "embedding service unreachable"}));
    assert_eq!(store.nearest_calls(), 0);
}

#[actix_web::test]
async fn test_embedder_status_is_bad_gateway() {
    let embedder = StubEmbedder::new(EmbedOutcome::Status(503));
    let store = StubStore::with_rows(Vec::new());
    let app = init_app!(embedder, store);

    let resp = test::call_service(&app, authed("/waypoints/search?q=lighthouse").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "embedding service error"}));
}

#[actix_web::test]
async fn test_wrong_dimension_is_bad_gateway() {
    for len in [0, 383, 768] {
        let embedder = StubEmbedder::new(EmbedOutcome::Vector(len));
        let store = StubStore::with_rows(vec![WaypointRow::new("a", "b", 0.2)]);
        let app = init_app!(embedder, store);

        let resp =
            test::call_service(&app, authed("/waypoints/search?q=lighthouse").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY, "len={}", len);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "unexpected embedding dimension"}));
        assert_eq!(store.nearest_calls(), 0);
    }
}

#[actix_web::test]
async fn test_search_store_failure() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::failing();
    let app = init_app!(embedder, store);

    let resp = test::call_service(&app, authed("/waypoints/search?q=lighthouse").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "database query failed"}));
}

#[actix_web::test]
async fn test_preflight_from_allowed_origin() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(Vec::new());
    let app = init_app!(embedder, store, vec![ALLOWED_ORIGIN, "https://other.example"]);

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/waypoints/search")
        .insert_header(("Origin", ALLOWED_ORIGIN))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let headers = resp.headers();
    assert_eq!(headers.get("Access-Control-Allow-Origin").unwrap(), ALLOWED_ORIGIN);
    assert_eq!(headers.get("Access-Control-Allow-Methods").unwrap(), "GET, OPTIONS");
    assert_eq!(
        headers.get("Access-Control-Allow-Headers").unwrap(),
        "Content-Type, X-Site-Token"
    );
    assert!(test::read_body(resp).await.is_empty());
}

#[actix_web::test]
async fn test_disallowed_origin_gets_no_cors_headers() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(Vec::new());
    let app = init_app!(embedder, store, vec![ALLOWED_ORIGIN]);

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/waypoints/count")
        .insert_header(("Origin", "https://evil.example"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.headers().get("Access-Control-Allow-Origin").is_none());

    let req = authed("/waypoints/count")
        .insert_header(("Origin", "https://evil.example"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("Access-Control-Allow-Origin").is_none());
}

#[actix_web::test]
async fn test_allowed_origin_on_regular_request() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(Vec::new());
    let app = init_app!(embedder, store, vec![ALLOWED_ORIGIN]);

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("Origin", ALLOWED_ORIGIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("Access-Control-Allow-Origin").unwrap(),
        ALLOWED_ORIGIN
    );

    // Auth failures still carry CORS headers so browsers can read them
    let req = test::TestRequest::get()
        .uri("/waypoints/count")
        .insert_header(("Origin", ALLOWED_ORIGIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().get("Access-Control-Allow-Origin").is_some());
}

#[actix_web::test]
async fn test_without_cors_options_is_not_special() {
    let embedder = StubEmbedder::new(EmbedOutcome::Vector(EMBEDDING_DIM));
    let store = StubStore::with_rows(Vec::new());
    let app = init_app!(embedder, store);

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/waypoints/count")
        .insert_header(("Origin", ALLOWED_ORIGIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().get("Access-Control-Allow-Origin").is_none());
}
