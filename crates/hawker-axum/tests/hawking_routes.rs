//! Integration tests for the `/api/v1/hawking/*` HTTP surface.
//!
//! These verify route wiring (no 404/405 on the documented surface),
//! the client-error mappings (400 on missing ids, 404 on unknown
//! products) and the snapshot-in-acknowledgement contract every
//! mutation answers with.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uuid::Uuid;

use hawker_axum::{bootstrap, create_router, CorsConfig, HawkerDeps};
use hawker_core::cache;
use hawker_core::domain::Product;
use hawker_core::ports::{AudioSynthesizer, MemProductStore, ProductStore, SynthesisError};
use hawker_core::settings::{ServerSettings, Settings};

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Offline synthesizer: materializes a stub file like the real adapter
/// would, without any network.
struct StubTts {
    audio_root: PathBuf,
}

#[async_trait]
impl AudioSynthesizer for StubTts {
    async fn generate_audio(
        &self,
        _cancel: &CancellationToken,
        _text: &str,
        identifier: &str,
        _voice: &str,
    ) -> Result<String, SynthesisError> {
        let path = self.audio_root.join(format!("{identifier}.mp3"));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, b"mp3")?;
        Ok(cache::audio_url(identifier))
    }

    fn provider_voice_id(&self, voice: &str) -> String {
        format!("provider_{voice}")
    }
}

struct TestApp {
    app: Router,
    product: Product,
    _dir: tempfile::TempDir,
}

async fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        server: ServerSettings {
            port: 0,
            static_dir: dir.path().to_path_buf(),
        },
        ..Default::default()
    };

    let store = Arc::new(MemProductStore::new());
    let product = Product {
        id: Uuid::new_v4(),
        name: "五花肉".to_owned(),
        unit: "斤".to_owned(),
        price: 19.9,
        category_name: "猪肉".to_owned(),
        marketing_label: None,
        hawking_mode: Default::default(),
    };
    store.sync(vec![product.clone()]).await.unwrap();

    let deps = HawkerDeps {
        products: store,
        tts: Arc::new(StubTts {
            audio_root: settings.server.audio_root(),
        }),
    };

    let ctx = bootstrap(settings, deps).await.unwrap();
    TestApp {
        app: create_router(ctx, &CorsConfig::AllowAll),
        product,
        _dir: dir,
    }
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn parse_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|e| panic!("expected valid JSON body: {e}"))
}

fn add_task_body(t: &TestApp, session: &str) -> serde_json::Value {
    serde_json::json!({
        "session_id": session,
        "product_id": t.product.id.to_string(),
        "text": "走过路过不要错过",
        "price": 15.8,
        "voice_type": "sunny_boy",
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_route_answers_ok() {
    let t = test_app().await;
    let response = t
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn add_task_requires_a_product_id() {
    let t = test_app().await;
    let response = t
        .app
        .oneshot(json_post(
            "/api/v1/hawking/tasks",
            serde_json::json!({"session_id": "store-1", "product_id": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = parse_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("product_id"));
}

#[tokio::test]
async fn add_task_answers_404_for_an_unknown_product() {
    let t = test_app().await;
    let response = t
        .app
        .oneshot(json_post(
            "/api/v1/hawking/tasks",
            serde_json::json!({
                "session_id": "store-1",
                "product_id": Uuid::new_v4().to_string(),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_task_acknowledges_with_the_session_snapshot() {
    let t = test_app().await;
    let body = add_task_body(&t, "store-1");
    let response = t
        .app
        .clone()
        .oneshot(json_post("/api/v1/hawking/tasks", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = parse_json(response).await;
    assert_eq!(json["session_id"], "store-1");

    let products = json["tasks"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["product_id"], t.product.id.to_string());
    assert_eq!(products[0]["text"], "走过路过不要错过");
    assert_eq!(products[0]["voice_type"], "sunny_boy");

    // The pool carries the four pre-warmed scenes for the session voice.
    let pool = json["tasks"]["intro_pool"].as_array().unwrap();
    assert_eq!(pool.len(), 4);
    assert!(pool.iter().all(|i| i["voice_type"] == "sunny_boy"));
}

#[tokio::test]
async fn remove_task_requires_a_store_id() {
    let t = test_app().await;
    let uri = format!("/api/v1/hawking/tasks/{}", t.product.id);
    let response = t
        .app
        .oneshot(Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn remove_task_returns_the_updated_snapshot() {
    let t = test_app().await;
    let _ = t
        .app
        .clone()
        .oneshot(json_post("/api/v1/hawking/tasks", add_task_body(&t, "store-1")))
        .await
        .unwrap();

    let uri = format!("/api/v1/hawking/tasks/{}?store_id=store-1", t.product.id);
    let response = t
        .app
        .oneshot(Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = parse_json(response).await;
    assert!(json["tasks"]["products"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_of_an_unknown_session_is_empty() {
    let t = test_app().await;
    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/api/v1/hawking/tasks?session_id=ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = parse_json(response).await;
    assert!(json["tasks"]["products"].as_array().unwrap().is_empty());
    assert!(json["tasks"]["intro_pool"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn voice_switch_acknowledges_as_processing() {
    let t = test_app().await;
    let _ = t
        .app
        .clone()
        .oneshot(json_post("/api/v1/hawking/tasks", add_task_body(&t, "store-1")))
        .await
        .unwrap();

    let response = t
        .app
        .oneshot(json_post(
            "/api/v1/hawking/voice",
            serde_json::json!({
                "session_id": "store-1",
                "voice_id": "soft_girl",
                "product_ids": [t.product.id.to_string()],
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = parse_json(response).await;
    assert_eq!(json["status"], "processing");
    let products = json["tasks"]["products"].as_array().unwrap();
    assert_eq!(products[0]["voice_type"], "soft_girl");
}

#[tokio::test]
async fn intro_pool_route_serves_the_voice_pool() {
    let t = test_app().await;
    let response = t
        .app
        .oneshot(
            Request::builder()
                .uri("/api/v1/hawking/intros?voice_id=sweet_girl")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = parse_json(response).await;
    let pool = json.as_array().unwrap();
    assert_eq!(pool.len(), 4);
    let ids: Vec<_> = pool.iter().map(|i| i["intro_id"].as_str().unwrap()).collect();
    assert!(ids.contains(&"morning_01"));
    assert!(ids.contains(&"default_01"));
}

#[tokio::test]
async fn product_sync_upserts_the_catalogue() {
    let t = test_app().await;
    let response = t
        .app
        .oneshot(json_post(
            "/api/v1/products/sync",
            serde_json::json!([
                {"id": Uuid::new_v4().to_string(), "name": "土鸡", "unit": "只", "price": 45.0},
                {"id": Uuid::new_v4().to_string(), "name": "排骨", "unit": "斤", "price": 28.0},
            ]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = parse_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["count"], 2);
}
