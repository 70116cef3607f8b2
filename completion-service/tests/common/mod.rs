#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use completion_service::config::{AssetsConfig, GenerationConfig};
use completion_service::services::providers::MockChatProvider;
use completion_service::services::{LogStore, MemoryLogStore};
use completion_service::startup::{build_router, AppState};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub const INDEX_HTML: &str = "<!doctype html><html><body><div id=\"root\"></div></body></html>";
pub const MAIN_JS: &str = "console.log('editor');";

/// Router wired to a scripted provider, an in-memory store and a temporary
/// SPA bundle.
pub struct TestApp {
    pub router: Router,
    pub provider: Arc<MockChatProvider>,
    pub store: Option<Arc<MemoryLogStore>>,
    pub assets: TempDir,
}

impl TestApp {
    pub fn replying(reply: &str) -> Self {
        Self::build(MockChatProvider::replying(reply), Some(MemoryLogStore::new()))
    }

    pub fn failing(message: &str) -> Self {
        Self::build(MockChatProvider::failing(message), Some(MemoryLogStore::new()))
    }

    pub fn build(provider: MockChatProvider, store: Option<MemoryLogStore>) -> Self {
        Self::build_with_generation(provider, store, GenerationConfig::default())
    }

    pub fn build_with_generation(
        provider: MockChatProvider,
        store: Option<MemoryLogStore>,
        generation: GenerationConfig,
    ) -> Self {
        let assets = spa_bundle();
        let provider = Arc::new(provider);
        let store = store.map(Arc::new);

        let state = AppState {
            generation,
            provider: provider.clone(),
            store: store.clone().map(|s| s as Arc<dyn LogStore>),
        };
        let router = build_router(state, &assets_config(assets.path()));

        TestApp {
            router,
            provider,
            store,
            assets,
        }
    }

    pub fn store(&self) -> &MemoryLogStore {
        self.store.as_deref().expect("test app has no store")
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = self
            .request(
                Request::builder()
                    .method(Method::POST)
                    .uri(path)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        json_body(response).await
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> (StatusCode, serde_json::Value) {
        let response = self
            .request(
                Request::builder()
                    .method(Method::POST)
                    .uri(path)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        json_body(response).await
    }

    pub async fn get(&self, path: &str) -> Response {
        self.request(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
    }
}

pub fn assets_config(root: &Path) -> AssetsConfig {
    AssetsConfig {
        root_dir: root.to_path_buf(),
        index_file: "index.html".to_string(),
    }
}

/// Temporary directory laid out like a built React bundle.
pub fn spa_bundle() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::create_dir_all(dir.path().join("static/js")).unwrap();
    std::fs::write(dir.path().join("static/js/main.js"), MAIN_JS).unwrap();
    std::fs::write(dir.path().join("favicon.ico"), [0u8, 1, 2, 3]).unwrap();
    dir
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec()
}

pub async fn json_body(response: Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = body_bytes(response).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

/// Polls until `condition` holds; completion logging runs in a spawned task.
pub async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
