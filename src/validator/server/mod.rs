// SPDX-License-Identifier: MIT

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::engine::{ResolutionContext, RuleEngine, SnapshotDocument};
use crate::validator::config::ValidatorConfig;
use crate::validator::error::ValidatorError;
use crate::validator::runner::{BatchReport, BatchRunner};
use crate::validator::snapshot::{loader::checksum, InMemorySnapshotStore};
use crate::validator::testset::RuleCase;

pub struct AppState {
    pub config: ValidatorConfig,
    pub engine: RuleEngine,
}

impl AppState {
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            engine: RuleEngine::new(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/functions", get(list_functions))
        .route("/api/evaluate", post(evaluate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: ValidatorConfig) -> Result<(), ValidatorError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let app = router(Arc::new(AppState::new(config)));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_functions(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!(state.engine.registry().names()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateRequest {
    rules: Vec<String>,
    /// snapshot id -> document
    #[serde(default)]
    snapshots: HashMap<String, Value>,
    /// Document for paths that do not start with a snapshot id
    #[serde(default)]
    document: Option<Value>,
    #[serde(default)]
    sequential: bool,
}

async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EvaluateRequest>,
) -> Result<Json<BatchReport>, (StatusCode, Json<Value>)> {
    if payload.rules.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "no rules given" })),
        ));
    }

    tracing::info!(
        rules = payload.rules.len(),
        snapshots = payload.snapshots.len(),
        "Evaluating batch"
    );
    let collection = state.config.default_collection.clone();
    let store = InMemorySnapshotStore::new();
    let mut collections = HashMap::new();
    for (snapshot_id, json) in payload.snapshots {
        store
            .insert(SnapshotDocument {
                snapshot_id: snapshot_id.clone(),
                collection: collection.clone(),
                checksum: checksum(&json),
                timestamp: chrono::Utc::now().timestamp_millis(),
                json,
            })
            .await;
        collections.insert(snapshot_id, collection.clone());
    }

    let mut ctx = ResolutionContext::new(collections, Arc::new(store))
        .with_fetch_timeout(state.config.fetch_timeout());
    if let Some(document) = payload.document {
        ctx = ctx.with_default_document(document);
    }

    let cases: Vec<RuleCase> = payload
        .rules
        .into_iter()
        .enumerate()
        .map(|(i, rule)| RuleCase::new((i + 1).to_string(), rule))
        .collect();

    let runner = BatchRunner::new(state.engine.clone(), Arc::new(ctx))
        .with_concurrency(state.config.concurrency);
    let report = if payload.sequential {
        runner.run(&cases).await
    } else {
        runner.run_concurrent(&cases).await
    };
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(AppState::new(ValidatorConfig::default())))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_list_functions() {
        let response = app()
            .oneshot(Request::builder().uri("/api/functions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let names = body_json(response).await;
        assert!(names.as_array().unwrap().contains(&json!("setintersection")));
    }

    #[tokio::test]
    async fn test_evaluate() {
        let request = post_json(
            "/api/evaluate",
            json!({
                "rules": ["S1.sku == 'Standard'", "region == 'eu'", "S1.sku = 'x'"],
                "snapshots": { "S1": { "sku": "Standard" } },
                "document": { "region": "us" }
            }),
        );
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let report = body_json(response).await;
        let statuses: Vec<&str> = report["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["status"].as_str().unwrap())
            .collect();
        assert_eq!(statuses, vec!["passed", "failed", "invalid"]);
        assert!(report["runId"].is_string());
    }

    #[tokio::test]
    async fn test_evaluate_without_rules() {
        let response = app()
            .oneshot(post_json("/api/evaluate", json!({ "rules": [] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
