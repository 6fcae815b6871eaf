use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use shuttle_axum::axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::aspects::aspect_sentiment;
use crate::model::{AspectMap, SentimentResult};
use crate::pipeline::Pipeline;
use crate::report::to_json_value;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Public HTTP surface. `/metrics` is merged in by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/platforms/{name}", get(platform_report))
        .route("/api/sentiment/{query}", get(query_report))
        .route("/api/sentiment/{query}/{location}", get(location_report))
        .route("/api/score", post(score_text))
        .route("/api/aspects", post(text_aspects))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn platform_report(State(state): State<AppState>, Path(name): Path<String>) -> Json<Value> {
    let report = state.pipeline.analyze(&name, None).await;
    Json(to_json_value(&report))
}

async fn query_report(State(state): State<AppState>, Path(query): Path<String>) -> Json<Value> {
    let report = state.pipeline.analyze(&query, None).await;
    Json(to_json_value(&report))
}

async fn location_report(
    State(state): State<AppState>,
    Path((query, location)): Path<(String, String)>,
) -> Json<Value> {
    let report = state.pipeline.analyze(&query, Some(&location)).await;
    Json(to_json_value(&report))
}

#[derive(Deserialize)]
struct ScoreReq {
    #[serde(default)]
    text: Option<String>,
}

async fn score_text(State(state): State<AppState>, Json(body): Json<ScoreReq>) -> Json<SentimentResult> {
    Json(state.pipeline.scorer().score_opt(body.text.as_deref()))
}

#[derive(Deserialize)]
struct AspectsReq {
    #[serde(default)]
    text: String,
    /// Defaults to the configured general-mode aspects.
    #[serde(default)]
    aspects: Option<Vec<String>>,
}

async fn text_aspects(State(state): State<AppState>, Json(body): Json<AspectsReq>) -> Json<AspectMap> {
    let pipeline = &state.pipeline;
    let aspects = body
        .aspects
        .unwrap_or_else(|| pipeline.config().default_aspects.clone());
    Json(aspect_sentiment(pipeline.scorer(), &body.text, &aspects))
}
