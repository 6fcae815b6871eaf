//! Opinion Pulse server entrypoint.
//! Loads config and credentials, wires the pipeline and serves the Axum router.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use opinion_pulse::api::{self, AppState};
use opinion_pulse::metrics::Metrics;
use opinion_pulse::{init_tracing, CollaboratorConfig, Pipeline, PipelineConfig};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = PipelineConfig::load().context("loading pipeline config")?;
    let collab = CollaboratorConfig::from_env().context("reading collaborator credentials")?;
    let pipeline = Pipeline::from_collaborators(config, &collab)?;

    let metrics = Metrics::init()?;
    let router = api::router(AppState::new(pipeline)).merge(metrics.router());

    Ok(router.into())
}
