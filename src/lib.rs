// src/lib.rs
// Public library surface for the server, the CLI and integration tests.

pub mod api;
pub mod aspects;
pub mod config;
pub mod dedup;
pub mod geo;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod sentiment;
pub mod trend;

// External collaborators: content sources, emotion model, summarizer.
pub mod analyze;
pub mod ingest;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::{CollaboratorConfig, PipelineConfig};
pub use crate::model::{AnalysisReport, ContentItem, SentimentResult, Source};
pub use crate::pipeline::Pipeline;
pub use crate::sentiment::SentimentScorer;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber: `RUST_LOG` (default `opinion_pulse=info,warn`),
/// compact text or JSON lines when `LOG_FORMAT=json`. A subscriber installed
/// earlier (e.g. by the hosting runtime) is left in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("opinion_pulse=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
