use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const QUERIES_TOTAL: &str = "pipeline_queries_total";
pub const ITEMS_FETCHED_TOTAL: &str = "pipeline_items_fetched_total";
pub const ITEMS_DEDUPED_TOTAL: &str = "pipeline_items_deduped_total";
pub const SOURCE_ERRORS_TOTAL: &str = "pipeline_source_errors_total";
pub const EMOTION_FALLBACK_TOTAL: &str = "pipeline_emotion_fallback_total";
pub const SUMMARY_REJECTED_TOTAL: &str = "pipeline_summary_rejected_total";
pub const ANALYZE_MS: &str = "pipeline_analyze_ms";
pub const LAST_RUN_TS: &str = "pipeline_last_run_ts";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(QUERIES_TOTAL, "Queries analyzed.");
        describe_counter!(ITEMS_FETCHED_TOTAL, "Items returned by content sources.");
        describe_counter!(ITEMS_DEDUPED_TOTAL, "Items removed as near-duplicates.");
        describe_counter!(SOURCE_ERRORS_TOTAL, "Content source fetch errors and timeouts.");
        describe_counter!(
            EMOTION_FALLBACK_TOTAL,
            "Items whose emotion fell back to neutral."
        );
        describe_counter!(
            SUMMARY_REJECTED_TOTAL,
            "Generated summaries rejected as too short or irrelevant."
        );
        describe_histogram!(ANALYZE_MS, "End-to-end query analysis time in milliseconds.");
        describe_gauge!(LAST_RUN_TS, "Unix ts when a query was last analyzed.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder. Safe to call more than
    /// once; later calls reuse the first handle.
    pub fn init() -> anyhow::Result<Self> {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?
            .clone();
        ensure_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
