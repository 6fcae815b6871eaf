//! One-shot analysis from the command line; prints the JSON report.
//!
//! Usage: `analyze-once <query> [location]`

use anyhow::Context;
use opinion_pulse::report::to_json_value;
use opinion_pulse::{init_tracing, CollaboratorConfig, Pipeline, PipelineConfig};

/// Strongest items listed on stderr after the report.
const TOP_ITEMS: usize = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(query) = args.next() else {
        anyhow::bail!("usage: analyze-once <query> [location]");
    };
    let location = args.next();

    let config = PipelineConfig::load().context("loading pipeline config")?;
    let collab = CollaboratorConfig::from_env()?;
    let pipeline = Pipeline::from_collaborators(config, &collab)?;

    let report = pipeline.analyze(&query, location.as_deref()).await;
    let json = serde_json::to_string_pretty(&to_json_value(&report))?;
    println!("{json}");

    for it in report.top_by_impact(TOP_ITEMS) {
        let title = it.item.title.as_deref().unwrap_or("(untitled)");
        eprintln!("{:>3} {:<8} {}", it.sentiment.score, it.sentiment.label.as_str(), title);
    }
    Ok(())
}
