//! Run one adaptive tutoring session end to end
//!
//! A collaborative session over the default topic set, with a simulated
//! mid-ability student. Round-by-round decisions stream through tracing;
//! the full record log lands in `session.jsonl` next to the binary's
//! working directory.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example run_session
//! ```

use anyhow::Result;
use mentor_rl::{
    config::SessionConfig,
    coordinator::Coordinator,
    env::{NoisyStudent, TemplateBank},
    record::JsonlSink,
};

const SEED: u64 = 42;
const STUDENT_ABILITY: f64 = 0.6;
const RECORD_PATH: &str = "session.jsonl";

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = SessionConfig::default();
    tracing::info!("🎓 Adaptive tutoring session");
    tracing::info!("  Mode: {}", config.mode);
    tracing::info!("  Rounds: {}", config.rounds);
    tracing::info!("  Topics: {:?}", config.topics);
    tracing::info!("  Student ability: {}", STUDENT_ABILITY);
    tracing::info!("");

    let sink = JsonlSink::create(RECORD_PATH)?;
    let student = NoisyStudent::with_seed(STUDENT_ABILITY, SEED);
    let session = Coordinator::with_seed(config, TemplateBank::new(), student, sink, SEED)?;

    let summary = session.run()?;

    tracing::info!("");
    tracing::info!("Session complete:");
    tracing::info!("  Interactions: {}", summary.interactions);
    tracing::info!("  Cumulative reward: {:.4}", summary.cumulative_reward);
    tracing::info!(
        "  Overall performance: {:.3} -> {:.3}",
        summary.start_performance,
        summary.end_performance
    );
    tracing::info!("  Trend: {}", summary.improvement_trend);
    tracing::info!("  Engagement: {}", summary.engagement_level);
    tracing::info!("  Records written to {}", RECORD_PATH);

    Ok(())
}
