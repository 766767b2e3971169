//! Compare coordination protocols over a batch of simulated students
//!
//! Runs the same seeded batch under every coordination mode and reports
//! which protocol earns the most reward and moves performance furthest.
//! Sessions within a batch run in parallel across the Rayon thread pool.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example compare_modes --release
//! ```

use anyhow::Result;
use mentor_rl::{
    config::SessionConfig,
    env::{NoisyStudent, TemplateBank},
    eval::compare_modes,
};

const SESSIONS_PER_MODE: usize = 32;
const STUDENT_ABILITY: f64 = 0.5;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = SessionConfig::default();
    tracing::info!("⚖️  Coordination mode comparison");
    tracing::info!("  Sessions per mode: {}", SESSIONS_PER_MODE);
    tracing::info!("  Rounds per session: {}", config.rounds);
    tracing::info!("");

    let results = compare_modes(&config, SESSIONS_PER_MODE, TemplateBank::new, |seed| {
        NoisyStudent::with_seed(STUDENT_ABILITY, seed)
    })?;

    tracing::info!("");
    tracing::info!(
        "{:<14} {:>12} {:>12} {:>10}",
        "mode",
        "mean reward",
        "final perf",
        "improving"
    );
    for stats in &results {
        tracing::info!(
            "{:<14} {:>12.4} {:>12.3} {:>7}/{}",
            stats.mode.to_string(),
            stats.mean_cumulative_reward,
            stats.mean_final_performance,
            stats.improving_sessions,
            stats.sessions
        );
    }

    let best = results
        .iter()
        .max_by(|a, b| {
            a.mean_cumulative_reward
                .total_cmp(&b.mean_cumulative_reward)
        })
        .map(|stats| stats.mode);
    if let Some(mode) = best {
        tracing::info!("");
        tracing::info!("Highest mean reward: {}", mode);
    }

    Ok(())
}
