//! Parallel batch evaluation of independent sessions
//!
//! Each session owns all of its mutable state, so a batch of simulated
//! students is embarrassingly parallel. The pool builds one session per
//! student from factory closures and runs them across Rayon's thread pool,
//! collecting per-session outcomes and batch aggregates. The mode sweep on
//! top of it is the usual way to compare coordination protocols over many
//! students.

use crate::config::SessionConfig;
use crate::coordinator::{CoordinationMode, Coordinator};
use crate::env::{QuestionBank, ResponseSource};
use crate::record::{Interaction, MemorySink, SessionSummary};
use anyhow::{Result, anyhow};
use rayon::prelude::*;
use serde::Serialize;

/// One completed session within a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    /// Seed this session ran under.
    pub seed: u64,
    /// End-of-session summary.
    pub summary: SessionSummary,
    /// Per-round records in emission order.
    pub interactions: Vec<Interaction>,
}

/// Aggregates over a batch of sessions run under one mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStats {
    /// Coordination mode the batch ran under.
    pub mode: CoordinationMode,
    /// Sessions completed.
    pub sessions: usize,
    /// Mean cumulative reward across sessions.
    pub mean_cumulative_reward: f64,
    /// Mean final overall performance across sessions.
    pub mean_final_performance: f64,
    /// Sessions whose trend came out improving.
    pub improving_sessions: usize,
    /// Every session's outcome, in seed order.
    pub outcomes: Vec<SessionOutcome>,
}

impl BatchStats {
    fn from_outcomes(mode: CoordinationMode, outcomes: Vec<SessionOutcome>) -> Self {
        let sessions = outcomes.len();
        let count = sessions.max(1) as f64;
        let mean_cumulative_reward = outcomes
            .iter()
            .map(|o| o.summary.cumulative_reward)
            .sum::<f64>()
            / count;
        let mean_final_performance = outcomes
            .iter()
            .map(|o| o.summary.end_performance)
            .sum::<f64>()
            / count;
        let improving_sessions = outcomes
            .iter()
            .filter(|o| o.summary.improvement_trend == "improving")
            .count();
        Self {
            mode,
            sessions,
            mean_cumulative_reward,
            mean_final_performance,
            improving_sessions,
            outcomes,
        }
    }
}

/// Runs a batch of independent sessions in parallel.
///
/// Session `i` gets seed `base_seed + i`, which feeds both the value
/// agent's exploration and the student factory, so a batch is reproducible
/// end to end when the factory builds seeded students.
#[derive(Debug, Clone)]
pub struct SessionPool {
    config: SessionConfig,
    sessions: usize,
    base_seed: u64,
}

impl SessionPool {
    /// Create a pool running `sessions` copies of `config`.
    ///
    /// # Errors
    /// Fails fast on an invalid configuration or an empty batch.
    pub fn new(config: SessionConfig, sessions: usize) -> Result<Self> {
        config.validate()?;
        if sessions == 0 {
            return Err(anyhow!("at least one session is required"));
        }
        Ok(Self {
            config,
            sessions,
            base_seed: 0,
        })
    }

    /// Set the first seed in the batch.
    pub fn base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    /// Run every session across the thread pool and aggregate the results.
    ///
    /// `bank_fn` builds one question bank per session; `student_fn` builds
    /// one response source per session from that session's seed.
    pub fn run<BF, B, SF, R>(&self, bank_fn: BF, student_fn: SF) -> Result<BatchStats>
    where
        BF: Fn() -> B + Sync,
        B: QuestionBank + Send,
        SF: Fn(u64) -> R + Sync,
        R: ResponseSource + Send,
    {
        tracing::info!(
            mode = %self.config.mode,
            sessions = self.sessions,
            "batch starting"
        );
        let outcomes = (0..self.sessions)
            .into_par_iter()
            .map(|i| {
                let seed = self.base_seed.wrapping_add(i as u64);
                let mut sink = MemorySink::new();
                let coordinator = Coordinator::with_seed(
                    self.config.clone(),
                    bank_fn(),
                    student_fn(seed),
                    &mut sink,
                    seed,
                )?;
                let summary = coordinator.run()?;
                Ok(SessionOutcome {
                    seed,
                    summary,
                    interactions: sink.interactions,
                })
            })
            .collect::<Result<Vec<SessionOutcome>>>()?;

        let stats = BatchStats::from_outcomes(self.config.mode, outcomes);
        tracing::info!(
            mode = %stats.mode,
            mean_reward = stats.mean_cumulative_reward,
            improving = stats.improving_sessions,
            "batch complete"
        );
        Ok(stats)
    }
}

/// Run the same batch under every coordination mode.
///
/// Returns one [`BatchStats`] per mode, in [`CoordinationMode::ALL`] order,
/// with identical seeds across modes so the comparison is apples to apples.
pub fn compare_modes<BF, B, SF, R>(
    config: &SessionConfig,
    sessions: usize,
    bank_fn: BF,
    student_fn: SF,
) -> Result<Vec<BatchStats>>
where
    BF: Fn() -> B + Sync,
    B: QuestionBank + Send,
    SF: Fn(u64) -> R + Sync,
    R: ResponseSource + Send,
{
    CoordinationMode::ALL
        .iter()
        .map(|&mode| {
            let pool = SessionPool::new(config.clone().mode(mode), sessions)?;
            pool.run(&bank_fn, &student_fn)
        })
        .collect()
}
