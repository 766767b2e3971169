//! Tabular value agent selecting question difficulty
//!
//! Maintains action values per discretized state and picks difficulty
//! levels epsilon-greedily. The temporal-difference update adapts its
//! step size to the student's learning velocity, and exploration decays
//! toward a configured floor as the session progresses.

use super::state_key::StateKey;
use crate::config::ValueAgentConfig;
use crate::profile::StudentProfile;
use crate::reward::DIFFICULTY_LEVELS;
use anyhow::{Result, anyhow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Scale of the learning-velocity adjustment to the step size.
const VELOCITY_ADAPTATION: f64 = 0.05;

/// Floor for the adapted learning rate.
const MIN_LEARNING_RATE: f64 = 1e-4;

/// Per-update change to the self-reported performance score.
const PERFORMANCE_STEP: f64 = 0.05;

/// Ceiling for the self-reported performance score.
const PERFORMANCE_CEILING: f64 = 0.95;

/// Difficulty selector backed by a per-state action-value table.
#[derive(Debug, Clone)]
pub struct ValueAgent {
    config: ValueAgentConfig,
    /// Action-value rows keyed by discretized state.
    pub q_table: BTreeMap<StateKey, [f64; DIFFICULTY_LEVELS]>,
    /// Current exploration rate, decayed after every update.
    pub epsilon: f64,
    /// Self-reported effectiveness in `[0, 0.95]`.
    pub performance: f64,
    /// Updates applied this session.
    pub updates: u32,
    rng: StdRng,
}

impl ValueAgent {
    /// Create an agent with entropy-seeded exploration.
    pub fn new(config: ValueAgentConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create an agent with a fixed exploration seed, for reproducible runs.
    pub fn with_seed(config: ValueAgentConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: ValueAgentConfig, rng: StdRng) -> Self {
        let epsilon = config.epsilon;
        Self {
            config,
            q_table: BTreeMap::new(),
            epsilon,
            performance: 0.5,
            updates: 0,
            rng,
        }
    }

    /// Pick a difficulty for `state`, exploring with probability `epsilon`.
    ///
    /// Always returns a level in `0..=3`, including for unseen states.
    pub fn select_action(&mut self, state: StateKey) -> usize {
        if self.rng.gen::<f64>() < self.epsilon {
            let action = self.rng.gen_range(0..DIFFICULTY_LEVELS);
            tracing::trace!(%state, action, "value agent explored");
            return action;
        }
        self.greedy_action(state)
    }

    /// Best known difficulty for `state`; ties break toward the lowest level.
    /// Unseen states read as all-zero rows.
    pub fn greedy_action(&self, state: StateKey) -> usize {
        let row = self
            .q_table
            .get(&state)
            .copied()
            .unwrap_or([0.0; DIFFICULTY_LEVELS]);
        let mut best = 0;
        for (action, &value) in row.iter().enumerate().skip(1) {
            if value > row[best] {
                best = action;
            }
        }
        best
    }

    /// Apply a temporal-difference update for one observed transition.
    ///
    /// The step size is the configured learning rate scaled by
    /// `1 + learning_velocity * adaptation`, floored at a small positive
    /// value so a strongly negative velocity cannot flip the update sign.
    /// Afterwards epsilon decays toward its floor and the self-reported
    /// performance moves by the sign of the reward.
    ///
    /// # Errors
    /// Returns an error if `action` is outside the served difficulty range.
    pub fn update(
        &mut self,
        state: StateKey,
        action: usize,
        reward: f64,
        next_state: StateKey,
        learning_velocity: f64,
    ) -> Result<()> {
        if action >= DIFFICULTY_LEVELS {
            return Err(anyhow!(
                "action {} outside served range 0..={}",
                action,
                DIFFICULTY_LEVELS - 1
            ));
        }

        let lr = (self.config.learning_rate * (1.0 + learning_velocity * VELOCITY_ADAPTATION))
            .max(MIN_LEARNING_RATE);
        let next_max = self
            .q_table
            .get(&next_state)
            .map(|row| row.iter().copied().fold(f64::MIN, f64::max))
            .unwrap_or(0.0);

        let row = self
            .q_table
            .entry(state)
            .or_insert([0.0; DIFFICULTY_LEVELS]);
        let target = reward + self.config.gamma * next_max;
        row[action] += lr * (target - row[action]);

        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        let direction = if reward > 0.0 { 1.0 } else { -1.0 };
        self.performance =
            (self.performance + PERFORMANCE_STEP * direction).clamp(0.0, PERFORMANCE_CEILING);
        self.updates += 1;

        tracing::debug!(
            %state,
            action,
            reward,
            q = row[action],
            epsilon = self.epsilon,
            "value agent updated"
        );
        Ok(())
    }

    /// Topic this agent would serve when it holds decision authority.
    ///
    /// Deterministic remediation rule: the topic with the lowest tracked
    /// performance wins, ties breaking toward the earlier entry in `topics`.
    /// Returns `None` only for an empty topic list.
    pub fn propose_topic(&self, profile: &StudentProfile, topics: &[String]) -> Option<String> {
        let mut weakest: Option<(&String, f64)> = None;
        for topic in topics {
            let perf = profile
                .topic_performance
                .get(topic)
                .copied()
                .unwrap_or(0.5);
            match weakest {
                Some((_, best)) if perf >= best => {}
                _ => weakest = Some((topic, perf)),
            }
        }
        weakest.map(|(topic, _)| topic.clone())
    }
}
