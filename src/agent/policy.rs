//! Preference-weight policy agent selecting question topics
//!
//! Keeps unnormalized per-topic logits and a running baseline estimate of
//! expected reward. Topic choice is the argmax of a softmax over boosted
//! logits, which keeps selection reproducible. Weight updates are
//! advantage-scaled and ratio-clipped so a single round cannot swing a
//! topic's preference disproportionately.

use crate::config::PolicyAgentConfig;
use crate::profile::StudentProfile;
use crate::reward::{DIFFICULTY_LEVELS, ENGAGEMENT_WEIGHT};
use anyhow::{Result, anyhow};
use std::collections::BTreeMap;

/// Starting preference weight for every configured topic.
const INITIAL_WEIGHT: f64 = 1.0;

/// Additive logit boost for topics in the improvement set.
const IMPROVEMENT_BOOST: f64 = 0.4;

/// Additive logit boost for preferred topics.
const PREFERRED_BOOST: f64 = 0.3;

/// Scale of the performance-gap bias toward weaker topics.
const GAP_BIAS: f64 = 0.3;

/// Per-update change to the self-reported performance score.
const PERFORMANCE_STEP: f64 = 0.03;

/// Ceiling for the self-reported performance score.
const PERFORMANCE_CEILING: f64 = 0.95;

/// Topic selector backed by per-topic preference weights.
///
/// The agent holds no randomness; both selection and the difficulty
/// proposal are deterministic functions of its state and the profile.
#[derive(Debug, Clone)]
pub struct PolicyAgent {
    config: PolicyAgentConfig,
    /// Unnormalized preference logits per topic.
    pub topic_weights: BTreeMap<String, f64>,
    /// Running estimate of expected adapted reward, the critic baseline.
    pub value_baseline: f64,
    /// Self-reported effectiveness in `[0, 0.95]`.
    pub performance: f64,
    /// Updates applied this session.
    pub updates: u32,
    default_topics: Vec<String>,
}

impl PolicyAgent {
    /// Create an agent covering `topics`, all starting at the neutral weight.
    pub fn new(config: PolicyAgentConfig, topics: &[String]) -> Self {
        let topic_weights = topics.iter().map(|t| (t.clone(), INITIAL_WEIGHT)).collect();
        Self {
            config,
            topic_weights,
            value_baseline: 0.5,
            performance: 0.5,
            updates: 0,
            default_topics: topics.to_vec(),
        }
    }

    /// Create an agent from an externally supplied weight table.
    ///
    /// # Errors
    /// Returns an error if any weight is non-finite.
    pub fn with_weights(
        config: PolicyAgentConfig,
        weights: BTreeMap<String, f64>,
        default_topics: &[String],
    ) -> Result<Self> {
        for (topic, weight) in &weights {
            if !weight.is_finite() {
                return Err(anyhow!("non-finite weight {} for topic {:?}", weight, topic));
            }
        }
        Ok(Self {
            config,
            topic_weights: weights,
            value_baseline: 0.5,
            performance: 0.5,
            updates: 0,
            default_topics: default_topics.to_vec(),
        })
    }

    /// Choose a topic for the next question.
    ///
    /// Logits combine the learned weight with boosts for improvement areas
    /// and preferred topics plus a bias toward lower-performing topics; the
    /// softmax argmax is taken, ties breaking toward the lexicographically
    /// first topic. Falls back to the default topic set when the weight
    /// table is empty, and returns `None` only when both are empty.
    pub fn select_action(&self, profile: &StudentProfile) -> Option<String> {
        let candidates: Vec<&String> = if self.topic_weights.is_empty() {
            tracing::warn!("topic weights empty, falling back to default topic set");
            self.default_topics.iter().collect()
        } else {
            self.topic_weights.keys().collect()
        };
        if candidates.is_empty() {
            return None;
        }

        let logits: Vec<f64> = candidates
            .iter()
            .map(|topic| self.preference_logit(topic, profile))
            .collect();
        let max_logit = logits.iter().copied().fold(f64::MIN, f64::max);
        let exps: Vec<f64> = logits.iter().map(|l| (l - max_logit).exp()).collect();
        let total: f64 = exps.iter().sum();

        let mut best = 0;
        for i in 1..exps.len() {
            if exps[i] > exps[best] {
                best = i;
            }
        }
        tracing::trace!(
            topic = %candidates[best],
            probability = exps[best] / total,
            "policy agent chose topic"
        );
        Some(candidates[best].clone())
    }

    fn preference_logit(&self, topic: &str, profile: &StudentProfile) -> f64 {
        let mut logit = self
            .topic_weights
            .get(topic)
            .copied()
            .unwrap_or(INITIAL_WEIGHT);
        if profile.improvement_areas.contains(topic) {
            logit += IMPROVEMENT_BOOST;
        }
        if profile.preferred_topics.contains(topic) {
            logit += PREFERRED_BOOST;
        }
        let perf = profile.topic_performance.get(topic).copied().unwrap_or(0.5);
        logit + GAP_BIAS * (1.0 - perf)
    }

    /// Difficulty this agent would serve when it holds decision authority.
    ///
    /// Deterministic rule: the level matching the student's current overall
    /// performance band.
    pub fn propose_difficulty(&self, profile: &StudentProfile) -> usize {
        let overall = profile.overall_performance.clamp(0.0, 1.0);
        ((overall * DIFFICULTY_LEVELS as f64) as usize).min(DIFFICULTY_LEVELS - 1)
    }

    /// Fold one shared reward into the weight table and baseline.
    ///
    /// The reward is first adapted by engagement, then turned into an
    /// advantage against the running baseline. The weight step is
    /// `lr * advantage`, with the new-to-old weight ratio clipped to
    /// `[1 - clip_epsilon, 1 + clip_epsilon]`. Weights at exactly zero take
    /// the raw step, since a ratio against zero is undefined; the clip
    /// applies from the first nonzero value onward.
    pub fn update(&mut self, topic: &str, reward: f64, engagement: f64) {
        let adapted = reward * (1.0 + ENGAGEMENT_WEIGHT * engagement);
        let advantage = adapted - self.value_baseline;
        let step = self.config.learning_rate * advantage;

        let clip = self.config.clip_epsilon;
        let weight = self
            .topic_weights
            .entry(topic.to_string())
            .or_insert(INITIAL_WEIGHT);
        if weight.abs() > f64::EPSILON {
            let ratio = (*weight + step) / *weight;
            let clipped = ratio.clamp(1.0 - clip, 1.0 + clip);
            *weight *= clipped;
        } else {
            *weight += step;
        }
        let new_weight = *weight;

        self.value_baseline += self.config.baseline_rate * (adapted - self.value_baseline);

        let direction = if reward > 0.0 {
            1.0
        } else if reward < 0.0 {
            -1.0
        } else {
            0.0
        };
        self.performance =
            (self.performance + PERFORMANCE_STEP * direction).clamp(0.0, PERFORMANCE_CEILING);
        self.updates += 1;

        tracing::debug!(
            topic,
            reward,
            advantage,
            weight = new_weight,
            baseline = self.value_baseline,
            "policy agent updated"
        );
    }
}
