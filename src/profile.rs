//! Per-student learner state
//!
//! One [`StudentProfile`] exists per session. It is an explicit owned value
//! passed into component calls, mutated through [`StudentProfile::apply_round`]
//! only, and every performance field stays clamped to `[0, 1]` after each
//! update. The derived topic sets are recomputed from scratch each round
//! rather than patched incrementally, so they are always re-derivable from
//! the tracked averages.

use crate::reward::{self, DIFFICULTY_LEVELS};
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Blend factor for the overall-performance moving average.
const OVERALL_ALPHA: f64 = 0.1;

/// Blend factor for per-topic and per-difficulty moving averages.
const TOPIC_ALPHA: f64 = 0.2;

/// Blend factor for the per-topic recent-engagement average.
const RECENT_ENGAGEMENT_ALPHA: f64 = 0.3;

/// Topics above this performance count as strengths.
const STRENGTH_THRESHOLD: f64 = 0.7;

/// Topics below this performance count as improvement areas.
const IMPROVEMENT_THRESHOLD: f64 = 0.5;

/// Recent engagement above this marks a topic as preferred.
const HIGH_ENGAGEMENT: f64 = 0.7;

/// Rewards above this count the round as solidly answered.
const SOLID_REWARD: f64 = 0.6;

/// Rewards above this count the round as answered in detail.
const DETAILED_REWARD: f64 = 0.8;

/// Neutral starting value for performance averages.
const INITIAL_PERFORMANCE: f64 = 0.5;

/// Tracked learner state for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Exponentially-weighted average of the reward signal, in `[0, 1]`.
    pub overall_performance: f64,
    /// Per-topic weighted averages, in `[0, 1]`.
    pub topic_performance: BTreeMap<String, f64>,
    /// Per-difficulty weighted averages, indexed by level.
    pub difficulty_performance: [f64; DIFFICULTY_LEVELS],
    /// Engagement recomputed from the latest response, in `[0, 1]`.
    pub engagement_score: f64,
    /// Signed per-round change of overall performance, normalized by
    /// elapsed rounds. Zero until a second round exists to compare against.
    pub learning_velocity: f64,
    /// Topics with performance above the strength threshold.
    pub strengths: BTreeSet<String>,
    /// Topics with performance below the improvement threshold.
    pub improvement_areas: BTreeSet<String>,
    /// Union of the explicit selection and high-engagement topics.
    pub preferred_topics: BTreeSet<String>,
    /// Rounds applied so far.
    pub total_interactions: u32,
    /// Topics the student explicitly asked for at session start.
    pub selected_topics: BTreeSet<String>,
    /// Per-topic recent-engagement averages feeding `preferred_topics`.
    pub recent_engagement: BTreeMap<String, f64>,
    /// Rounds whose reward cleared the solid-answer bar.
    pub correct_responses: u32,
    /// Rounds whose reward cleared the detailed-answer bar.
    pub detailed_responses: u32,
}

impl StudentProfile {
    /// Create a fresh profile covering `topics`, with `selected` marked as
    /// the student's explicit preference.
    pub fn new(topics: &[String], selected: &[String]) -> Self {
        let topic_performance = topics
            .iter()
            .map(|t| (t.clone(), INITIAL_PERFORMANCE))
            .collect();
        let selected_topics: BTreeSet<String> = selected.iter().cloned().collect();
        let mut profile = Self {
            overall_performance: INITIAL_PERFORMANCE,
            topic_performance,
            difficulty_performance: [INITIAL_PERFORMANCE; DIFFICULTY_LEVELS],
            engagement_score: INITIAL_PERFORMANCE,
            learning_velocity: 0.0,
            strengths: BTreeSet::new(),
            improvement_areas: BTreeSet::new(),
            preferred_topics: BTreeSet::new(),
            total_interactions: 0,
            selected_topics,
            recent_engagement: BTreeMap::new(),
            correct_responses: 0,
            detailed_responses: 0,
        };
        profile.refresh_derived();
        profile
    }

    /// Whether `topic` currently sits in the improvement set.
    pub fn is_improvement_area(&self, topic: &str) -> bool {
        self.improvement_areas.contains(topic)
    }

    /// Overall performance this round's reward would produce, without
    /// mutating the profile. Used to derive the upcoming state key before
    /// the real update lands.
    pub fn projected_overall(&self, reward: f64) -> f64 {
        ((1.0 - OVERALL_ALPHA) * self.overall_performance + OVERALL_ALPHA * reward)
            .clamp(0.0, 1.0)
    }

    /// Fold one completed round into the profile.
    ///
    /// Updates the moving averages, recomputes engagement from the response,
    /// advances the interaction counter and learning velocity, and re-derives
    /// the topic sets.
    ///
    /// # Errors
    /// Returns an error if `difficulty` falls outside the served range.
    pub fn apply_round(
        &mut self,
        topic: &str,
        difficulty: usize,
        reward: f64,
        response_length: usize,
    ) -> Result<()> {
        if difficulty >= DIFFICULTY_LEVELS {
            return Err(anyhow!(
                "difficulty {} outside served range 0..={}",
                difficulty,
                DIFFICULTY_LEVELS - 1
            ));
        }

        let previous_overall = self.overall_performance;
        self.overall_performance = self.projected_overall(reward);

        let topic_entry = self
            .topic_performance
            .entry(topic.to_string())
            .or_insert(INITIAL_PERFORMANCE);
        *topic_entry = ((1.0 - TOPIC_ALPHA) * *topic_entry + TOPIC_ALPHA * reward).clamp(0.0, 1.0);

        let level = &mut self.difficulty_performance[difficulty];
        *level = ((1.0 - TOPIC_ALPHA) * *level + TOPIC_ALPHA * reward).clamp(0.0, 1.0);

        // Engagement is replaced outright from the latest response; the
        // preferred check uses the set as it stood when the question was asked.
        let topic_preferred = self.preferred_topics.contains(topic);
        self.engagement_score =
            reward::engagement_from_response(response_length, topic_preferred).clamp(0.0, 1.0);

        let recent = self
            .recent_engagement
            .entry(topic.to_string())
            .or_insert(INITIAL_PERFORMANCE);
        *recent = (1.0 - RECENT_ENGAGEMENT_ALPHA) * *recent
            + RECENT_ENGAGEMENT_ALPHA * self.engagement_score;

        self.total_interactions += 1;
        let elapsed = self.total_interactions.saturating_sub(1);
        self.learning_velocity = if elapsed == 0 {
            0.0
        } else {
            (self.overall_performance - previous_overall) / elapsed as f64
        };

        if reward > SOLID_REWARD {
            self.correct_responses += 1;
        }
        if reward > DETAILED_REWARD {
            self.detailed_responses += 1;
        }

        self.refresh_derived();
        Ok(())
    }

    /// Recompute the derived topic sets from the tracked averages.
    fn refresh_derived(&mut self) {
        self.strengths = self
            .topic_performance
            .iter()
            .filter(|(_, &perf)| perf > STRENGTH_THRESHOLD)
            .map(|(t, _)| t.clone())
            .collect();
        self.improvement_areas = self
            .topic_performance
            .iter()
            .filter(|(_, &perf)| perf < IMPROVEMENT_THRESHOLD)
            .map(|(t, _)| t.clone())
            .collect();

        let mut preferred = self.selected_topics.clone();
        for (topic, &engagement) in &self.recent_engagement {
            if engagement > HIGH_ENGAGEMENT {
                preferred.insert(topic.clone());
            }
        }
        self.preferred_topics = preferred;
    }
}
