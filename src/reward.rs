//! Reward computation for scored student responses
//!
//! This module contains the pure scoring functions that couple observed
//! responses to the learning agents: the staircase base reward, the
//! bonus/multiplier chain applied on top of it, and the engagement
//! heuristic derived from response characteristics.

use anyhow::{Result, anyhow};

/// Number of difficulty levels the system serves (levels `0..=3`).
pub const DIFFICULTY_LEVELS: usize = 4;

/// Reward multiplier per difficulty level, indexed by level.
pub const DIFFICULTY_MULTIPLIERS: [f64; DIFFICULTY_LEVELS] = [1.0, 1.1, 1.2, 1.3];

/// Response length (in characters) granted full base credit.
pub const LEN_DETAILED: usize = 120;

/// Response length granted solid base credit.
pub const LEN_SOLID: usize = 60;

/// Response length granted partial base credit.
pub const LEN_BRIEF: usize = 20;

/// Base reward tiers matching the length thresholds above.
pub const BASE_DETAILED: f64 = 1.0;
/// Base reward for responses of at least [`LEN_SOLID`] characters.
pub const BASE_SOLID: f64 = 0.7;
/// Base reward for responses of at least [`LEN_BRIEF`] characters.
pub const BASE_BRIEF: f64 = 0.4;
/// Base reward for anything shorter.
pub const BASE_MINIMAL: f64 = 0.1;

/// Multiplier applied when the topic is one of the student's improvement areas.
pub const IMPROVEMENT_AREA_BONUS: f64 = 1.2;

/// Scale of the engagement contribution to the final reward.
pub const ENGAGEMENT_WEIGHT: f64 = 0.2;

/// Weight of response length in the engagement heuristic.
const ENGAGEMENT_LENGTH_WEIGHT: f64 = 0.6;

/// Weight of topic affinity in the engagement heuristic.
const ENGAGEMENT_TOPIC_WEIGHT: f64 = 0.4;

/// Topic affinity assigned to topics outside the preferred set.
const NEUTRAL_TOPIC_AFFINITY: f64 = 0.5;

/// Compute the scalar reward for one scored response.
///
/// The base reward is a strict staircase over response length (never
/// interpolated), then scaled by the improvement-area bonus, the
/// difficulty multiplier, and the engagement multiplier `1 + 0.2 * engagement`.
///
/// # Arguments
/// * `response_length` - Length of the response text in characters
/// * `topic` - Topic the question was drawn from
/// * `difficulty` - Difficulty level, must be in `0..=3`
/// * `engagement` - Current engagement score in `[0, 1]`
/// * `is_improvement_area` - Whether the topic is a tracked improvement area
///
/// # Errors
/// Returns an error if `difficulty` falls outside the served range.
pub fn compute_reward(
    response_length: usize,
    topic: &str,
    difficulty: usize,
    engagement: f64,
    is_improvement_area: bool,
) -> Result<f64> {
    if difficulty >= DIFFICULTY_LEVELS {
        return Err(anyhow!(
            "difficulty {} outside served range 0..={}",
            difficulty,
            DIFFICULTY_LEVELS - 1
        ));
    }

    let base = if response_length >= LEN_DETAILED {
        BASE_DETAILED
    } else if response_length >= LEN_SOLID {
        BASE_SOLID
    } else if response_length >= LEN_BRIEF {
        BASE_BRIEF
    } else {
        BASE_MINIMAL
    };

    let topic_bonus = if is_improvement_area {
        IMPROVEMENT_AREA_BONUS
    } else {
        1.0
    };
    let difficulty_multiplier = DIFFICULTY_MULTIPLIERS[difficulty];
    let engagement_multiplier = 1.0 + ENGAGEMENT_WEIGHT * engagement;

    let reward = base * topic_bonus * difficulty_multiplier * engagement_multiplier;
    tracing::trace!(
        topic,
        difficulty,
        response_length,
        reward,
        "scored response"
    );
    Ok(reward)
}

/// Derive an engagement score in `[0, 1]` from response characteristics.
///
/// Combines how substantial the response was (length relative to the
/// detailed-answer threshold) with whether the question's topic sits in
/// the student's preferred set.
pub fn engagement_from_response(response_length: usize, topic_preferred: bool) -> f64 {
    let length_signal = (response_length as f64 / LEN_DETAILED as f64).min(1.0);
    let topic_affinity = if topic_preferred {
        1.0
    } else {
        NEUTRAL_TOPIC_AFFINITY
    };
    ENGAGEMENT_LENGTH_WEIGHT * length_signal + ENGAGEMENT_TOPIC_WEIGHT * topic_affinity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward_for_length(len: usize) -> f64 {
        compute_reward(len, "algebra", 0, 0.0, false).unwrap()
    }

    #[test]
    fn test_staircase_boundaries() {
        assert_eq!(reward_for_length(0), BASE_MINIMAL);
        assert_eq!(reward_for_length(19), BASE_MINIMAL);
        assert_eq!(reward_for_length(20), BASE_BRIEF);
        assert_eq!(reward_for_length(59), BASE_BRIEF);
        assert_eq!(reward_for_length(60), BASE_SOLID);
        assert_eq!(reward_for_length(119), BASE_SOLID);
        assert_eq!(reward_for_length(120), BASE_DETAILED);
        assert_eq!(reward_for_length(10_000), BASE_DETAILED);
    }

    #[test]
    fn test_non_decreasing_in_length() {
        let mut previous = 0.0;
        for len in 0..300 {
            let reward = reward_for_length(len);
            assert!(
                reward >= previous,
                "reward decreased at length {}: {} < {}",
                len,
                reward,
                previous
            );
            previous = reward;
        }
    }

    #[test]
    fn test_multiplier_chain() {
        // 1.0 base * 1.2 improvement * 1.1 (difficulty 1) * 1.1 (engagement 0.5)
        let reward = compute_reward(125, "calculus", 1, 0.5, true).unwrap();
        assert!((reward - 1.452).abs() < 1e-9);

        // Minimal base through the same chain.
        let reward = compute_reward(10, "calculus", 1, 0.5, true).unwrap();
        assert!((reward - 0.1452).abs() < 1e-9);
    }

    #[test]
    fn test_difficulty_out_of_range() {
        assert!(compute_reward(50, "algebra", 4, 0.5, false).is_err());
        assert!(compute_reward(50, "algebra", usize::MAX, 0.5, false).is_err());
    }

    #[test]
    fn test_difficulty_multipliers_applied() {
        for difficulty in 0..DIFFICULTY_LEVELS {
            let reward = compute_reward(125, "algebra", difficulty, 0.0, false).unwrap();
            assert!((reward - DIFFICULTY_MULTIPLIERS[difficulty]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_engagement_heuristic_range() {
        for len in [0, 10, 60, 120, 500] {
            for preferred in [false, true] {
                let engagement = engagement_from_response(len, preferred);
                assert!((0.0..=1.0).contains(&engagement));
            }
        }
        // A detailed response on a preferred topic saturates the heuristic.
        assert!((engagement_from_response(120, true) - 1.0).abs() < 1e-9);
        // An empty response on a neutral topic keeps only the affinity floor.
        assert!((engagement_from_response(0, false) - 0.2).abs() < 1e-9);
    }
}
