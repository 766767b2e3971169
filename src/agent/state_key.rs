//! Discretized state identifier for the value agent's table
//!
//! The key encoding is defined once here so every component that needs to
//! reference learner state derives it the same way. Keys combine a coarse
//! session-phase bucket (from the interaction count) with a performance
//! band, which keeps the table small enough that keys reoccur and
//! accumulate signal over a session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interactions per session phase bucket.
const INTERACTIONS_PER_PHASE: u32 = 3;

/// Highest phase bucket; later interactions all collapse into it.
const MAX_PHASE: u8 = 3;

/// Number of performance bands across `[0, 1]`.
const PERFORMANCE_BANDS: u8 = 5;

/// Table key for the value agent, derived from learner state.
///
/// Two learners with the same interaction-count bucket and the same
/// performance band always produce the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    /// Session phase bucket in `0..=3`.
    pub phase: u8,
    /// Overall-performance band in `0..=4`.
    pub band: u8,
}

impl StateKey {
    /// Derive the key for a given interaction count and overall performance.
    pub fn derive(total_interactions: u32, overall_performance: f64) -> Self {
        let phase = ((total_interactions / INTERACTIONS_PER_PHASE).min(MAX_PHASE as u32)) as u8;
        let clamped = overall_performance.clamp(0.0, 1.0);
        let band = ((clamped * PERFORMANCE_BANDS as f64) as u8).min(PERFORMANCE_BANDS - 1);
        Self { phase, band }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}b{}", self.phase, self.band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_identical_inputs_identical_keys() {
        let a = StateKey::derive(4, 0.62);
        let b = StateKey::derive(4, 0.62);
        assert_eq!(a, b);

        // Same buckets, different raw values.
        assert_eq!(StateKey::derive(3, 0.60), StateKey::derive(5, 0.79));
    }

    #[test]
    fn test_phase_buckets() {
        assert_eq!(StateKey::derive(0, 0.5).phase, 0);
        assert_eq!(StateKey::derive(2, 0.5).phase, 0);
        assert_eq!(StateKey::derive(3, 0.5).phase, 1);
        assert_eq!(StateKey::derive(8, 0.5).phase, 2);
        assert_eq!(StateKey::derive(9, 0.5).phase, 3);
        assert_eq!(StateKey::derive(1_000, 0.5).phase, 3);
        // Counts whose raw quotient exceeds u8 range still clamp to the top.
        assert_eq!(StateKey::derive(768, 0.5).phase, 3);
        assert_eq!(StateKey::derive(u32::MAX, 0.5).phase, 3);
    }

    #[test]
    fn test_performance_bands() {
        assert_eq!(StateKey::derive(0, 0.0).band, 0);
        assert_eq!(StateKey::derive(0, 0.19).band, 0);
        assert_eq!(StateKey::derive(0, 0.2).band, 1);
        assert_eq!(StateKey::derive(0, 0.5).band, 2);
        assert_eq!(StateKey::derive(0, 0.99).band, 4);
        assert_eq!(StateKey::derive(0, 1.0).band, 4);
        // Out-of-range inputs clamp rather than overflow.
        assert_eq!(StateKey::derive(0, -3.0).band, 0);
        assert_eq!(StateKey::derive(0, 7.5).band, 4);
    }

    #[test]
    fn test_key_space_is_bounded() {
        let mut seen = BTreeSet::new();
        for interactions in 0..50 {
            for tenths in 0..=10 {
                seen.insert(StateKey::derive(interactions, tenths as f64 / 10.0));
            }
        }
        assert!(seen.len() <= 20, "expected at most 20 keys, saw {}", seen.len());
    }

    #[test]
    fn test_display_encoding() {
        assert_eq!(StateKey::derive(4, 0.85).to_string(), "p1b4");
        assert_eq!(StateKey::derive(0, 0.0).to_string(), "p0b0");
    }
}
