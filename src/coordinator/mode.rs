//! Coordination protocols for merging the two agents' decisions

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the two agents' proposals merge into one action per round.
///
/// The mode is chosen once per session and never changes mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinationMode {
    /// Policy agent sets the topic first, value agent then sets difficulty.
    Hierarchical,
    /// Both agents decide independently; topic and difficulty combine as-is.
    Collaborative,
    /// The agent with the higher performance score supplies both topic and
    /// difficulty; the other still updates from the shared reward.
    Competitive,
}

impl CoordinationMode {
    /// Every protocol, in a fixed order. Useful for mode sweeps.
    pub const ALL: [CoordinationMode; 3] = [
        CoordinationMode::Hierarchical,
        CoordinationMode::Collaborative,
        CoordinationMode::Competitive,
    ];

    /// Canonical lowercase name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinationMode::Hierarchical => "hierarchical",
            CoordinationMode::Collaborative => "collaborative",
            CoordinationMode::Competitive => "competitive",
        }
    }
}

impl Default for CoordinationMode {
    fn default() -> Self {
        CoordinationMode::Collaborative
    }
}

impl fmt::Display for CoordinationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoordinationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hierarchical" => Ok(CoordinationMode::Hierarchical),
            "collaborative" => Ok(CoordinationMode::Collaborative),
            "competitive" => Ok(CoordinationMode::Competitive),
            other => Err(anyhow!(
                "unknown coordination mode {:?}, expected hierarchical, collaborative, or competitive",
                other
            )),
        }
    }
}
