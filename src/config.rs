//! Session and agent configuration
//!
//! Configuration is validated up front, at session construction. Anything
//! malformed fails fast with a descriptive error instead of being silently
//! defaulted, since a bad hyperparameter discovered mid-session would leave
//! the agents' tables in an inconsistent state.

use crate::coordinator::CoordinationMode;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default number of rounds per session.
pub const DEFAULT_ROUNDS: u32 = 7;

/// Hyperparameters for the value agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueAgentConfig {
    /// Base temporal-difference step size.
    pub learning_rate: f64,
    /// Initial exploration rate.
    pub epsilon: f64,
    /// Multiplicative exploration decay applied after each update.
    pub epsilon_decay: f64,
    /// Exploration floor; epsilon never decays below this.
    pub epsilon_min: f64,
    /// Discount factor for bootstrapped targets.
    pub gamma: f64,
}

impl Default for ValueAgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epsilon: 0.2,
            epsilon_decay: 0.95,
            epsilon_min: 0.01,
            gamma: 0.9,
        }
    }
}

impl ValueAgentConfig {
    /// Validate hyperparameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.learning_rate <= 0.0 {
            return Err(anyhow!("learning_rate must be positive"));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(anyhow!("epsilon must be in [0, 1]"));
        }
        if self.epsilon_decay <= 0.0 || self.epsilon_decay > 1.0 {
            return Err(anyhow!("epsilon_decay must be in (0, 1]"));
        }
        if self.epsilon_min < 0.0 || self.epsilon_min > self.epsilon {
            return Err(anyhow!("epsilon_min must be in [0, epsilon]"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(anyhow!("gamma must be in [0, 1]"));
        }
        Ok(())
    }
}

/// Hyperparameters for the policy agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyAgentConfig {
    /// Step size for weight updates.
    pub learning_rate: f64,
    /// Step size for the running baseline estimate.
    pub baseline_rate: f64,
    /// Half-width of the allowed new-to-old weight ratio window.
    pub clip_epsilon: f64,
}

impl Default for PolicyAgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            baseline_rate: 0.1,
            clip_epsilon: 0.2,
        }
    }
}

impl PolicyAgentConfig {
    /// Validate hyperparameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.learning_rate <= 0.0 {
            return Err(anyhow!("learning_rate must be positive"));
        }
        if self.baseline_rate <= 0.0 || self.baseline_rate > 1.0 {
            return Err(anyhow!("baseline_rate must be in (0, 1]"));
        }
        if self.clip_epsilon <= 0.0 || self.clip_epsilon >= 1.0 {
            return Err(anyhow!("clip_epsilon must be in (0, 1)"));
        }
        Ok(())
    }
}

/// Full configuration for one tutoring session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Rounds to run before the session ends.
    pub rounds: u32,
    /// Protocol for merging the two agents' decisions.
    pub mode: CoordinationMode,
    /// Topics the session may draw questions from.
    pub topics: Vec<String>,
    /// Topics the student explicitly asked for; must be a subset of `topics`.
    pub preferred_topics: Vec<String>,
    /// Value agent hyperparameters.
    pub value: ValueAgentConfig,
    /// Policy agent hyperparameters.
    pub policy: PolicyAgentConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            mode: CoordinationMode::default(),
            topics: vec![
                "RL Fundamentals".to_string(),
                "Q-Learning".to_string(),
                "Policy Gradients".to_string(),
                "Multi-Agent Systems".to_string(),
            ],
            preferred_topics: Vec::new(),
            value: ValueAgentConfig::default(),
            policy: PolicyAgentConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the full configuration, including both agent configs.
    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(anyhow!("rounds must be positive"));
        }
        if self.topics.is_empty() {
            return Err(anyhow!("at least one topic is required"));
        }
        for (i, topic) in self.topics.iter().enumerate() {
            if topic.trim().is_empty() {
                return Err(anyhow!("topic at index {} is blank", i));
            }
            if self.topics[..i].contains(topic) {
                return Err(anyhow!("duplicate topic {:?}", topic));
            }
        }
        for preferred in &self.preferred_topics {
            if !self.topics.contains(preferred) {
                return Err(anyhow!(
                    "preferred topic {:?} is not in the topic list",
                    preferred
                ));
            }
        }
        self.value.validate()?;
        self.policy.validate()?;
        Ok(())
    }

    /// Set the round count.
    pub fn rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    /// Set the coordination mode.
    pub fn mode(mut self, mode: CoordinationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the topic list.
    pub fn topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    /// Set the explicitly preferred topics.
    pub fn preferred_topics(mut self, preferred: Vec<String>) -> Self {
        self.preferred_topics = preferred;
        self
    }

    /// Set the value agent hyperparameters.
    pub fn value(mut self, value: ValueAgentConfig) -> Self {
        self.value = value;
        self
    }

    /// Set the policy agent hyperparameters.
    pub fn policy(mut self, policy: PolicyAgentConfig) -> Self {
        self.policy = policy;
        self
    }
}
