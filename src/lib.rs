//! # Mentor
//!
//! Two-agent reinforcement learning core for adaptive tutoring sessions.
//!
//! A tabular value agent picks question difficulty, a preference-weight
//! policy agent picks the topic, and a coordinator merges their proposals
//! under one of three coordination protocols, scores each response, and
//! folds the shared reward back into both agents and the student profile.
//! Question content, response collection, and record persistence stay
//! behind narrow traits so the core runs against real collaborators or the
//! bundled scripted ones.
//!
//! ## Quick Start
//!
//! ```rust
//! use mentor_rl::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = SessionConfig::default().rounds(3);
//! let session = Coordinator::with_seed(
//!     config,
//!     TemplateBank::new(),
//!     ScriptedStudent::improving(),
//!     MemorySink::new(),
//!     7,
//! )?;
//! let summary = session.run()?;
//! assert_eq!(summary.interactions, 3);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Learning agents: difficulty selector, topic selector, state key
pub mod agent;

/// Session and agent configuration
pub mod config;

/// Round loop and coordination protocols
pub mod coordinator;

/// External collaborator contracts and scripted implementations
pub mod env;

/// Parallel batch evaluation across many sessions
pub mod eval;

/// Per-student learner state
pub mod profile;

/// Session records and persistence sinks
pub mod record;

/// Reward computation for scored responses
pub mod reward;

/// Prelude module for convenient imports
///
/// This module re-exports commonly used types and traits for convenience.
pub mod prelude {
    pub use crate::agent::{PolicyAgent, StateKey, ValueAgent};
    pub use crate::config::{PolicyAgentConfig, SessionConfig, ValueAgentConfig};
    pub use crate::coordinator::{CoordinationMode, Coordinator};
    pub use crate::env::{
        NoisyStudent, PersistenceSink, Question, QuestionBank, ResponseSource, ScriptedStudent,
        StudentResponse, TemplateBank,
    };
    pub use crate::eval::{BatchStats, SessionOutcome, SessionPool, compare_modes};
    pub use crate::profile::StudentProfile;
    pub use crate::record::{
        ChannelSink, Interaction, JsonlSink, MemorySink, ProfileSnapshot, SessionEvent,
        SessionSummary,
    };
    pub use crate::reward::{compute_reward, engagement_from_response};
}

/// Current version of mentor-rl
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
