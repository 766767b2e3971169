//! Session coordinator
//!
//! Runs the fixed per-round sequence for a configured number of rounds:
//! observe the profile, merge the two agents' proposals into one action,
//! present a question, collect and score the response, update both agents
//! and the profile, then persist the finalized record. The coordination
//! mode governs only how proposals merge; both agents always update from
//! the shared reward so learning continues regardless of who decided.

pub mod mode;

pub use mode::CoordinationMode;

use crate::agent::{PolicyAgent, StateKey, ValueAgent};
use crate::config::SessionConfig;
use crate::env::{PersistenceSink, QuestionBank, ResponseSource};
use crate::profile::StudentProfile;
use crate::record::{Interaction, ProfileSnapshot, SessionSummary};
use crate::reward;
use anyhow::{Context, Result, anyhow};

/// Merged outcome of one decide phase.
///
/// Keeps each agent's own proposal alongside the action actually served,
/// since agents later update against their own proposals.
#[derive(Debug, Clone)]
struct Decision {
    topic: String,
    difficulty: usize,
    value_action: usize,
    policy_topic: String,
}

/// Orchestrates one tutoring session over external collaborators.
///
/// The coordinator owns the profile and both agents for the session's
/// duration. All data exchange between agents flows through explicit
/// arguments here; the agents never reference each other.
pub struct Coordinator<B, R, S> {
    config: SessionConfig,
    value_agent: ValueAgent,
    policy_agent: PolicyAgent,
    profile: StudentProfile,
    bank: B,
    student: R,
    sink: S,
    round: u32,
    cumulative_reward: f64,
    start_performance: f64,
}

impl<B, R, S> Coordinator<B, R, S>
where
    B: QuestionBank,
    R: ResponseSource,
    S: PersistenceSink,
{
    /// Create a session with entropy-seeded exploration.
    ///
    /// # Errors
    /// Fails fast on an invalid configuration.
    pub fn new(config: SessionConfig, bank: B, student: R, sink: S) -> Result<Self> {
        config.validate()?;
        let value_agent = ValueAgent::new(config.value.clone());
        let policy_agent = PolicyAgent::new(config.policy.clone(), &config.topics);
        Ok(Self::assemble(config, value_agent, policy_agent, bank, student, sink))
    }

    /// Create a session whose exploration is reproducible from `seed`.
    pub fn with_seed(
        config: SessionConfig,
        bank: B,
        student: R,
        sink: S,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        let value_agent = ValueAgent::with_seed(config.value.clone(), seed);
        let policy_agent = PolicyAgent::new(config.policy.clone(), &config.topics);
        Ok(Self::assemble(config, value_agent, policy_agent, bank, student, sink))
    }

    /// Create a session around pre-built agents, e.g. ones carrying state
    /// from elsewhere.
    pub fn with_agents(
        config: SessionConfig,
        value_agent: ValueAgent,
        policy_agent: PolicyAgent,
        bank: B,
        student: R,
        sink: S,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, value_agent, policy_agent, bank, student, sink))
    }

    fn assemble(
        config: SessionConfig,
        value_agent: ValueAgent,
        policy_agent: PolicyAgent,
        bank: B,
        student: R,
        sink: S,
    ) -> Self {
        let profile = StudentProfile::new(&config.topics, &config.preferred_topics);
        let start_performance = profile.overall_performance;
        Self {
            config,
            value_agent,
            policy_agent,
            profile,
            bank,
            student,
            sink,
            round: 0,
            cumulative_reward: 0.0,
            start_performance,
        }
    }

    /// The student profile as it currently stands.
    pub fn profile(&self) -> &StudentProfile {
        &self.profile
    }

    /// The difficulty-selecting agent.
    pub fn value_agent(&self) -> &ValueAgent {
        &self.value_agent
    }

    /// The topic-selecting agent.
    pub fn policy_agent(&self) -> &PolicyAgent {
        &self.policy_agent
    }

    /// Rounds completed so far.
    pub fn rounds_completed(&self) -> u32 {
        self.round
    }

    /// Reward accumulated so far.
    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }

    /// Run every remaining round, then finish the session.
    pub fn run(mut self) -> Result<SessionSummary> {
        tracing::info!(
            mode = %self.config.mode,
            rounds = self.config.rounds,
            topics = ?self.config.topics,
            "session starting"
        );
        while self.round < self.config.rounds {
            self.run_round()?;
        }
        self.finish()
    }

    /// Run one round of the session.
    ///
    /// A failure before the update phases leaves every piece of session
    /// state untouched, so the round can be retried or the session dropped
    /// cleanly at the boundary.
    ///
    /// # Errors
    /// Fails if the session is already complete, if the question bank
    /// cannot serve the decided action, or if response collection or
    /// persistence fail.
    pub fn run_round(&mut self) -> Result<Interaction> {
        if self.round >= self.config.rounds {
            return Err(anyhow!(
                "session already complete after {} rounds",
                self.round
            ));
        }
        let round = self.round + 1;

        // 1. Observe the profile as the round opens.
        let state = StateKey::derive(
            self.profile.total_interactions,
            self.profile.overall_performance,
        );
        let engagement = self.profile.engagement_score;

        // 2. Decide: merge both agents' proposals per the coordination mode.
        let decision = self.decide(state)?;

        // 3. Present: the bank must serve exactly the decided action. A miss
        //    aborts the round; substituting content would decouple the agents
        //    from the action they decided.
        let question = self
            .bank
            .fetch(&decision.topic, decision.difficulty)
            .with_context(|| {
                format!(
                    "question bank could not serve topic {:?} at difficulty {}",
                    decision.topic, decision.difficulty
                )
            })?;

        // 4. Collect the response.
        let response = self.student.respond(&question)?;
        let response_length = response.len();

        // 5. Score it against the profile as observed.
        let is_improvement = self.profile.is_improvement_area(&decision.topic);
        let reward_value = reward::compute_reward(
            response_length,
            &decision.topic,
            decision.difficulty,
            engagement,
            is_improvement,
        )?;
        self.cumulative_reward += reward_value;

        // 6. Update both agents from the shared reward, each against its own
        //    proposal. The next state key is derived from where the profile
        //    will land once this round is folded in.
        let next_state = StateKey::derive(
            self.profile.total_interactions + 1,
            self.profile.projected_overall(reward_value),
        );
        self.value_agent.update(
            state,
            decision.value_action,
            reward_value,
            next_state,
            self.profile.learning_velocity,
        )?;
        self.policy_agent
            .update(&decision.policy_topic, reward_value, engagement);

        // 7. Fold the round into the profile.
        self.profile.apply_round(
            &decision.topic,
            decision.difficulty,
            reward_value,
            response_length,
        )?;
        self.round = round;

        // 8. Persist the finalized record.
        let interaction = Interaction {
            round,
            topic: decision.topic,
            difficulty: decision.difficulty,
            response_length,
            reward: reward_value,
            value_action: decision.value_action,
            policy_topic: decision.policy_topic,
            mode: self.config.mode,
            cumulative_reward: self.cumulative_reward,
            profile: ProfileSnapshot::from(&self.profile),
        };
        self.sink.record(&interaction)?;

        tracing::info!(
            round,
            topic = %interaction.topic,
            difficulty = interaction.difficulty,
            reward = reward_value,
            cumulative = self.cumulative_reward,
            "round complete"
        );
        Ok(interaction)
    }

    /// Finish the session: emit the summary and hand it back.
    ///
    /// Finishing early, before every configured round has run, is a valid
    /// way to stop a session at a round boundary.
    pub fn finish(mut self) -> Result<SessionSummary> {
        let summary = SessionSummary::new(
            self.config.mode,
            &self.profile,
            self.cumulative_reward,
            self.start_performance,
            self.value_agent.updates,
            self.policy_agent.updates,
        );
        self.sink.finish(&summary)?;
        tracing::info!(
            rounds = summary.interactions,
            cumulative = summary.cumulative_reward,
            trend = %summary.improvement_trend,
            "session complete"
        );
        Ok(summary)
    }

    fn decide(&mut self, state: StateKey) -> Result<Decision> {
        match self.config.mode {
            CoordinationMode::Hierarchical => {
                // Topic is the strategic call and lands first; difficulty
                // follows with the topic as passed-through context.
                let policy_topic = self.select_topic()?;
                let value_action = self.value_agent.select_action(state);
                tracing::debug!(topic = %policy_topic, difficulty = value_action, "hierarchical decision");
                Ok(Decision {
                    topic: policy_topic.clone(),
                    difficulty: value_action,
                    value_action,
                    policy_topic,
                })
            }
            CoordinationMode::Collaborative => {
                // Independent decisions, combined as-is.
                let value_action = self.value_agent.select_action(state);
                let policy_topic = self.select_topic()?;
                tracing::debug!(topic = %policy_topic, difficulty = value_action, "collaborative decision");
                Ok(Decision {
                    topic: policy_topic.clone(),
                    difficulty: value_action,
                    value_action,
                    policy_topic,
                })
            }
            CoordinationMode::Competitive => {
                let value_action = self.value_agent.select_action(state);
                let policy_topic = self.select_topic()?;
                // Higher self-reported performance takes authority over both
                // dimensions; ties defer to the policy agent.
                if self.value_agent.performance > self.policy_agent.performance {
                    let topic = self
                        .value_agent
                        .propose_topic(&self.profile, &self.config.topics)
                        .ok_or_else(|| anyhow!("no topics configured"))?;
                    tracing::debug!(winner = "value", topic = %topic, difficulty = value_action, "competitive decision");
                    Ok(Decision {
                        topic,
                        difficulty: value_action,
                        value_action,
                        policy_topic,
                    })
                } else {
                    let difficulty = self.policy_agent.propose_difficulty(&self.profile);
                    tracing::debug!(winner = "policy", topic = %policy_topic, difficulty, "competitive decision");
                    Ok(Decision {
                        topic: policy_topic.clone(),
                        difficulty,
                        value_action,
                        policy_topic,
                    })
                }
            }
        }
    }

    fn select_topic(&self) -> Result<String> {
        self.policy_agent
            .select_action(&self.profile)
            .ok_or_else(|| anyhow!("no topics available for selection"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PolicyAgentConfig, ValueAgentConfig};
    use crate::env::Question;
    use crate::env::scripted::{ScriptedStudent, TemplateBank};
    use crate::record::MemorySink;
    use crate::reward::DIFFICULTY_LEVELS;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    struct EmptyBank;

    impl QuestionBank for EmptyBank {
        fn fetch(&mut self, topic: &str, _difficulty: usize) -> Result<Question> {
            Err(anyhow!("no questions stocked for {:?}", topic))
        }
    }

    #[test]
    fn test_session_runs_all_rounds() {
        let mut sink = MemorySink::new();
        let config = SessionConfig::default();
        let rounds = config.rounds;
        let coordinator = Coordinator::with_seed(
            config,
            TemplateBank::new(),
            ScriptedStudent::improving(),
            &mut sink,
            3,
        )
        .unwrap();
        let summary = coordinator.run().unwrap();

        assert_eq!(summary.interactions, rounds);
        assert_eq!(summary.value_updates, rounds);
        assert_eq!(summary.policy_updates, rounds);
        assert_eq!(sink.interactions.len(), rounds as usize);
        for (i, interaction) in sink.interactions.iter().enumerate() {
            assert_eq!(interaction.round, i as u32 + 1);
            assert!(interaction.difficulty < DIFFICULTY_LEVELS);
            assert!(interaction.reward > 0.0);
        }
        let total: f64 = sink.interactions.iter().map(|i| i.reward).sum();
        assert!((summary.cumulative_reward - total).abs() < 1e-9);
        assert_eq!(
            sink.interactions.last().map(|i| i.cumulative_reward),
            Some(summary.cumulative_reward)
        );
        assert!(sink.summary.is_some());
    }

    #[test]
    fn test_run_round_after_completion_errors() {
        let config = SessionConfig::default().rounds(1);
        let mut coordinator = Coordinator::with_seed(
            config,
            TemplateBank::new(),
            ScriptedStudent::improving(),
            MemorySink::new(),
            3,
        )
        .unwrap();
        coordinator.run_round().unwrap();
        assert!(coordinator.run_round().is_err());
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = SessionConfig::default().rounds(0);
        let result = Coordinator::new(
            config,
            TemplateBank::new(),
            ScriptedStudent::improving(),
            MemorySink::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_hierarchical_combines_policy_topic_with_value_difficulty() {
        let config = SessionConfig::default()
            .mode(CoordinationMode::Hierarchical)
            .rounds(1);
        let mut coordinator = Coordinator::with_seed(
            config,
            TemplateBank::new(),
            ScriptedStudent::improving(),
            MemorySink::new(),
            11,
        )
        .unwrap();
        let interaction = coordinator.run_round().unwrap();
        assert_eq!(interaction.topic, interaction.policy_topic);
        assert_eq!(interaction.difficulty, interaction.value_action);
    }

    #[test]
    fn test_competitive_value_agent_takes_both_dimensions() {
        let config = SessionConfig::default()
            .mode(CoordinationMode::Competitive)
            .topics(strings(&["alpha", "beta"]))
            .preferred_topics(strings(&["beta"]));

        let mut value_agent = ValueAgent::with_seed(ValueAgentConfig::default(), 5);
        value_agent.performance = 0.9;
        let mut policy_agent = PolicyAgent::new(PolicyAgentConfig::default(), &config.topics);
        policy_agent.performance = 0.2;

        let mut coordinator = Coordinator::with_agents(
            config,
            value_agent,
            policy_agent,
            TemplateBank::new(),
            ScriptedStudent::improving(),
            MemorySink::new(),
        )
        .unwrap();
        let interaction = coordinator.run_round().unwrap();

        // The preferred boost steers the policy agent to beta, but the value
        // agent holds authority and serves its own pick on both dimensions.
        assert_eq!(interaction.policy_topic, "beta");
        assert_eq!(interaction.topic, "alpha");
        assert_eq!(interaction.difficulty, interaction.value_action);
        // The losing agent still learned from the shared reward.
        assert_eq!(coordinator.policy_agent().updates, 1);
        assert_eq!(coordinator.value_agent().updates, 1);
    }

    #[test]
    fn test_competitive_tie_defers_to_policy_agent() {
        let config = SessionConfig::default()
            .mode(CoordinationMode::Competitive)
            .topics(strings(&["alpha", "beta"]));

        let value_agent = ValueAgent::with_seed(ValueAgentConfig::default(), 5);
        let policy_agent = PolicyAgent::new(PolicyAgentConfig::default(), &config.topics);
        assert_eq!(value_agent.performance, policy_agent.performance);

        let mut coordinator = Coordinator::with_agents(
            config,
            value_agent,
            policy_agent,
            TemplateBank::new(),
            ScriptedStudent::improving(),
            MemorySink::new(),
        )
        .unwrap();
        let interaction = coordinator.run_round().unwrap();

        assert_eq!(interaction.topic, interaction.policy_topic);
        // Policy-led difficulty for a fresh profile sits at the 0.5 band.
        assert_eq!(interaction.difficulty, 2);
    }

    #[test]
    fn test_bank_failure_aborts_round_without_state_change() {
        let config = SessionConfig::default();
        let mut coordinator = Coordinator::with_seed(
            config,
            EmptyBank,
            ScriptedStudent::improving(),
            MemorySink::new(),
            3,
        )
        .unwrap();
        assert!(coordinator.run_round().is_err());
        assert_eq!(coordinator.rounds_completed(), 0);
        assert_eq!(coordinator.profile().total_interactions, 0);
        assert_eq!(coordinator.value_agent().updates, 0);
        assert_eq!(coordinator.policy_agent().updates, 0);
        assert_eq!(coordinator.cumulative_reward(), 0.0);
    }

    #[test]
    fn test_early_finish_reports_partial_session() {
        let config = SessionConfig::default();
        let mut sink = MemorySink::new();
        let mut coordinator = Coordinator::with_seed(
            config,
            TemplateBank::new(),
            ScriptedStudent::improving(),
            &mut sink,
            3,
        )
        .unwrap();
        coordinator.run_round().unwrap();
        coordinator.run_round().unwrap();
        let summary = coordinator.finish().unwrap();
        assert_eq!(summary.interactions, 2);
        assert_eq!(sink.interactions.len(), 2);
    }
}
