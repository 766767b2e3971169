//! Session records and persistence sinks
//!
//! Each round produces one immutable [`Interaction`]; the session ends with
//! one [`SessionSummary`]. Records are created exactly once, handed to a
//! [`PersistenceSink`](crate::env::PersistenceSink) append-only, and never
//! mutated afterwards. Three sinks ship with the crate: an in-memory buffer
//! for tests and batch evaluation, a channel sink for fire-and-forget
//! routing to a consumer thread, and a JSON-lines file sink.

use crate::coordinator::CoordinationMode;
use crate::env::PersistenceSink;
use crate::profile::StudentProfile;
use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Overall-performance gain that counts a session as improving (or, negated,
/// declining).
const TREND_MARGIN: f64 = 0.05;

/// Engagement above this reads as high, above half of it as moderate.
const HIGH_ENGAGEMENT: f64 = 0.7;
const MODERATE_ENGAGEMENT: f64 = 0.4;

/// Profile state captured after a round's update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    /// Overall performance after the update.
    pub overall_performance: f64,
    /// Engagement recomputed from this round's response.
    pub engagement_score: f64,
    /// Learning velocity after the update.
    pub learning_velocity: f64,
    /// Per-topic performance averages.
    pub topic_performance: BTreeMap<String, f64>,
    /// Current strength topics.
    pub strengths: BTreeSet<String>,
    /// Current improvement-area topics.
    pub improvement_areas: BTreeSet<String>,
    /// Rounds applied so far.
    pub total_interactions: u32,
}

impl From<&StudentProfile> for ProfileSnapshot {
    fn from(profile: &StudentProfile) -> Self {
        Self {
            overall_performance: profile.overall_performance,
            engagement_score: profile.engagement_score,
            learning_velocity: profile.learning_velocity,
            topic_performance: profile.topic_performance.clone(),
            strengths: profile.strengths.clone(),
            improvement_areas: profile.improvement_areas.clone(),
            total_interactions: profile.total_interactions,
        }
    }
}

/// One finalized round, write-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Round index, starting at 1.
    pub round: u32,
    /// Topic actually served.
    pub topic: String,
    /// Difficulty actually served.
    pub difficulty: usize,
    /// Response length in characters.
    pub response_length: usize,
    /// Computed reward for the round.
    pub reward: f64,
    /// Difficulty the value agent proposed this round.
    pub value_action: usize,
    /// Topic the policy agent proposed this round.
    pub policy_topic: String,
    /// Coordination mode the session runs under.
    pub mode: CoordinationMode,
    /// Reward accumulated through this round.
    pub cumulative_reward: f64,
    /// Profile state after this round's update.
    pub profile: ProfileSnapshot,
}

/// Aggregate totals emitted at session end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Coordination mode the session ran under.
    pub mode: CoordinationMode,
    /// Rounds completed.
    pub interactions: u32,
    /// Total reward across the session.
    pub cumulative_reward: f64,
    /// Overall performance at session start.
    pub start_performance: f64,
    /// Overall performance at session end.
    pub end_performance: f64,
    /// Updates applied by the value agent.
    pub value_updates: u32,
    /// Updates applied by the policy agent.
    pub policy_updates: u32,
    /// Rounds whose reward cleared the solid-answer bar.
    pub correct_responses: u32,
    /// Rounds whose reward cleared the detailed-answer bar.
    pub detailed_responses: u32,
    /// Coarse trend label: improving, steady, or declining.
    pub improvement_trend: String,
    /// Coarse engagement label: high, moderate, or low.
    pub engagement_level: String,
}

impl SessionSummary {
    /// Assemble the summary from the final profile and session totals.
    pub fn new(
        mode: CoordinationMode,
        profile: &StudentProfile,
        cumulative_reward: f64,
        start_performance: f64,
        value_updates: u32,
        policy_updates: u32,
    ) -> Self {
        let gain = profile.overall_performance - start_performance;
        let improvement_trend = if gain > TREND_MARGIN {
            "improving"
        } else if gain < -TREND_MARGIN {
            "declining"
        } else {
            "steady"
        };
        let engagement_level = if profile.engagement_score > HIGH_ENGAGEMENT {
            "high"
        } else if profile.engagement_score > MODERATE_ENGAGEMENT {
            "moderate"
        } else {
            "low"
        };
        Self {
            mode,
            interactions: profile.total_interactions,
            cumulative_reward,
            start_performance,
            end_performance: profile.overall_performance,
            value_updates,
            policy_updates,
            correct_responses: profile.correct_responses,
            detailed_responses: profile.detailed_responses,
            improvement_trend: improvement_trend.to_string(),
            engagement_level: engagement_level.to_string(),
        }
    }
}

/// One persisted event: either a round record or the closing summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SessionEvent {
    /// A finalized round.
    Interaction(Interaction),
    /// The end-of-session summary.
    Summary(SessionSummary),
}

/// Sink that buffers records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Interactions in emission order.
    pub interactions: Vec<Interaction>,
    /// Summary, present once the session finished.
    pub summary: Option<SessionSummary>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceSink for MemorySink {
    fn record(&mut self, interaction: &Interaction) -> Result<()> {
        self.interactions.push(interaction.clone());
        Ok(())
    }

    fn finish(&mut self, summary: &SessionSummary) -> Result<()> {
        self.summary = Some(summary.clone());
        Ok(())
    }
}

/// Sink that forwards events over a channel to a consumer thread.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<SessionEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn unbounded() -> (Self, Receiver<SessionEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }

    fn send(&self, event: SessionEvent) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|_| anyhow!("record channel disconnected"))
    }
}

impl PersistenceSink for ChannelSink {
    fn record(&mut self, interaction: &Interaction) -> Result<()> {
        self.send(SessionEvent::Interaction(interaction.clone()))
    }

    fn finish(&mut self, summary: &SessionSummary) -> Result<()> {
        self.send(SessionEvent::Summary(summary.clone()))
    }
}

/// Sink that appends one JSON document per event to a file.
#[derive(Debug)]
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Create (or truncate) the file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn write_event(&mut self, event: &SessionEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    /// Read every event back from a file written by this sink.
    pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<SessionEvent>> {
        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }
}

impl PersistenceSink for JsonlSink {
    fn record(&mut self, interaction: &Interaction) -> Result<()> {
        self.write_event(&SessionEvent::Interaction(interaction.clone()))
    }

    fn finish(&mut self, summary: &SessionSummary) -> Result<()> {
        self.write_event(&SessionEvent::Summary(summary.clone()))?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_profile() -> StudentProfile {
        StudentProfile::new(&["algebra".to_string()], &[])
    }

    fn test_interaction(round: u32) -> Interaction {
        Interaction {
            round,
            topic: "algebra".to_string(),
            difficulty: 1,
            response_length: 80,
            reward: 0.77,
            value_action: 1,
            policy_topic: "algebra".to_string(),
            mode: CoordinationMode::Collaborative,
            cumulative_reward: 0.77 * round as f64,
            profile: ProfileSnapshot::from(&test_profile()),
        }
    }

    #[test]
    fn test_snapshot_captures_profile() {
        let mut profile = test_profile();
        profile.apply_round("algebra", 1, 0.9, 130).unwrap();
        let snapshot = ProfileSnapshot::from(&profile);
        assert_eq!(snapshot.total_interactions, 1);
        assert_eq!(snapshot.overall_performance, profile.overall_performance);
        assert_eq!(snapshot.topic_performance, profile.topic_performance);
    }

    #[test]
    fn test_summary_labels() {
        let mut profile = test_profile();
        profile.overall_performance = 0.8;
        profile.engagement_score = 0.9;
        let summary =
            SessionSummary::new(CoordinationMode::Hierarchical, &profile, 5.0, 0.5, 7, 7);
        assert_eq!(summary.improvement_trend, "improving");
        assert_eq!(summary.engagement_level, "high");
        assert_eq!(summary.end_performance, 0.8);

        profile.overall_performance = 0.2;
        profile.engagement_score = 0.1;
        let summary =
            SessionSummary::new(CoordinationMode::Hierarchical, &profile, 1.0, 0.5, 7, 7);
        assert_eq!(summary.improvement_trend, "declining");
        assert_eq!(summary.engagement_level, "low");

        profile.overall_performance = 0.52;
        profile.engagement_score = 0.5;
        let summary =
            SessionSummary::new(CoordinationMode::Hierarchical, &profile, 3.0, 0.5, 7, 7);
        assert_eq!(summary.improvement_trend, "steady");
        assert_eq!(summary.engagement_level, "moderate");
    }

    #[test]
    fn test_memory_sink_accumulates_in_order() {
        let mut sink = MemorySink::new();
        sink.record(&test_interaction(1)).unwrap();
        sink.record(&test_interaction(2)).unwrap();
        assert_eq!(sink.interactions.len(), 2);
        assert_eq!(sink.interactions[0].round, 1);
        assert_eq!(sink.interactions[1].round, 2);
        assert!(sink.summary.is_none());

        let summary =
            SessionSummary::new(CoordinationMode::Collaborative, &test_profile(), 1.54, 0.5, 2, 2);
        sink.finish(&summary).unwrap();
        assert_eq!(sink.summary, Some(summary));
    }

    #[test]
    fn test_channel_sink_preserves_order() {
        let (mut sink, receiver) = ChannelSink::unbounded();
        sink.record(&test_interaction(1)).unwrap();
        sink.record(&test_interaction(2)).unwrap();

        match receiver.recv().unwrap() {
            SessionEvent::Interaction(i) => assert_eq!(i.round, 1),
            other => panic!("unexpected event {:?}", other),
        }
        match receiver.recv().unwrap() {
            SessionEvent::Interaction(i) => assert_eq!(i.round, 2),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_channel_sink_errors_when_disconnected() {
        let (mut sink, receiver) = ChannelSink::unbounded();
        drop(receiver);
        assert!(sink.record(&test_interaction(1)).is_err());
    }

    #[test]
    fn test_jsonl_roundtrip() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let mut sink = JsonlSink::create(temp_file.path())?;

        let first = test_interaction(1);
        let second = test_interaction(2);
        sink.record(&first)?;
        sink.record(&second)?;
        let summary =
            SessionSummary::new(CoordinationMode::Collaborative, &test_profile(), 1.54, 0.5, 2, 2);
        sink.finish(&summary)?;
        drop(sink);

        let events = JsonlSink::read_events(temp_file.path())?;
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], SessionEvent::Interaction(first));
        assert_eq!(events[1], SessionEvent::Interaction(second));
        assert_eq!(events[2], SessionEvent::Summary(summary));
        Ok(())
    }
}
