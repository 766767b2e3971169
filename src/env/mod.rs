//! External collaborator contracts
//!
//! The decision core treats question content, response collection, and
//! record persistence as external collaborators behind narrow traits. The
//! core produces (topic, difficulty) requests and consumes raw response
//! text; everything else about those systems stays outside.

use crate::record::{Interaction, SessionSummary};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A question served to the student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Prompt text shown to the student.
    pub text: String,

    /// Topic the question was drawn from.
    pub topic: String,

    /// Difficulty level in `0..=3`.
    pub difficulty: usize,
}

impl Question {
    /// Create a question record.
    pub fn new(text: impl Into<String>, topic: impl Into<String>, difficulty: usize) -> Self {
        Self {
            text: text.into(),
            topic: topic.into(),
            difficulty,
        }
    }
}

/// A raw response collected from the student.
///
/// The core never parses response semantics; it consumes the character
/// length and the engagement heuristic derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResponse {
    /// Raw response text.
    pub text: String,
}

impl StudentResponse {
    /// Create a response from raw text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Response length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the response carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Supplier of question content.
///
/// Implementations must cover every `(topic, difficulty in 0..=3)` pair the
/// session can produce; a missing question is a configuration error and is
/// surfaced as such, aborting the round rather than substituting content.
pub trait QuestionBank {
    /// Look up a question for the requested topic and difficulty.
    fn fetch(&mut self, topic: &str, difficulty: usize) -> Result<Question>;
}

/// Supplier of student responses, one per presented question.
pub trait ResponseSource {
    /// Collect the response to `question`.
    fn respond(&mut self, question: &Question) -> Result<StudentResponse>;
}

/// Consumer of finalized session records.
///
/// Records arrive append-only and immutable: one [`Interaction`] per round,
/// then one [`SessionSummary`] when the session ends. Any concurrency
/// control across parallel sessions is the sink's responsibility.
pub trait PersistenceSink {
    /// Append one finalized interaction record.
    fn record(&mut self, interaction: &Interaction) -> Result<()>;

    /// Consume the end-of-session summary.
    fn finish(&mut self, summary: &SessionSummary) -> Result<()>;
}

// Lets a caller lend a sink to a session and keep it afterwards.
impl<S: PersistenceSink + ?Sized> PersistenceSink for &mut S {
    fn record(&mut self, interaction: &Interaction) -> Result<()> {
        (**self).record(interaction)
    }

    fn finish(&mut self, summary: &SessionSummary) -> Result<()> {
        (**self).finish(summary)
    }
}

pub mod scripted;

pub use scripted::{NoisyStudent, ScriptedStudent, TemplateBank};
