//! Deterministic and simulated collaborators
//!
//! These implementations stand in for the real question bank and a live
//! student: a template bank that can always produce a question, a scripted
//! student that replays a fixed arc of response lengths, and a noisy
//! student whose response quality follows an ability parameter. They exist
//! so sessions can run end to end in tests and batch evaluations without
//! external content.

use super::{Question, QuestionBank, ResponseSource, StudentResponse};
use crate::reward::DIFFICULTY_LEVELS;
use anyhow::{Result, anyhow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Human-readable difficulty descriptors, indexed by level.
const DIFFICULTY_NAMES: [&str; DIFFICULTY_LEVELS] =
    ["introductory", "standard", "advanced", "challenge"];

/// Question bank that generates a templated question for every valid
/// `(topic, difficulty)` pair.
#[derive(Debug, Clone, Default)]
pub struct TemplateBank;

impl TemplateBank {
    /// Create a template bank.
    pub fn new() -> Self {
        Self
    }
}

impl QuestionBank for TemplateBank {
    fn fetch(&mut self, topic: &str, difficulty: usize) -> Result<Question> {
        let descriptor = DIFFICULTY_NAMES
            .get(difficulty)
            .ok_or_else(|| anyhow!("no questions stocked for difficulty {}", difficulty))?;
        let text = format!(
            "Here is a {} question on {}: explain the main idea and work through one example.",
            descriptor, topic
        );
        Ok(Question::new(text, topic, difficulty))
    }
}

/// Build response text of exactly `length` characters about `topic`.
fn response_text(topic: &str, length: usize) -> String {
    if length == 0 {
        return String::new();
    }
    let base = format!("My understanding of {} keeps growing with practice. ", topic);
    base.chars().cycle().take(length).collect()
}

/// Student that replays a fixed script of response lengths.
///
/// Once the script is exhausted the final length repeats, so a session
/// longer than the script still gets responses. An empty script yields
/// empty responses.
#[derive(Debug, Clone)]
pub struct ScriptedStudent {
    lengths: Vec<usize>,
    cursor: usize,
}

impl ScriptedStudent {
    /// Create a student that answers with the given lengths in order.
    pub fn with_lengths(lengths: Vec<usize>) -> Self {
        Self { lengths, cursor: 0 }
    }

    /// The classic improving arc: terse early answers that grow into
    /// detailed ones and stay there.
    pub fn improving() -> Self {
        Self::with_lengths(vec![10, 25, 65, 125, 125, 125, 125])
    }
}

impl ResponseSource for ScriptedStudent {
    fn respond(&mut self, question: &Question) -> Result<StudentResponse> {
        let length = match self.lengths.get(self.cursor) {
            Some(&len) => len,
            None => self.lengths.last().copied().unwrap_or(0),
        };
        self.cursor += 1;
        Ok(StudentResponse::new(response_text(&question.topic, length)))
    }
}

/// Student whose response quality tracks an ability parameter with
/// seedable jitter.
#[derive(Debug, Clone)]
pub struct NoisyStudent {
    ability: f64,
    rng: StdRng,
}

impl NoisyStudent {
    /// Create a student of the given ability in `[0, 1]` with an
    /// entropy-seeded jitter source.
    pub fn new(ability: f64) -> Self {
        Self {
            ability: ability.clamp(0.0, 1.0),
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a student with a fixed jitter seed, for reproducible batches.
    pub fn with_seed(ability: f64, seed: u64) -> Self {
        Self {
            ability: ability.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ResponseSource for NoisyStudent {
    fn respond(&mut self, question: &Question) -> Result<StudentResponse> {
        // Stronger students write longer answers; jitter keeps rounds varied.
        let target = 20.0 + self.ability * 160.0;
        let jitter = self.rng.gen_range(0.5..1.5);
        let length = (target * jitter).round() as usize;
        Ok(StudentResponse::new(response_text(&question.topic, length)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_bank_covers_every_pair() {
        let mut bank = TemplateBank::new();
        for topic in ["algebra", "geometry"] {
            for difficulty in 0..DIFFICULTY_LEVELS {
                let question = bank.fetch(topic, difficulty).unwrap();
                assert_eq!(question.topic, topic);
                assert_eq!(question.difficulty, difficulty);
                assert!(question.text.contains(topic));
            }
        }
    }

    #[test]
    fn test_template_bank_rejects_unserved_difficulty() {
        let mut bank = TemplateBank::new();
        assert!(bank.fetch("algebra", DIFFICULTY_LEVELS).is_err());
    }

    #[test]
    fn test_scripted_student_replays_lengths() {
        let mut student = ScriptedStudent::with_lengths(vec![5, 40, 130]);
        let mut bank = TemplateBank::new();
        let question = bank.fetch("algebra", 0).unwrap();

        for expected in [5, 40, 130, 130, 130] {
            let response = student.respond(&question).unwrap();
            assert_eq!(response.len(), expected);
        }
    }

    #[test]
    fn test_improving_arc() {
        let mut student = ScriptedStudent::improving();
        let mut bank = TemplateBank::new();
        let question = bank.fetch("algebra", 1).unwrap();

        let lengths: Vec<usize> = (0..7)
            .map(|_| student.respond(&question).unwrap().len())
            .collect();
        assert_eq!(lengths, vec![10, 25, 65, 125, 125, 125, 125]);
    }

    #[test]
    fn test_empty_script_yields_empty_responses() {
        let mut student = ScriptedStudent::with_lengths(Vec::new());
        let mut bank = TemplateBank::new();
        let question = bank.fetch("algebra", 0).unwrap();
        assert!(student.respond(&question).unwrap().is_empty());
    }

    #[test]
    fn test_noisy_student_is_reproducible_given_seed() {
        let mut bank = TemplateBank::new();
        let question = bank.fetch("geometry", 2).unwrap();

        let mut a = NoisyStudent::with_seed(0.7, 99);
        let mut b = NoisyStudent::with_seed(0.7, 99);
        for _ in 0..10 {
            let from_a = a.respond(&question).unwrap();
            let from_b = b.respond(&question).unwrap();
            assert_eq!(from_a.len(), from_b.len());
        }
    }

    #[test]
    fn test_noisy_student_ability_orders_lengths() {
        let mut bank = TemplateBank::new();
        let question = bank.fetch("geometry", 2).unwrap();

        let mut weak_total = 0;
        let mut strong_total = 0;
        let mut weak = NoisyStudent::with_seed(0.0, 5);
        let mut strong = NoisyStudent::with_seed(1.0, 5);
        for _ in 0..20 {
            weak_total += weak.respond(&question).unwrap().len();
            strong_total += strong.respond(&question).unwrap().len();
        }
        assert!(strong_total > weak_total);
    }
}
