//! Exam format constants.

use serde::{Deserialize, Serialize};

/// Composition, pass mark and time limit of a quiz.
///
/// Defaults follow the official civic exam format: 40 questions (8
/// situational, 32 general), 32 correct answers to pass, 45 minutes with a
/// warning at 5 minutes remaining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamConfig {
    pub situational_questions: usize,
    pub general_questions: usize,
    pub passing_score: u32,
    pub duration_secs: u32,
    pub warning_threshold_secs: u32,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            situational_questions: 8,
            general_questions: 32,
            passing_score: 32,
            duration_secs: 2700,
            warning_threshold_secs: 300,
        }
    }
}

impl ExamConfig {
    /// Total number of questions in a quiz.
    pub fn total_questions(&self) -> usize {
        self.situational_questions + self.general_questions
    }

    pub fn is_passing(&self, score: u32) -> bool {
        score >= self.passing_score
    }
}
