//! Read-only question bank.

use crate::category::Category;
use crate::error::{BankError, PoolKind, SelectionError};
use crate::exam::ExamConfig;
use crate::models::Question;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const BUNDLED_QUESTIONS: &str = include_str!("../data/questions.json");

#[derive(Deserialize)]
struct BankFile {
    questions: Vec<Question>,
}

/// Immutable collection of questions, loaded once.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank from already-parsed questions, validating every record.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        let mut seen = HashSet::new();
        for q in &questions {
            if q.options.is_empty() {
                return Err(BankError::NoOptions { id: q.id.clone() });
            }
            if q.correct_index >= q.options.len() {
                return Err(BankError::CorrectIndexOutOfRange {
                    id: q.id.clone(),
                    index: q.correct_index,
                    options: q.options.len(),
                });
            }
            if !seen.insert(q.id.as_str()) {
                return Err(BankError::DuplicateId(q.id.clone()));
            }
        }
        Ok(Self { questions })
    }

    /// Parse a bank from its JSON form: `{"questions": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, BankError> {
        let file: BankFile = serde_json::from_str(json)?;
        Self::new(file.questions)
    }

    /// Load a bank from a JSON file.
    pub fn load(path: &Path) -> Result<Self, BankError> {
        let content = std::fs::read_to_string(path)?;
        let bank = Self::from_json(&content)?;
        tracing::info!(path = %path.display(), questions = bank.len(), "loaded question bank");
        Ok(bank)
    }

    /// The bank shipped with the crate.
    pub fn bundled() -> Result<Self, BankError> {
        Self::from_json(BUNDLED_QUESTIONS)
    }

    pub fn all(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn by_category(&self, category: Category) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| q.category == category)
            .cloned()
            .collect()
    }

    pub fn situational(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.is_situational)
    }

    pub fn general(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| !q.is_situational)
    }

    /// Check that a quiz with the given composition can be drawn.
    pub fn check_pool(&self, config: &ExamConfig) -> Result<(), SelectionError> {
        check_counts(
            self.situational().count(),
            self.general().count(),
            config,
        )
    }
}

pub(crate) fn check_counts(
    situational: usize,
    general: usize,
    config: &ExamConfig,
) -> Result<(), SelectionError> {
    if situational < config.situational_questions {
        return Err(SelectionError::InsufficientPool {
            kind: PoolKind::Situational,
            required: config.situational_questions,
            available: situational,
        });
    }
    if general < config.general_questions {
        return Err(SelectionError::InsufficientPool {
            kind: PoolKind::General,
            required: config.general_questions,
            available: general,
        });
    }
    Ok(())
}
