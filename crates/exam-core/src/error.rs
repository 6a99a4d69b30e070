//! Error types for exam-core.

use thiserror::Error;

/// Errors surfaced by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised while loading a question bank.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to read question bank: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse question bank: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question {id}: correct index {index} out of range for {options} options")]
    CorrectIndexOutOfRange {
        id: String,
        index: usize,
        options: usize,
    },
    #[error("question {id}: no options")]
    NoOptions { id: String },
    #[error("duplicate question id {0}")]
    DuplicateId(String),
}

/// Which half of the quiz composition a pool was short of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Situational,
    General,
}

impl PoolKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Situational => "situational",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for PoolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised when building a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("not enough {kind} questions: need {required}, have {available}")]
    InsufficientPool {
        kind: PoolKind,
        required: usize,
        available: usize,
    },
}
