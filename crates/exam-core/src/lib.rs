//! # exam-core
//!
//! Session engines for the exam trainer.
//!
//! ## Features
//!
//! - Timed 40-question quiz with a fixed situational/general composition
//! - Two-phase study mode (highlight, then confirm)
//! - Flashcard review with known / needs-review tracking
//! - Per-category progress persisted to a local key-value store
//! - Countdown timer with warning threshold

pub mod bank;
pub mod category;
pub mod clock;
pub mod error;
pub mod exam;
pub mod flashcards;
pub mod keyboard;
pub mod models;
pub mod navigation;
pub mod progress;
pub mod quiz;
pub mod shuffle;
pub mod storage;
pub mod study;
pub mod timer;

pub use bank::QuestionBank;
pub use category::{Category, CategoryMap};
pub use clock::Clock;
pub use error::{BankError, SelectionError, StorageError};
pub use exam::ExamConfig;
pub use flashcards::{
    FlashcardDeck, FlashcardFilter, FlashcardSession, FlashcardStats, SessionOptions,
};
pub use keyboard::NavKey;
pub use models::{
    AnswerDetail, CategoryScore, CategoryStats, FlashcardProgress, FlashcardStatus, Question,
    QuestionSource, QuizResult, UserProgress,
};
pub use navigation::{RouteHistory, SessionMode, SessionRoute};
pub use progress::{CategoryPerformance, ProgressStore};
pub use quiz::{QuizProgress, QuizSession, QuizState};
pub use shuffle::{shuffle, shuffle_options, shuffle_with};
pub use storage::{MemoryStore, SqliteStore, Storage};
pub use study::{OptionState, StudySession};
pub use timer::{CountdownTimer, TimerEvent};
