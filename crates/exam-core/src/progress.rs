//! Quiz history aggregated per category.

use crate::category::{Category, CategoryMap};
use crate::clock::Clock;
use crate::models::{CategoryStats, QuizResult, UserProgress};
use crate::storage::{load_or_default, save_best_effort, Storage};
use std::rc::Rc;

/// Storage key for the progress document.
pub const PROGRESS_KEY: &str = "examen-civique-progress";

/// Categories below this success rate are considered weak.
pub const WEAK_THRESHOLD: u32 = 80;

/// Maximum number of weak categories reported.
pub const MAX_WEAK_CATEGORIES: usize = 2;

/// Historical success rate for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPerformance {
    pub category: Category,
    pub attempts: u32,
    pub correct: u32,
    /// `None` when the category was never attempted.
    pub percentage: Option<u32>,
}

fn rounded_percentage(correct: u64, attempts: u64) -> Option<u32> {
    if attempts == 0 {
        return None;
    }
    Some((correct as f64 * 100.0 / attempts as f64).round() as u32)
}

/// Per-category performance in display order.
pub fn calculate_category_performance(
    stats: &CategoryMap<CategoryStats>,
) -> Vec<CategoryPerformance> {
    stats
        .iter()
        .map(|(category, s)| CategoryPerformance {
            category,
            attempts: s.attempts,
            correct: s.correct,
            percentage: rounded_percentage(s.correct.into(), s.attempts.into()),
        })
        .collect()
}

/// Attempted categories under [`WEAK_THRESHOLD`], weakest first, at most two.
pub fn calculate_weak_categories(performance: &[CategoryPerformance]) -> Vec<CategoryPerformance> {
    let mut weak: Vec<CategoryPerformance> = performance
        .iter()
        .filter(|p| p.percentage.is_some_and(|pct| pct < WEAK_THRESHOLD))
        .copied()
        .collect();
    weak.sort_by_key(|p| p.percentage);
    weak.truncate(MAX_WEAK_CATEGORIES);
    weak
}

/// Overall success rate across every category.
pub fn calculate_average_score(stats: &CategoryMap<CategoryStats>) -> Option<u32> {
    let attempts: u64 = stats.values().map(|s| u64::from(s.attempts)).sum();
    let correct: u64 = stats.values().map(|s| u64::from(s.correct)).sum();
    rounded_percentage(correct, attempts)
}

/// Persisted quiz history with derived statistics.
pub struct ProgressStore {
    storage: Rc<dyn Storage>,
    clock: Clock,
    progress: UserProgress,
}

impl ProgressStore {
    /// Load progress from storage, or start from zero.
    pub fn load(storage: Rc<dyn Storage>) -> Self {
        let progress = load_or_default(storage.as_ref(), PROGRESS_KEY);
        Self {
            storage,
            clock: Clock::default(),
            progress,
        }
    }

    /// Set the clock used to stamp `last_quiz_date`.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    /// Fold a finished quiz into the cumulative counters and persist.
    pub fn record_quiz_result(&mut self, result: &QuizResult) {
        let progress = &mut self.progress;
        progress.quizzes_taken = progress.quizzes_taken.saturating_add(1);
        progress.last_quiz_date = Some(self.clock.now());
        progress.best_score = progress.best_score.max(result.score);

        for (category, score) in result.category_scores.iter() {
            let stats = &mut progress.category_stats[category];
            stats.attempts = stats.attempts.saturating_add(score.total);
            stats.correct = stats.correct.saturating_add(score.correct);
        }

        tracing::debug!(
            quizzes_taken = progress.quizzes_taken,
            best_score = progress.best_score,
            "recorded quiz result"
        );
        self.save();
    }

    /// Zero every counter and persist.
    pub fn reset_progress(&mut self) {
        self.progress = UserProgress::default();
        self.save();
    }

    pub fn has_progress(&self) -> bool {
        self.progress.quizzes_taken > 0
    }

    /// Date of the last quiz, e.g. "14 November 2023".
    pub fn last_quiz_formatted(&self) -> Option<String> {
        self.progress
            .last_quiz_date
            .map(|date| date.format("%-d %B %Y").to_string())
    }

    pub fn category_performance(&self) -> Vec<CategoryPerformance> {
        calculate_category_performance(&self.progress.category_stats)
    }

    pub fn weak_categories(&self) -> Vec<CategoryPerformance> {
        calculate_weak_categories(&self.category_performance())
    }

    pub fn average_score(&self) -> Option<u32> {
        if !self.has_progress() {
            return None;
        }
        calculate_average_score(&self.progress.category_stats)
    }

    fn save(&self) {
        save_best_effort(self.storage.as_ref(), PROGRESS_KEY, &self.progress);
    }
}
