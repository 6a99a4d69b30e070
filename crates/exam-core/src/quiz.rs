//! Timed quiz sessions.

use crate::bank::check_counts;
use crate::category::CategoryMap;
use crate::clock::Clock;
use crate::error::SelectionError;
use crate::exam::ExamConfig;
use crate::models::{AnswerDetail, CategoryScore, Question, QuizResult};
use crate::progress::ProgressStore;
use crate::shuffle::{shuffle_options_with, shuffle_with};
use chrono::{DateTime, Utc};
use rand::{rng, Rng};

/// Draw a quiz from `pool`: the configured number of situational and general
/// questions, mixed together, each with shuffled options.
///
/// Fails with [`SelectionError::InsufficientPool`] when either half of the
/// pool is too small.
pub fn select_questions(
    pool: &[Question],
    config: &ExamConfig,
) -> Result<Vec<Question>, SelectionError> {
    select_questions_with(pool, config, &mut rng())
}

/// Like [`select_questions`] with an explicit random source.
pub fn select_questions_with<R: Rng + ?Sized>(
    pool: &[Question],
    config: &ExamConfig,
    rng: &mut R,
) -> Result<Vec<Question>, SelectionError> {
    let (situational, general): (Vec<Question>, Vec<Question>) =
        pool.iter().cloned().partition(|q| q.is_situational);
    check_counts(situational.len(), general.len(), config)?;

    let mut selected = shuffle_with(&situational, rng);
    selected.truncate(config.situational_questions);
    let mut drawn_general = shuffle_with(&general, rng);
    drawn_general.truncate(config.general_questions);
    selected.extend(drawn_general);

    Ok(shuffle_with(&selected, rng)
        .iter()
        .map(|q| shuffle_options_with(q, rng))
        .collect())
}

/// Mutable state of a quiz in progress.
#[derive(Debug, Clone)]
pub struct QuizState {
    pub questions: Vec<Question>,
    pub current_index: usize,
    /// One slot per question; `None` is unanswered.
    pub answers: Vec<Option<usize>>,
    pub start_time: DateTime<Utc>,
    pub is_finished: bool,
}

impl QuizState {
    fn new(questions: Vec<Question>, start_time: DateTime<Utc>) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            questions,
            current_index: 0,
            answers,
            start_time,
            is_finished: false,
        }
    }

    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }
}

/// Position within the quiz, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuizProgress {
    /// 1-based index of the current question.
    pub current: usize,
    pub total: usize,
    pub answered: usize,
}

/// Quiz engine: `NotStarted` -> `InProgress` -> `Finished`.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    config: ExamConfig,
    clock: Clock,
    state: Option<QuizState>,
    result: Option<QuizResult>,
}

impl QuizSession {
    pub fn new(config: ExamConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the clock used for start and finish times.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn state(&self) -> Option<&QuizState> {
        self.state.as_ref()
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    pub fn is_in_progress(&self) -> bool {
        self.state.as_ref().is_some_and(|s| !s.is_finished)
    }

    /// Draw a new quiz from `pool`, replacing any previous quiz and result.
    pub fn start_quiz(&mut self, pool: &[Question]) -> Result<(), SelectionError> {
        let questions = select_questions(pool, &self.config)?;
        self.start_with_questions(questions);
        Ok(())
    }

    /// Start a quiz over an already selected question list.
    pub fn start_with_questions(&mut self, questions: Vec<Question>) {
        tracing::info!(questions = questions.len(), "quiz started");
        self.state = Some(QuizState::new(questions, self.clock.now()));
        self.result = None;
    }

    /// Answer the current question. Ignored once finished.
    pub fn select_answer(&mut self, answer: usize) {
        let Some(state) = self.state.as_mut() else { return };
        if state.is_finished {
            return;
        }
        let index = state.current_index;
        let in_range = state
            .questions
            .get(index)
            .is_some_and(|q| answer < q.options.len());
        if in_range {
            state.answers[index] = Some(answer);
        }
    }

    pub fn go_to_question(&mut self, index: usize) {
        let Some(state) = self.state.as_mut() else { return };
        if state.is_finished {
            return;
        }
        if index < state.questions.len() {
            state.current_index = index;
        }
    }

    pub fn next_question(&mut self) {
        let Some(state) = self.state.as_mut() else { return };
        if state.current_index + 1 < state.questions.len() {
            state.current_index += 1;
        }
    }

    pub fn previous_question(&mut self) {
        let Some(state) = self.state.as_mut() else { return };
        state.current_index = state.current_index.saturating_sub(1);
    }

    /// Score the quiz, record it in `progress` and return the result.
    ///
    /// Unanswered questions count as incorrect. Returns `None` when no quiz
    /// was started; a finished quiz returns its existing result without being
    /// recorded again.
    pub fn finish_quiz(&mut self, progress: &mut ProgressStore) -> Option<QuizResult> {
        let state = self.state.as_mut()?;
        if state.is_finished {
            return self.result.clone();
        }
        state.is_finished = true;

        let elapsed = self.clock.now().signed_duration_since(state.start_time);
        let time_spent = u64::try_from(elapsed.num_seconds()).unwrap_or(0);

        let mut category_scores = CategoryMap::<CategoryScore>::default();
        let mut answers = Vec::with_capacity(state.questions.len());
        let mut score = 0;

        for (question, &user_answer) in state.questions.iter().zip(&state.answers) {
            let is_correct = question.is_correct(user_answer);
            let entry = &mut category_scores[question.category];
            entry.total += 1;
            if is_correct {
                score += 1;
                entry.correct += 1;
            }
            answers.push(AnswerDetail {
                question: question.clone(),
                user_answer,
                is_correct,
            });
        }

        let result = QuizResult {
            score,
            total: u32::try_from(state.questions.len()).unwrap_or(u32::MAX),
            passed: self.config.is_passing(score),
            time_spent,
            category_scores,
            answers,
        };
        tracing::info!(
            score = result.score,
            total = result.total,
            passed = result.passed,
            time_spent = result.time_spent,
            "quiz finished"
        );

        progress.record_quiz_result(&result);
        self.result = Some(result.clone());
        Some(result)
    }

    /// Discard the quiz and its result.
    pub fn reset_quiz(&mut self) {
        self.state = None;
        self.result = None;
    }

    pub fn current_question(&self) -> Option<&Question> {
        let state = self.state.as_ref()?;
        state.questions.get(state.current_index)
    }

    pub fn current_answer(&self) -> Option<usize> {
        let state = self.state.as_ref()?;
        state.answers.get(state.current_index).copied().flatten()
    }

    pub fn progress(&self) -> QuizProgress {
        match &self.state {
            Some(state) => QuizProgress {
                current: state.current_index + 1,
                total: state.questions.len(),
                answered: state.answered(),
            },
            None => QuizProgress::default(),
        }
    }

    pub fn is_first_question(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.current_index == 0)
    }

    pub fn is_last_question(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.current_index + 1 == s.questions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::clock::fixed_now;
    use crate::error::PoolKind;
    use crate::storage::MemoryStore;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::rc::Rc;

    fn question(id: String, category: Category, is_situational: bool) -> Question {
        Question {
            id,
            category,
            category_label: category.label().to_string(),
            question: "Test question?".to_string(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_index: 0,
            explanation: None,
            is_situational,
            sources: Vec::new(),
        }
    }

    fn pool(situational: usize, general: usize) -> Vec<Question> {
        let sit = (0..situational).map(|i| question(format!("sit-{i}"), Category::VivreSociete, true));
        let general = (0..general).map(|i| {
            let category = Category::ALL[i % Category::ALL.len()];
            question(format!("gen-{i}"), category, false)
        });
        sit.chain(general).collect()
    }

    fn progress_store() -> ProgressStore {
        ProgressStore::load(Rc::new(MemoryStore::new())).with_clock(Clock::fixed(fixed_now()))
    }

    fn started_session() -> QuizSession {
        let mut session = QuizSession::new(ExamConfig::default()).with_clock(Clock::fixed(fixed_now()));
        session.start_quiz(&pool(20, 50)).unwrap();
        session
    }

    #[test]
    fn test_select_composition() {
        let selected = select_questions(&pool(20, 50), &ExamConfig::default()).unwrap();

        assert_eq!(selected.len(), 40);
        assert_eq!(selected.iter().filter(|q| q.is_situational).count(), 8);
        assert_eq!(selected.iter().filter(|q| !q.is_situational).count(), 32);

        let ids: HashSet<_> = selected.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids.len(), 40);
    }

    #[test]
    fn test_select_shuffles_options() {
        let selected =
            select_questions_with(&pool(8, 32), &ExamConfig::default(), &mut StdRng::seed_from_u64(3))
                .unwrap();
        for q in &selected {
            assert_eq!(q.options[q.correct_index], "A");
        }
        assert!(selected.iter().any(|q| q.correct_index != 0));
    }

    #[test]
    fn test_select_insufficient_pool() {
        let config = ExamConfig::default();
        assert_eq!(
            select_questions(&pool(7, 50), &config),
            Err(SelectionError::InsufficientPool {
                kind: PoolKind::Situational,
                required: 8,
                available: 7,
            })
        );
        assert_eq!(
            select_questions(&pool(8, 31), &config),
            Err(SelectionError::InsufficientPool {
                kind: PoolKind::General,
                required: 32,
                available: 31,
            })
        );
    }

    #[test]
    fn test_start_quiz() {
        let session = started_session();
        let state = session.state().unwrap();

        assert_eq!(state.questions.len(), 40);
        assert_eq!(state.answers, vec![None; 40]);
        assert_eq!(state.current_index, 0);
        assert_eq!(state.start_time, fixed_now());
        assert!(!state.is_finished);
        assert!(session.is_first_question());
    }

    #[test]
    fn test_navigation_clamps() {
        let mut session = started_session();

        session.previous_question();
        assert_eq!(session.progress().current, 1);

        session.go_to_question(39);
        assert!(session.is_last_question());
        session.next_question();
        assert_eq!(session.progress().current, 40);

        session.go_to_question(40);
        assert_eq!(session.progress().current, 40);

        session.go_to_question(5);
        assert_eq!(session.progress().current, 6);
    }

    #[test]
    fn test_select_answer() {
        let mut session = started_session();

        session.select_answer(2);
        assert_eq!(session.current_answer(), Some(2));
        session.select_answer(9);
        assert_eq!(session.current_answer(), Some(2));

        session.next_question();
        assert_eq!(session.current_answer(), None);
        assert_eq!(session.progress().answered, 1);
    }

    #[test]
    fn test_actions_without_quiz_are_ignored() {
        let mut session = QuizSession::new(ExamConfig::default());
        session.select_answer(0);
        session.next_question();
        session.previous_question();
        session.go_to_question(3);

        assert!(session.current_question().is_none());
        assert_eq!(session.progress(), QuizProgress::default());
        assert!(session.finish_quiz(&mut progress_store()).is_none());
    }

    #[test]
    fn test_finish_unanswered_quiz() {
        let mut session = started_session();
        let mut progress = progress_store();

        let result = session.finish_quiz(&mut progress).unwrap();

        assert_eq!(result.score, 0);
        assert_eq!(result.total, 40);
        assert!(!result.passed);
        assert!(result.answers.iter().all(|a| !a.is_correct && a.user_answer.is_none()));
        assert_eq!(progress.progress().quizzes_taken, 1);
    }

    #[test]
    fn test_finish_perfect_quiz() {
        let mut session = started_session();
        let mut progress = progress_store();

        for i in 0..40 {
            session.go_to_question(i);
            let correct = session.current_question().unwrap().correct_index;
            session.select_answer(correct);
        }
        session.clock_mut().advance(Duration::milliseconds(754_900));

        let result = session.finish_quiz(&mut progress).unwrap();

        assert_eq!(result.score, 40);
        assert!(result.passed);
        assert_eq!(result.time_spent, 754);
        let totals: u32 = result.category_scores.values().map(|s| s.total).sum();
        assert_eq!(totals, 40);
        assert_eq!(progress.progress().best_score, 40);
    }

    #[test]
    fn test_passing_boundary() {
        let mut session = started_session();
        for i in 0..32 {
            session.go_to_question(i);
            let correct = session.current_question().unwrap().correct_index;
            session.select_answer(correct);
        }
        let result = session.finish_quiz(&mut progress_store()).unwrap();
        assert_eq!(result.score, 32);
        assert!(result.passed);
    }

    #[test]
    fn test_finished_quiz_is_frozen() {
        let mut session = started_session();
        let mut progress = progress_store();
        session.finish_quiz(&mut progress).unwrap();

        session.select_answer(1);
        session.go_to_question(10);
        assert_eq!(session.current_answer(), None);
        assert_eq!(session.progress().current, 1);

        let again = session.finish_quiz(&mut progress).unwrap();
        assert_eq!(Some(&again), session.result());
        assert_eq!(progress.progress().quizzes_taken, 1);
    }

    #[test]
    fn test_category_scores() {
        let mut session = QuizSession::new(ExamConfig::default()).with_clock(Clock::fixed(fixed_now()));
        session.start_with_questions(vec![
            question("a".into(), Category::DroitsDevoirs, false),
            question("b".into(), Category::DroitsDevoirs, false),
            question("c".into(), Category::PrincipesValeurs, true),
        ]);
        session.select_answer(0);
        session.next_question();
        session.select_answer(1);

        let result = session.finish_quiz(&mut progress_store()).unwrap();

        assert_eq!(result.score, 1);
        assert_eq!(result.total, 3);
        assert_eq!(
            result.category_scores[Category::DroitsDevoirs],
            CategoryScore { correct: 1, total: 2 }
        );
        assert_eq!(
            result.category_scores[Category::PrincipesValeurs],
            CategoryScore { correct: 0, total: 1 }
        );
        assert_eq!(result.category_scores[Category::VivreSociete], CategoryScore::default());
    }

    #[test]
    fn test_reset_quiz() {
        let mut session = started_session();
        session.finish_quiz(&mut progress_store());

        session.reset_quiz();

        assert!(session.state().is_none());
        assert!(session.result().is_none());
        assert!(!session.is_in_progress());
    }

    #[test]
    fn test_restart_clears_result() {
        let mut session = started_session();
        session.finish_quiz(&mut progress_store());
        session.start_quiz(&pool(20, 50)).unwrap();

        assert!(session.result().is_none());
        assert!(session.is_in_progress());
    }
}
