//! Untimed study mode with two-phase answers.
//!
//! An option is first highlighted, then confirmed. Only a confirmed answer is
//! scored and reveals the correct option.

use crate::keyboard::{next_option, previous_option, NavKey};
use crate::models::Question;
use crate::navigation::{SessionMode, SessionRoute};
use crate::shuffle::{shuffle_options_with, shuffle_with};
use rand::{rng, Rng};

/// How an option should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Neutral,
    /// Tentatively selected, not yet confirmed.
    Highlighted,
    /// The right answer, shown after confirmation.
    Correct,
    /// The confirmed answer, when it was wrong.
    Wrong,
}

#[derive(Debug, Clone, Default)]
pub struct StudySession {
    source: Vec<Question>,
    studying: bool,
    questions: Vec<Question>,
    current_index: usize,
    highlighted: Option<usize>,
    confirmed: Option<usize>,
    answered_count: u32,
    correct_count: u32,
}

impl StudySession {
    /// Study over `source`. Nothing starts until [`StudySession::start_study`].
    pub fn new(source: Vec<Question>) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    /// Reshuffle questions and options and start from the first question.
    pub fn start_study(&mut self) -> SessionRoute {
        self.start_study_with(&mut rng());
        SessionRoute::study()
    }

    pub fn start_study_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.questions = shuffle_with(&self.source, rng)
            .iter()
            .map(|q| shuffle_options_with(q, rng))
            .collect();
        self.current_index = 0;
        self.highlighted = None;
        self.confirmed = None;
        self.answered_count = 0;
        self.correct_count = 0;
        self.studying = true;
        tracing::debug!(questions = self.questions.len(), "study session started");
    }

    pub fn exit_study(&mut self) -> SessionRoute {
        self.leave();
        SessionRoute::home()
    }

    fn leave(&mut self) {
        self.studying = false;
        self.highlighted = None;
        self.confirmed = None;
    }

    /// React to a route change: entering study mode starts a session unless
    /// one is running, leaving it ends the session.
    pub fn sync_route(&mut self, route: &SessionRoute) {
        if route.is_mode(SessionMode::Study) {
            if !self.studying {
                self.start_study_with(&mut rng());
            }
        } else if self.studying {
            self.leave();
        }
    }

    /// Tentatively select an option. Ignored once the answer is confirmed.
    pub fn highlight_answer(&mut self, index: usize) {
        if self.has_answered() {
            return;
        }
        if self.current_question().is_some_and(|q| index < q.options.len()) {
            self.highlighted = Some(index);
        }
    }

    /// Lock in the highlighted option and score it.
    pub fn confirm_answer(&mut self) {
        if self.has_answered() {
            return;
        }
        let Some(answer) = self.highlighted else { return };
        let Some(question) = self.questions.get(self.current_index) else { return };

        let correct = answer == question.correct_index;
        self.confirmed = Some(answer);
        self.answered_count += 1;
        if correct {
            self.correct_count += 1;
        }
    }

    /// A click highlights an option; a second click on it confirms.
    pub fn handle_option_click(&mut self, index: usize) {
        if self.has_answered() {
            return;
        }
        if self.highlighted == Some(index) {
            self.confirm_answer();
        } else {
            self.highlight_answer(index);
        }
    }

    pub fn next_question(&mut self) {
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.highlighted = None;
            self.confirmed = None;
        }
    }

    pub fn previous_question(&mut self) {
        if self.current_index > 0 {
            self.current_index -= 1;
            self.highlighted = None;
            self.confirmed = None;
        }
    }

    /// Confirm when an option is highlighted, otherwise move on once
    /// answered. Answering the last question ends the session.
    fn confirm_or_advance(&mut self) -> Option<SessionRoute> {
        if !self.has_answered() {
            if self.highlighted.is_some() {
                self.confirm_answer();
            }
            return None;
        }
        if self.is_last_question() {
            return Some(self.exit_study());
        }
        self.next_question();
        None
    }

    /// Handle a key. Returns a route to navigate to, if any.
    pub fn handle_key(&mut self, key: NavKey) -> Option<SessionRoute> {
        if !self.studying {
            return None;
        }
        let count = self.current_question().map_or(0, |q| q.options.len());
        match key {
            NavKey::Down => {
                if let Some(i) = next_option(self.highlighted, count) {
                    self.highlight_answer(i);
                }
            }
            NavKey::Up => {
                if let Some(i) = previous_option(self.highlighted, count) {
                    self.highlight_answer(i);
                }
            }
            NavKey::Digit(_) => {
                if let Some(i) = key.option_index(count) {
                    self.highlight_answer(i);
                }
            }
            NavKey::Right | NavKey::Enter => return self.confirm_or_advance(),
            NavKey::Left => self.previous_question(),
            NavKey::Escape => return Some(self.exit_study()),
            NavKey::Space => {}
        }
        None
    }

    pub fn option_state(&self, index: usize) -> OptionState {
        let Some(question) = self.current_question() else {
            return OptionState::Neutral;
        };
        match self.confirmed {
            None if self.highlighted == Some(index) => OptionState::Highlighted,
            None => OptionState::Neutral,
            Some(_) if index == question.correct_index => OptionState::Correct,
            Some(confirmed) if confirmed == index => OptionState::Wrong,
            Some(_) => OptionState::Neutral,
        }
    }

    pub fn is_studying(&self) -> bool {
        self.studying
    }

    pub fn has_answered(&self) -> bool {
        self.confirmed.is_some()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn highlighted_answer(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn confirmed_answer(&self) -> Option<usize> {
        self.confirmed
    }

    pub fn answered_count(&self) -> u32 {
        self.answered_count
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }
}
