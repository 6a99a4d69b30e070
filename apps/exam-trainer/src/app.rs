//! Application state and logic.

use crate::config::Config;
use crossterm::event::{KeyCode, KeyEvent};
use exam_core::flashcards::FlashcardFilter;
use exam_core::keyboard::{next_option, previous_option};
use exam_core::timer::TimerEvent;
use exam_core::{
    Category, CountdownTimer, FlashcardDeck, FlashcardSession, MemoryStore, NavKey, ProgressStore,
    QuestionBank, QuizSession, RouteHistory, SessionMode, SessionRoute, SqliteStore, Storage,
    StudySession,
};
use std::rc::Rc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Quiz,
    Results,
    Study,
    Flashcards,
    Progress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    None,
    GoToQuestion,
}

/// Entries of the home menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Quiz,
    Study,
    StudyByCategory,
    AllCards,
    CardsByCategory,
    FilteredCards(FlashcardFilter),
    Progress,
}

impl MenuItem {
    pub const ALL: [MenuItem; 9] = [
        Self::Quiz,
        Self::Study,
        Self::StudyByCategory,
        Self::AllCards,
        Self::CardsByCategory,
        Self::FilteredCards(FlashcardFilter::NeedsReview),
        Self::FilteredCards(FlashcardFilter::Unseen),
        Self::FilteredCards(FlashcardFilter::Known),
        Self::Progress,
    ];

    pub fn label(&self) -> String {
        match self {
            Self::Quiz => "Exam simulation".to_string(),
            Self::Study => "Study mode".to_string(),
            Self::StudyByCategory => "Study mode: one category".to_string(),
            Self::AllCards => "Flashcards: all cards".to_string(),
            Self::CardsByCategory => "Flashcards: one category".to_string(),
            Self::FilteredCards(filter) => format!("Flashcards: {}", filter.label().to_lowercase()),
            Self::Progress => "Progress".to_string(),
        }
    }
}

/// What the category picker starts once a category is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerTarget {
    Study,
    Flashcards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPicker {
    pub target: PickerTarget,
    pub selected: usize,
}

pub struct App {
    pub config: Config,
    pub bank: QuestionBank,
    pub view: View,
    pub quiz: QuizSession,
    pub timer: Option<CountdownTimer>,
    pub study: StudySession,
    pub flashcards: FlashcardSession,
    pub progress: ProgressStore,
    pub history: RouteHistory,
    pub picker: Option<CategoryPicker>,
    pub selected_menu: usize,
    pub results_scroll: usize,
    pub editing: bool,
    pub input_buffer: String,
    pub input_field: InputField,
    pub message: Option<String>,
    pub show_help: bool,
}

impl App {
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::load();

        let bank = match &config.bank.questions_path {
            Some(path) => QuestionBank::load(path)?,
            None => QuestionBank::bundled()?,
        };

        let storage: Rc<dyn Storage> = match config.db_path() {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                match SqliteStore::open(&path) {
                    Ok(store) => Rc::new(store),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "falling back to in-memory storage");
                        Rc::new(MemoryStore::new())
                    }
                }
            }
            None => Rc::new(MemoryStore::new()),
        };

        Ok(Self::with_parts(config, bank, storage))
    }

    pub fn with_parts(config: Config, bank: QuestionBank, storage: Rc<dyn Storage>) -> Self {
        if let Err(err) = bank.check_pool(&config.exam) {
            tracing::warn!(error = %err, "question bank cannot fill a full quiz");
        }

        let deck = FlashcardDeck::load(bank.all().to_vec(), storage.clone())
            .with_advance_delay(config.study.auto_advance_delay());

        Self {
            quiz: QuizSession::new(config.exam.clone()),
            study: StudySession::new(bank.all().to_vec()),
            flashcards: FlashcardSession::new(deck),
            progress: ProgressStore::load(storage),
            timer: None,
            history: RouteHistory::new(),
            picker: None,
            view: View::Home,
            selected_menu: 0,
            results_scroll: 0,
            editing: false,
            input_buffer: String::new(),
            input_field: InputField::None,
            message: None,
            show_help: false,
            config,
            bank,
        }
    }

    pub fn can_quit(&self) -> bool {
        !self.editing && !self.quiz.is_in_progress()
    }

    /// Periodic update from the event loop.
    pub fn tick(&mut self) {
        let now = Instant::now();

        match self.timer.as_mut().and_then(|t| t.poll(now)) {
            Some(TimerEvent::TimedOut) => {
                self.finish_quiz();
                self.message = Some("Time is up! The quiz was submitted.".to_string());
            }
            Some(TimerEvent::WarningStarted) => {
                if let Some(timer) = &self.timer {
                    self.message = Some(format!("{} remaining", timer.formatted()));
                }
            }
            Some(TimerEvent::Tick) | None => {}
        }

        self.flashcards.tick(now);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.message = None;

        if self.show_help {
            self.show_help = false;
            return;
        }

        if self.editing {
            self.handle_edit_key(key);
            return;
        }

        if self.picker.is_some() {
            self.handle_picker_key(key);
            return;
        }

        if key.code == KeyCode::Char('?') {
            self.show_help = true;
            return;
        }

        match self.view {
            View::Home => self.handle_home_key(key),
            View::Quiz => self.handle_quiz_key(key),
            View::Results => self.handle_results_key(key),
            View::Study => self.handle_study_key(key),
            View::Flashcards => self.handle_flashcards_key(key),
            View::Progress => self.handle_progress_key(key),
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.stop_editing(),
            KeyCode::Enter => self.finish_editing(),
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() => self.input_buffer.push(c),
            _ => {}
        }
    }

    fn stop_editing(&mut self) {
        self.editing = false;
        self.input_buffer.clear();
        self.input_field = InputField::None;
    }

    fn finish_editing(&mut self) {
        match self.input_field {
            InputField::GoToQuestion => {
                let total = self.quiz.progress().total;
                match self.input_buffer.parse::<usize>() {
                    Ok(n) if (1..=total).contains(&n) => self.quiz.go_to_question(n - 1),
                    _ => self.message = Some(format!("Enter a number between 1 and {total}")),
                }
            }
            InputField::None => {}
        }
        self.stop_editing();
    }

    fn handle_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected_menu = (self.selected_menu + 1).min(MenuItem::ALL.len() - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_menu = self.selected_menu.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(MenuItem::ALL[self.selected_menu]),
            KeyCode::Char('p') => self.view = View::Progress,
            KeyCode::Backspace => self.go_back(),
            _ => {}
        }
    }

    fn activate(&mut self, item: MenuItem) {
        match item {
            MenuItem::Quiz => self.start_quiz(),
            MenuItem::Study => self.start_study(None),
            MenuItem::StudyByCategory => self.open_picker(PickerTarget::Study),
            MenuItem::AllCards => self.start_cards(None),
            MenuItem::CardsByCategory => self.open_picker(PickerTarget::Flashcards),
            MenuItem::FilteredCards(filter) => {
                self.flashcards.set_category(None);
                let route = self.flashcards.start_filtered_cards(filter);
                self.push_route(route);
                if self.flashcards.deck().deck().is_empty() {
                    self.message = Some(format!("No {} cards", filter.label().to_lowercase()));
                }
            }
            MenuItem::Progress => self.view = View::Progress,
        }
    }

    fn open_picker(&mut self, target: PickerTarget) {
        self.picker = Some(CategoryPicker { target, selected: 0 });
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        let Some(picker) = self.picker.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                picker.selected = (picker.selected + 1).min(Category::ALL.len() - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                picker.selected = picker.selected.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let CategoryPicker { target, selected } = *picker;
                self.picker = None;
                let category = Category::ALL[selected];
                match target {
                    PickerTarget::Study => self.start_study(Some(category)),
                    PickerTarget::Flashcards => self.start_cards(Some(category)),
                }
            }
            KeyCode::Esc => self.picker = None,
            _ => {}
        }
    }

    /// Study the whole bank, or one category of it.
    pub fn start_study(&mut self, category: Option<Category>) {
        let questions = match category {
            Some(category) => self.bank.by_category(category),
            None => self.bank.all().to_vec(),
        };
        if questions.is_empty() {
            self.message = Some("No questions to study".to_string());
            return;
        }
        self.study = StudySession::new(questions);
        let route = self.study.start_study();
        self.push_route(route);
    }

    /// Review every card, or the cards of one category.
    pub fn start_cards(&mut self, category: Option<Category>) {
        self.flashcards.set_category(category);
        let route = self.flashcards.start_all_cards();
        self.push_route(route);
        if self.flashcards.deck().deck().is_empty() {
            self.message = Some("No cards to review".to_string());
        }
    }

    pub fn start_quiz(&mut self) {
        match self.quiz.start_quiz(self.bank.all()) {
            Ok(()) => {
                let exam = &self.config.exam;
                let mut timer = CountdownTimer::new(exam.duration_secs, exam.warning_threshold_secs);
                timer.start();
                self.timer = Some(timer);
                self.results_scroll = 0;
                self.view = View::Quiz;
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot start quiz");
                self.message = Some(err.to_string());
            }
        }
    }

    pub fn finish_quiz(&mut self) {
        self.timer = None;
        if self.quiz.finish_quiz(&mut self.progress).is_some() {
            self.view = View::Results;
        }
    }

    fn abandon_quiz(&mut self) {
        self.timer = None;
        self.quiz.reset_quiz();
        self.view = View::Home;
        self.message = Some("Quiz abandoned".to_string());
    }

    fn handle_quiz_key(&mut self, key: KeyEvent) {
        let options = self.quiz.current_question().map_or(0, |q| q.options.len());
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.quiz.previous_question(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter => self.quiz.next_question(),
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(i) = next_option(self.quiz.current_answer(), options) {
                    self.quiz.select_answer(i);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(i) = previous_option(self.quiz.current_answer(), options) {
                    self.quiz.select_answer(i);
                }
            }
            KeyCode::Char(c @ 'a'..='d') => self.quiz.select_answer(usize::from(c as u8 - b'a')),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let Some(i) = NavKey::from_char(c).and_then(|k| k.option_index(options)) {
                    self.quiz.select_answer(i);
                }
            }
            KeyCode::Char('g') => {
                self.editing = true;
                self.input_field = InputField::GoToQuestion;
                self.input_buffer.clear();
            }
            KeyCode::Char('f') => self.finish_quiz(),
            KeyCode::Esc => self.abandon_quiz(),
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        let incorrect = self.quiz.result().map_or(0, |r| r.incorrect().count());
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.results_scroll = (self.results_scroll + 1).min(incorrect.saturating_sub(1));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.results_scroll = self.results_scroll.saturating_sub(1);
            }
            KeyCode::Char('r') => self.start_quiz(),
            KeyCode::Esc | KeyCode::Enter => {
                self.quiz.reset_quiz();
                self.view = View::Home;
            }
            _ => {}
        }
    }

    fn handle_study_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Backspace {
            self.go_back();
            return;
        }
        let Some(nav) = nav_key(&key) else { return };
        if let Some(route) = self.study.handle_key(nav) {
            if self.study.answered_count() > 0 {
                self.message = Some(format!(
                    "Study session: {}/{} correct",
                    self.study.correct_count(),
                    self.study.answered_count()
                ));
            }
            self.push_route(route);
        }
    }

    fn handle_flashcards_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Backspace {
            self.go_back();
            return;
        }
        let Some(nav) = nav_key(&key) else { return };
        if let Some(route) = self.flashcards.handle_key(nav, Instant::now()) {
            self.push_route(route);
        }
    }

    fn handle_progress_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('R') => {
                self.progress.reset_progress();
                self.message = Some("Quiz progress reset".to_string());
            }
            KeyCode::Char('F') => {
                self.flashcards.deck_mut().reset_progress();
                self.message = Some("Flashcard progress reset".to_string());
            }
            KeyCode::Esc => self.view = View::Home,
            _ => {}
        }
    }

    /// Record a route the controllers already reflect and show its view.
    fn push_route(&mut self, route: SessionRoute) {
        let previous = self.history.push(route);
        tracing::debug!(from = %previous, to = %route, "navigate");
        self.show_route(&route);
    }

    /// Replay the previous route through the session controllers.
    pub fn go_back(&mut self) {
        let Some((route, old)) = self.history.back() else {
            return;
        };
        tracing::debug!(from = %old, to = %route, "navigate back");
        self.study.sync_route(&route);
        self.flashcards.sync_route(&route, Some(&old));
        self.show_route(&route);
    }

    fn show_route(&mut self, route: &SessionRoute) {
        self.view = match route.mode {
            Some(SessionMode::Study) => View::Study,
            Some(SessionMode::Session) => View::Flashcards,
            None if matches!(self.view, View::Study | View::Flashcards) => View::Home,
            None => self.view,
        };
    }
}

/// Map a terminal key to a session navigation key.
pub fn nav_key(key: &KeyEvent) -> Option<NavKey> {
    match key.code {
        KeyCode::Left => Some(NavKey::Left),
        KeyCode::Right => Some(NavKey::Right),
        KeyCode::Up => Some(NavKey::Up),
        KeyCode::Down => Some(NavKey::Down),
        KeyCode::Enter => Some(NavKey::Enter),
        KeyCode::Esc => Some(NavKey::Escape),
        KeyCode::Char(c) => NavKey::from_char(c),
        _ => None,
    }
}
