//! Flashcard review: the persisted deck and its session controller.

use crate::category::Category;
use crate::clock::Clock;
use crate::keyboard::NavKey;
use crate::models::{FlashcardProgress, FlashcardStatus, Question};
use crate::navigation::{SessionMode, SessionRoute};
use crate::shuffle::shuffle_with;
use crate::storage::{load_or_default, save_best_effort, Storage};
use rand::{rng, Rng};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Storage key for the flashcard document.
pub const FLASHCARDS_KEY: &str = "examen-civique-flashcards";

/// Delay between marking a card and moving to the next one.
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(500);

/// Restricts a session to cards in one review state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlashcardFilter {
    Known,
    NeedsReview,
    /// Cards never marked.
    Unseen,
}

impl FlashcardFilter {
    pub const ALL: [FlashcardFilter; 3] = [Self::Known, Self::NeedsReview, Self::Unseen];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "known" => Some(Self::Known),
            "needs-review" => Some(Self::NeedsReview),
            "unseen" => Some(Self::Unseen),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Known => "known",
            Self::NeedsReview => "needs-review",
            Self::Unseen => "unseen",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Known => "Known",
            Self::NeedsReview => "Needs review",
            Self::Unseen => "Unseen",
        }
    }

    fn matches(self, status: Option<FlashcardStatus>) -> bool {
        match self {
            Self::Known => status == Some(FlashcardStatus::Known),
            Self::NeedsReview => status == Some(FlashcardStatus::NeedsReview),
            Self::Unseen => status.is_none(),
        }
    }
}

/// Review-state counts over a set of cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlashcardStats {
    pub total: usize,
    pub known: usize,
    pub needs_review: usize,
    pub unseen: usize,
}

impl FlashcardStats {
    fn tally(statuses: impl Iterator<Item = Option<FlashcardStatus>>) -> Self {
        statuses.fold(Self::default(), |mut stats, status| {
            stats.total += 1;
            match status {
                Some(FlashcardStatus::Known) => stats.known += 1,
                Some(FlashcardStatus::NeedsReview) => stats.needs_review += 1,
                None => stats.unseen += 1,
            }
            stats
        })
    }
}

/// Which cards a session draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub category: Option<Category>,
    pub filter: Option<FlashcardFilter>,
}

/// Persisted review state plus the deck currently being reviewed.
pub struct FlashcardDeck {
    questions: Vec<Question>,
    storage: Rc<dyn Storage>,
    clock: Clock,
    progress: FlashcardProgress,
    deck: Vec<Question>,
    current_index: usize,
    flipped: bool,
    advance_delay: Duration,
    /// When the scheduled advance to the next card is due.
    pending_advance: Option<Instant>,
}

impl FlashcardDeck {
    /// Load review state for `questions` from storage.
    pub fn load(questions: Vec<Question>, storage: Rc<dyn Storage>) -> Self {
        let progress = load_or_default(storage.as_ref(), FLASHCARDS_KEY);
        Self {
            questions,
            storage,
            clock: Clock::default(),
            progress,
            deck: Vec::new(),
            current_index: 0,
            flipped: false,
            advance_delay: DEFAULT_ADVANCE_DELAY,
            pending_advance: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    pub fn progress(&self) -> &FlashcardProgress {
        &self.progress
    }

    /// Stored status of a card; `None` means unseen.
    pub fn card_status(&self, id: &str) -> Option<FlashcardStatus> {
        self.progress.cards.get(id).copied()
    }

    /// Build a new shuffled deck. Cancels any scheduled advance.
    pub fn start_session(&mut self, options: SessionOptions) {
        self.start_session_with(options, &mut rng());
    }

    pub fn start_session_with<R: Rng + ?Sized>(&mut self, options: SessionOptions, rng: &mut R) {
        let selected: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| options.category.map_or(true, |c| q.category == c))
            .filter(|q| options.filter.map_or(true, |f| f.matches(self.card_status(&q.id))))
            .cloned()
            .collect();

        self.deck = shuffle_with(&selected, rng);
        self.current_index = 0;
        self.flipped = false;
        self.pending_advance = None;
        tracing::debug!(
            cards = self.deck.len(),
            category = ?options.category,
            filter = ?options.filter,
            "flashcard session started"
        );
    }

    pub fn deck(&self) -> &[Question] {
        &self.deck
    }

    pub fn current_card(&self) -> Option<&Question> {
        self.deck.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn is_advancing(&self) -> bool {
        self.pending_advance.is_some()
    }

    pub fn flip_card(&mut self) {
        self.flipped = !self.flipped;
    }

    /// Record a status for the current card and persist it.
    ///
    /// Unless this is the last card, the card flips back and an advance is
    /// scheduled for `now` plus the advance delay. Ignored while an advance
    /// is already pending.
    pub fn mark_card(&mut self, status: FlashcardStatus, now: Instant) {
        if self.pending_advance.is_some() {
            return;
        }
        let Some(card) = self.deck.get(self.current_index) else {
            return;
        };

        let previous = self.progress.cards.insert(card.id.clone(), status);
        if previous.is_none() {
            self.progress.total_reviewed += 1;
        }
        self.progress.last_session = Some(self.clock.now());
        self.save();

        if self.current_index + 1 < self.deck.len() {
            self.flipped = false;
            self.pending_advance = Some(now + self.advance_delay);
        }
    }

    /// Resolve a due advance. Returns whether the deck moved.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending_advance {
            Some(due) if due <= now => {
                self.pending_advance = None;
                if self.current_index + 1 < self.deck.len() {
                    self.current_index += 1;
                }
                true
            }
            _ => false,
        }
    }

    pub fn cancel_pending(&mut self) {
        self.pending_advance = None;
    }

    pub fn next_card(&mut self) {
        self.cancel_pending();
        if self.current_index + 1 < self.deck.len() {
            self.current_index += 1;
            self.flipped = false;
        }
    }

    pub fn previous_card(&mut self) {
        self.cancel_pending();
        if self.current_index > 0 {
            self.current_index -= 1;
            self.flipped = false;
        }
    }

    /// Forget every stored status and persist.
    pub fn reset_progress(&mut self) {
        self.progress = FlashcardProgress::default();
        self.save();
    }

    /// Counts over the current deck.
    pub fn deck_stats(&self) -> FlashcardStats {
        FlashcardStats::tally(self.deck.iter().map(|q| self.card_status(&q.id)))
    }

    /// Counts over every question.
    pub fn global_stats(&self) -> FlashcardStats {
        FlashcardStats::tally(self.questions.iter().map(|q| self.card_status(&q.id)))
    }

    pub fn category_stats(&self, category: Category) -> FlashcardStats {
        FlashcardStats::tally(
            self.questions
                .iter()
                .filter(|q| q.category == category)
                .map(|q| self.card_status(&q.id)),
        )
    }

    /// Number of distinct cards ever marked.
    pub fn total_reviewed(&self) -> u32 {
        self.progress.total_reviewed
    }

    fn save(&self) {
        save_best_effort(self.storage.as_ref(), FLASHCARDS_KEY, &self.progress);
    }
}

/// Drives a [`FlashcardDeck`] from keys and route changes.
pub struct FlashcardSession {
    deck: FlashcardDeck,
    category: Option<Category>,
    in_session: bool,
    current_filter: Option<FlashcardFilter>,
}

impl FlashcardSession {
    pub fn new(deck: FlashcardDeck) -> Self {
        Self {
            deck,
            category: None,
            in_session: false,
            current_filter: None,
        }
    }

    /// Restrict sessions to one category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.set_category(Some(category));
        self
    }

    /// Category scope for sessions started from now on; `None` for all.
    pub fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn deck(&self) -> &FlashcardDeck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut FlashcardDeck {
        &mut self.deck
    }

    pub fn is_in_session(&self) -> bool {
        self.in_session
    }

    pub fn current_filter(&self) -> Option<FlashcardFilter> {
        self.current_filter
    }

    pub fn can_go_back(&self) -> bool {
        self.deck.current_index() > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.deck.current_index() + 1 < self.deck.deck().len()
    }

    fn begin(&mut self, filter: Option<FlashcardFilter>) {
        self.deck.start_session(SessionOptions {
            category: self.category,
            filter,
        });
        self.current_filter = filter;
        self.in_session = true;
    }

    fn end(&mut self) {
        self.deck.cancel_pending();
        self.in_session = false;
        self.current_filter = None;
    }

    /// Start reviewing every card. Returns the route to navigate to.
    pub fn start_all_cards(&mut self) -> SessionRoute {
        self.begin(None);
        SessionRoute::flashcards(None)
    }

    pub fn start_filtered_cards(&mut self, filter: FlashcardFilter) -> SessionRoute {
        self.begin(Some(filter));
        SessionRoute::flashcards(Some(filter))
    }

    pub fn exit_session(&mut self) -> SessionRoute {
        self.end();
        SessionRoute::home()
    }

    /// React to a route change.
    ///
    /// Entering the session mode starts a session unless one is running; a
    /// running session restarts only when the filter changed. Leaving the
    /// mode ends the session.
    pub fn sync_route(&mut self, route: &SessionRoute, previous: Option<&SessionRoute>) {
        if route.is_mode(SessionMode::Session) {
            let filter_changed = previous
                .is_some_and(|old| old.is_mode(SessionMode::Session) && old.filter != route.filter);
            if !self.in_session || filter_changed {
                self.begin(route.filter);
            }
        } else if self.in_session {
            self.end();
        }
    }

    /// Handle a key. Returns a route to navigate to, if any.
    pub fn handle_key(&mut self, key: NavKey, now: Instant) -> Option<SessionRoute> {
        if !self.in_session {
            return None;
        }
        match key {
            NavKey::Space => self.deck.flip_card(),
            NavKey::Left => self.deck.previous_card(),
            NavKey::Right => self.deck.next_card(),
            NavKey::Digit(1) if self.deck.is_flipped() => {
                self.deck.mark_card(FlashcardStatus::NeedsReview, now)
            }
            NavKey::Digit(2) if self.deck.is_flipped() => {
                self.deck.mark_card(FlashcardStatus::Known, now)
            }
            NavKey::Escape => return Some(self.exit_session()),
            _ => {}
        }
        None
    }

    /// Resolve a due auto-advance.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.deck.tick(now)
    }
}
