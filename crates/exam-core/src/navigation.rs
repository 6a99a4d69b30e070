//! Session-control signals and back navigation.
//!
//! A route is the pair of `mode` and `filter` parameters, written as a query
//! string such as `mode=session&filter=known`. Controllers react to route
//! changes; the history replays earlier routes on "back".

use crate::flashcards::FlashcardFilter;
use std::fmt;

/// Which session a route asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Flashcard review.
    Session,
    Study,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Study => "study",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "session" => Some(Self::Session),
            "study" => Some(Self::Study),
            _ => None,
        }
    }
}

/// Parsed session-control signal. Unknown values parse as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionRoute {
    pub mode: Option<SessionMode>,
    pub filter: Option<FlashcardFilter>,
}

impl SessionRoute {
    pub fn home() -> Self {
        Self::default()
    }

    pub fn study() -> Self {
        Self {
            mode: Some(SessionMode::Study),
            filter: None,
        }
    }

    pub fn flashcards(filter: Option<FlashcardFilter>) -> Self {
        Self {
            mode: Some(SessionMode::Session),
            filter,
        }
    }

    /// Parse `mode=...&filter=...`. A leading `?` is accepted.
    pub fn parse(query: &str) -> Self {
        let mut route = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "mode" => route.mode = SessionMode::parse(value),
                "filter" => route.filter = FlashcardFilter::parse(value),
                _ => {}
            }
        }
        route
    }

    pub fn is_mode(&self, mode: SessionMode) -> bool {
        self.mode == Some(mode)
    }
}

impl fmt::Display for SessionRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(mode) = self.mode {
            parts.push(format!("mode={}", mode.as_str()));
        }
        if let Some(filter) = self.filter {
            parts.push(format!("filter={}", filter.as_str()));
        }
        write!(f, "{}", parts.join("&"))
    }
}

/// Most routes kept for "back"; older ones are forgotten.
pub const MAX_HISTORY: usize = 32;

/// Stack of visited routes, bounded by [`MAX_HISTORY`].
#[derive(Debug, Clone, Default)]
pub struct RouteHistory {
    entries: Vec<SessionRoute>,
}

impl RouteHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SessionRoute {
        self.entries.last().copied().unwrap_or_default()
    }

    /// Navigate to `route`, returning the route that was current before.
    ///
    /// Pushing the current route again is a no-op. Returning to the route
    /// just below the top pops back to it instead of growing the stack.
    pub fn push(&mut self, route: SessionRoute) -> SessionRoute {
        let previous = self.current();
        if previous == route && !self.entries.is_empty() {
            return previous;
        }
        let len = self.entries.len();
        if len >= 2 && self.entries[len - 2] == route {
            self.entries.pop();
            return previous;
        }
        if len == MAX_HISTORY {
            self.entries.remove(0);
        }
        self.entries.push(route);
        previous
    }

    /// Go back one entry. Returns `(new, old)` routes, or `None` at the start.
    pub fn back(&mut self) -> Option<(SessionRoute, SessionRoute)> {
        let old = self.entries.pop()?;
        Some((self.current(), old))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route() {
        let route = SessionRoute::parse("?mode=session&filter=needs-review");
        assert_eq!(route, SessionRoute::flashcards(Some(FlashcardFilter::NeedsReview)));

        assert_eq!(SessionRoute::parse("mode=study"), SessionRoute::study());
        assert_eq!(SessionRoute::parse(""), SessionRoute::home());
    }

    #[test]
    fn test_parse_ignores_invalid_values() {
        let route = SessionRoute::parse("mode=session&filter=bogus&page=2");
        assert_eq!(route, SessionRoute::flashcards(None));
        assert_eq!(SessionRoute::parse("mode=quiz").mode, None);
    }

    #[test]
    fn test_display() {
        let route = SessionRoute::flashcards(Some(FlashcardFilter::Unseen));
        assert_eq!(route.to_string(), "mode=session&filter=unseen");
        assert_eq!(SessionRoute::parse(&route.to_string()), route);
        assert_eq!(SessionRoute::home().to_string(), "");
    }

    #[test]
    fn test_history_back() {
        let mut history = RouteHistory::new();
        assert_eq!(history.push(SessionRoute::flashcards(None)), SessionRoute::home());
        history.push(SessionRoute::flashcards(Some(FlashcardFilter::Known)));

        let (new, old) = history.back().unwrap();
        assert_eq!(new, SessionRoute::flashcards(None));
        assert_eq!(old, SessionRoute::flashcards(Some(FlashcardFilter::Known)));

        let (new, _) = history.back().unwrap();
        assert_eq!(new, SessionRoute::home());
        assert!(history.back().is_none());
    }

    #[test]
    fn test_history_skips_duplicates() {
        let mut history = RouteHistory::new();
        history.push(SessionRoute::study());
        history.push(SessionRoute::study());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_history_collapses_exit_and_restart() {
        let mut history = RouteHistory::new();
        history.push(SessionRoute::study());
        for _ in 0..100 {
            history.push(SessionRoute::home());
            history.push(SessionRoute::study());
        }

        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), SessionRoute::study());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = RouteHistory::new();
        let routes = [
            SessionRoute::study(),
            SessionRoute::flashcards(None),
            SessionRoute::flashcards(Some(FlashcardFilter::Known)),
        ];
        for i in 0..200 {
            history.push(routes[i % routes.len()]);
        }

        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.current(), routes[199 % routes.len()]);
        assert!(history.back().is_some());
    }
}
