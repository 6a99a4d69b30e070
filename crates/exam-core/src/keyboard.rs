//! Terminal-independent navigation keys shared by the session controllers.

/// A key the session controllers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    Space,
    Left,
    Right,
    Up,
    Down,
    Enter,
    Escape,
    /// A digit key, `0..=9`.
    Digit(u8),
}

impl NavKey {
    /// Map a typed character, if it is one of the navigation keys.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(Self::Space),
            '\n' | '\r' => Some(Self::Enter),
            _ => c.to_digit(10).map(|d| Self::Digit(d as u8)),
        }
    }

    /// The zero-based option index for digit keys `1..=count`.
    pub fn option_index(self, count: usize) -> Option<usize> {
        match self {
            Self::Digit(d) if d >= 1 && usize::from(d) <= count => Some(usize::from(d) - 1),
            _ => None,
        }
    }
}

/// Move a highlight down by one, wrapping. Nothing highlighted goes to the first option.
pub fn next_option(current: Option<usize>, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    Some(match current {
        Some(i) => (i + 1) % count,
        None => 0,
    })
}

/// Move a highlight up by one, wrapping. Nothing highlighted goes to the last option.
pub fn previous_option(current: Option<usize>, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    Some(match current {
        Some(i) => (i + count - 1) % count,
        None => count - 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_index() {
        assert_eq!(NavKey::Digit(1).option_index(4), Some(0));
        assert_eq!(NavKey::Digit(4).option_index(4), Some(3));
        assert_eq!(NavKey::Digit(5).option_index(4), None);
        assert_eq!(NavKey::Digit(0).option_index(4), None);
        assert_eq!(NavKey::Enter.option_index(4), None);
    }

    #[test]
    fn test_from_char() {
        assert_eq!(NavKey::from_char(' '), Some(NavKey::Space));
        assert_eq!(NavKey::from_char('3'), Some(NavKey::Digit(3)));
        assert_eq!(NavKey::from_char('x'), None);
    }

    #[test]
    fn test_option_cycling_wraps() {
        assert_eq!(next_option(None, 4), Some(0));
        assert_eq!(next_option(Some(3), 4), Some(0));
        assert_eq!(previous_option(None, 4), Some(3));
        assert_eq!(previous_option(Some(0), 4), Some(3));
        assert_eq!(previous_option(Some(2), 4), Some(1));
        assert_eq!(next_option(None, 0), None);
    }
}
