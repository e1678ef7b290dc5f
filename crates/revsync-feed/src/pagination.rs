//! Cursor state for the feed's continuation-token pagination.
//!
//! The first request carries no token. Each response may carry an opaque
//! token for the next, older page; a missing or empty token means the feed
//! is exhausted.

/// Where the next page request starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// No request made yet; start at the newest page.
    Start,
    /// Continue from the token returned with the previous page.
    Next(String),
    /// The feed reported no further pages.
    Exhausted,
}

impl PageCursor {
    /// Builds the cursor that follows a page carrying `next_token`.
    #[must_use]
    pub fn after(next_token: Option<String>) -> Self {
        match next_token {
            Some(token) if !token.is_empty() => PageCursor::Next(token),
            _ => PageCursor::Exhausted,
        }
    }

    /// The token to send with the next request, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            PageCursor::Next(token) => Some(token.as_str()),
            PageCursor::Start | PageCursor::Exhausted => None,
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, PageCursor::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_has_no_token() {
        assert!(PageCursor::Start.token().is_none());
        assert!(!PageCursor::Start.is_exhausted());
    }

    #[test]
    fn after_with_token_continues() {
        let cursor = PageCursor::after(Some("CgwI".to_owned()));
        assert_eq!(cursor, PageCursor::Next("CgwI".to_owned()));
        assert_eq!(cursor.token(), Some("CgwI"));
    }

    #[test]
    fn after_without_token_is_exhausted() {
        assert!(PageCursor::after(None).is_exhausted());
    }

    #[test]
    fn after_with_empty_token_is_exhausted() {
        assert!(PageCursor::after(Some(String::new())).is_exhausted());
    }
}
