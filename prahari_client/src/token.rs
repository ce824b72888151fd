//! Session anti-forgery token

use once_cell::sync::OnceCell;
use uuid::Uuid;

/// Anti-forgery token scoped to one client session.
///
/// Created lazily on first use, then stable for the client's lifetime. An
/// opaque random value, not a server-issued credential: the backend pairs it
/// with the session cookie to confirm a state-changing request originated in
/// the application's own UI.
#[derive(Debug, Default)]
pub struct SessionToken {
    cell: OnceCell<String>,
}

impl SessionToken {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// The token, created on first call.
    pub fn get(&self) -> &str {
        self.cell.get_or_init(|| Uuid::new_v4().simple().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_stable_within_a_session() {
        let token = SessionToken::new();
        let first = token.get().to_string();

        assert_eq!(token.get(), first);
    }

    #[test]
    fn test_tokens_differ_across_sessions() {
        let a = SessionToken::new();
        let b = SessionToken::new();

        assert_ne!(a.get(), b.get());
    }

    #[test]
    fn test_token_is_header_safe() {
        let token = SessionToken::new();
        assert!(token.get().chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
