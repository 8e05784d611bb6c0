//! Dashboard Sessions
//!
//! One session per connected viewer. A session owns the only mutable
//! dashboard state, the auto-refresh flag; it is created when the viewer
//! connects and dropped when they leave.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Unique identifier for a session
pub type SessionId = String;

/// Per-session state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub auto_refresh: bool,
}

impl SessionState {
    /// Flip auto-refresh and return the new value
    pub fn toggle(&mut self) -> bool {
        self.auto_refresh = !self.auto_refresh;
        self.auto_refresh
    }
}

/// A viewer session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<SessionId>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            state: SessionState::default(),
        }
    }

    /// Start the session with auto-refresh already set
    pub fn with_auto_refresh(mut self, enabled: bool) -> Self {
        self.state.auto_refresh = enabled;
        self
    }

    pub fn auto_refresh(&self) -> bool {
        self.state.auto_refresh
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_without_auto_refresh() {
        let session = Session::new();
        assert!(!session.auto_refresh());
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_toggle_parity() {
        for flips in 0..7 {
            let mut state = SessionState::default();
            for _ in 0..flips {
                state.toggle();
            }
            assert_eq!(state.auto_refresh, flips % 2 == 1, "after {} flips", flips);
        }
    }

    #[test]
    fn test_toggle_returns_new_value() {
        let mut state = SessionState::default();
        assert!(state.toggle());
        assert!(!state.toggle());
    }

    #[test]
    fn test_with_auto_refresh() {
        let mut session = Session::new().with_auto_refresh(true);
        assert!(session.auto_refresh());
        session.state.toggle();
        assert!(!session.auto_refresh());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut a = Session::new();
        let b = Session::new();
        a.state.toggle();
        assert!(a.auto_refresh());
        assert!(!b.auto_refresh());
        assert_ne!(a.id, b.id);
    }
}
