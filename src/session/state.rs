//! Session state machine.

/// Represents the lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Session object exists but `start()` has not been called.
    #[default]
    Unstarted,
    /// Session is started and its attributes are accessible.
    Active,
    /// Session was written (or aborted) and released.
    Closed,
    /// Session data was destroyed; only a fresh start is possible.
    Destroyed,
}

impl SessionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Unstarted -> Active
    /// - Closed -> Active (reopen)
    /// - Destroyed -> Active (fresh session)
    /// - Active -> Closed
    /// - any -> Destroyed
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (*self, target),
            (Unstarted, Active)
                | (Closed, Active)
                | (Destroyed, Active)
                | (Active, Closed)
                | (_, Destroyed)
        )
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `Ok(())` if the transition is valid, or an error otherwise.
    pub fn transition_to(&mut self, target: SessionState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::SessionError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Check if attributes may be read or written.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }

    /// Check if the session was started at some point and not destroyed.
    pub fn is_started(&self) -> bool {
        matches!(self, SessionState::Active | SessionState::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let mut state = SessionState::Unstarted;
        assert!(state.transition_to(SessionState::Active).is_ok());
        assert_eq!(state, SessionState::Active);

        assert!(state.transition_to(SessionState::Closed).is_ok());
        assert_eq!(state, SessionState::Closed);

        // Reopen
        assert!(state.transition_to(SessionState::Active).is_ok());
        assert!(state.transition_to(SessionState::Destroyed).is_ok());
        assert_eq!(state, SessionState::Destroyed);

        // Fresh start after destroy
        assert!(state.transition_to(SessionState::Active).is_ok());
    }

    #[test]
    fn test_invalid_active_to_active() {
        let mut state = SessionState::Active;
        assert!(state.transition_to(SessionState::Active).is_err());
        assert_eq!(state, SessionState::Active);
    }

    #[test]
    fn test_invalid_close_without_start() {
        let mut state = SessionState::Unstarted;
        assert!(state.transition_to(SessionState::Closed).is_err());
        assert_eq!(state, SessionState::Unstarted);

        let mut state = SessionState::Closed;
        assert!(state.transition_to(SessionState::Closed).is_err());
        assert!(state.transition_to(SessionState::Unstarted).is_err());
    }

    #[test]
    fn test_destroy_from_any_state() {
        for from in [
            SessionState::Unstarted,
            SessionState::Active,
            SessionState::Closed,
            SessionState::Destroyed,
        ] {
            assert!(from.can_transition_to(SessionState::Destroyed), "{:?}", from);
        }
    }

    #[test]
    fn test_queries() {
        assert!(!SessionState::Unstarted.is_active());
        assert!(SessionState::Active.is_active());
        assert!(!SessionState::Closed.is_active());

        assert!(!SessionState::Unstarted.is_started());
        assert!(SessionState::Active.is_started());
        assert!(SessionState::Closed.is_started());
        assert!(!SessionState::Destroyed.is_started());
    }

    #[test]
    fn test_default() {
        assert_eq!(SessionState::default(), SessionState::Unstarted);
    }
}
