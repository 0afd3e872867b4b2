//! Cursor state of one scan

/// Where a scan stands with respect to its store-side cursor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanPhase {
    /// No cursor is held
    #[default]
    Idle,
    /// More pages may follow through `cursor`
    Streaming { cursor: String },
    /// The final page was seen; `cursor` still has to be released
    Exhausted { cursor: String },
}

/// Opaque cursor token of the active scan, if any
///
/// Owned by the caller and handed to every scan call, so an outstanding
/// cursor is always visible. A scan leaves it `Idle` only after the cursor
/// has been released.
#[derive(Debug, Default)]
pub struct PageState {
    phase: ScanPhase,
}

impl PageState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &ScanPhase {
        &self.phase
    }

    /// Whether a store-side cursor is still held
    pub fn is_active(&self) -> bool {
        self.phase != ScanPhase::Idle
    }

    pub fn cursor(&self) -> Option<&str> {
        match &self.phase {
            ScanPhase::Idle => None,
            ScanPhase::Streaming { cursor } | ScanPhase::Exhausted { cursor } => Some(cursor),
        }
    }

    /// Record the latest token returned by the store
    pub(crate) fn stream(&mut self, cursor: String) {
        self.phase = ScanPhase::Streaming { cursor };
    }

    /// Mark the final page as seen, keeping the cursor for release
    pub(crate) fn exhaust(&mut self) {
        if let ScanPhase::Streaming { cursor } = std::mem::take(&mut self.phase) {
            self.phase = ScanPhase::Exhausted { cursor };
        }
    }

    /// Take the cursor out for release, leaving the state `Idle`
    pub(crate) fn take_cursor(&mut self) -> Option<String> {
        match std::mem::take(&mut self.phase) {
            ScanPhase::Idle => None,
            ScanPhase::Streaming { cursor } | ScanPhase::Exhausted { cursor } => Some(cursor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut state = PageState::new();
        assert!(!state.is_active());
        assert_eq!(state.cursor(), None);

        state.stream("c1".into());
        assert_eq!(state.cursor(), Some("c1"));
        state.stream("c2".into());
        assert_eq!(state.phase(), &ScanPhase::Streaming { cursor: "c2".into() });

        state.exhaust();
        assert_eq!(state.phase(), &ScanPhase::Exhausted { cursor: "c2".into() });
        assert!(state.is_active());

        assert_eq!(state.take_cursor(), Some("c2".to_string()));
        assert!(!state.is_active());
        assert_eq!(state.take_cursor(), None);
    }

    #[test]
    fn test_exhaust_when_idle_stays_idle() {
        let mut state = PageState::new();
        state.exhaust();
        assert_eq!(state.phase(), &ScanPhase::Idle);
    }
}
