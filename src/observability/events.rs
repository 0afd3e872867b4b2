//! Observable table events
//!
//! Every log line emitted by the table names one of these events in its
//! `event` field.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Table lifecycle
    /// Options resolved and columns mapped
    TableOpened,
    /// Options rejected; the table cannot be used
    TableRejected,

    // Planning
    /// Count request for the planner failed
    CountFailed,

    // Scans
    /// Initial search issued
    ScanBegin,
    /// Another page fetched through the cursor
    PageFetched,
    /// Final page seen
    ScanExhausted,
    /// Search or scroll request failed; the scan yields no more rows
    ScanFailed,
    /// Cursor released
    CursorReleased,
    /// Cursor release request failed
    CursorReleaseFailed,

    // Writes
    /// Row cannot be written because it has no identity
    MissingIdentity,
    /// Document written
    DocumentIndexed,
    /// Index request failed
    IndexFailed,
    /// Document removed
    DocumentDeleted,
    /// Delete request failed
    DeleteFailed,
    /// Read-back found no document
    ReadBackEmpty,
    /// Read-back request failed
    ReadBackFailed,

    // Transport
    /// Connection option not understood by the store client
    ConnectionOptionIgnored,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::TableOpened => "TABLE_OPENED",
            Event::TableRejected => "TABLE_REJECTED",

            Event::CountFailed => "COUNT_FAILED",

            Event::ScanBegin => "SCAN_BEGIN",
            Event::PageFetched => "PAGE_FETCHED",
            Event::ScanExhausted => "SCAN_EXHAUSTED",
            Event::ScanFailed => "SCAN_FAILED",
            Event::CursorReleased => "CURSOR_RELEASED",
            Event::CursorReleaseFailed => "CURSOR_RELEASE_FAILED",

            Event::MissingIdentity => "MISSING_IDENTITY",
            Event::DocumentIndexed => "DOCUMENT_INDEXED",
            Event::IndexFailed => "INDEX_FAILED",
            Event::DocumentDeleted => "DOCUMENT_DELETED",
            Event::DeleteFailed => "DELETE_FAILED",
            Event::ReadBackEmpty => "READ_BACK_EMPTY",
            Event::ReadBackFailed => "READ_BACK_FAILED",

            Event::ConnectionOptionIgnored => "CONNECTION_OPTION_IGNORED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake() {
        for event in [
            Event::TableOpened,
            Event::ScanFailed,
            Event::ReadBackEmpty,
            Event::ConnectionOptionIgnored,
        ] {
            let name = event.as_str();
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
            assert_eq!(event.to_string(), name);
        }
    }

}
