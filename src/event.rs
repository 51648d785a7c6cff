//! Values handed out by a source: decoded [`Event`]s and the [`SourceEvent`]s wrapping them

use bytes::Bytes;
use bytes_utils::Str;

use crate::{constants::MESSAGE_STR, errors::SourceError};

/// Copies a borrowed str into an owned [Str]
pub(crate) fn str_from(value: &str) -> Str {
    // Safety: the bytes come straight out of a &str
    unsafe { Str::from_inner_unchecked(Bytes::copy_from_slice(value.as_bytes())) }
}

/// Event decoded from a response body, immutable once dispatched
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Event type, `"message"` unless the record carried an `event` field
    pub event: Str,
    /// Payload lines joined with `\n`
    pub data: Str,
    /// URL of the source that produced the event
    pub origin: Str,
    /// Last event id in effect when the record was finished, empty when there was none
    pub last_event_id: Str,
}

impl Event {
    /// Whether this event belongs to the default `"message"` family
    pub fn is_message(&self) -> bool {
        self.event == MESSAGE_STR
    }

    /// The listener key this event is dispatched under
    pub fn kind(&self) -> EventKind {
        if self.is_message() {
            EventKind::Message
        } else {
            EventKind::Custom(self.event.clone())
        }
    }
}

/// Lifecycle of a source. [`ReadyState::Closed`] is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    #[default]
    Connecting,
    Open,
    Closed,
}

impl ReadyState {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Key of the listener table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    Open,
    Error,
    Message,
    /// Events whose `event` field named something other than `message`
    Custom(Str),
}

impl EventKind {
    /// Maps an event type name onto its listener key, `"open"`, `"error"` and `"message"` map to the built-in kinds
    pub fn from_name(name: &str) -> Self {
        match name {
            "open" => Self::Open,
            "error" => Self::Error,
            "message" => Self::Message,
            other => Self::Custom(str_from(other)),
        }
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        Self::from_name(value)
    }
}

/// Everything a source delivers to its consumer, in delivery order
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// The source moved from connecting to open
    Open,
    /// A recoverable failure, the source keeps polling
    Error(SourceError),
    Message(Event),
}

impl SourceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SourceEvent::Open => EventKind::Open,
            SourceEvent::Error(_) => EventKind::Error,
            SourceEvent::Message(event) => event.kind(),
        }
    }

    /// The decoded event, if this is one
    pub fn into_event(self) -> Option<Event> {
        match self {
            SourceEvent::Message(event) => Some(event),
            _ => None,
        }
    }
}
