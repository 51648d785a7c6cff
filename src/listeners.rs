//! Listener table keyed by [`EventKind`]

use std::collections::BTreeMap;

use crate::event::{EventKind, SourceEvent};

/// Boxed listener, called with every event of the kind it was registered for
pub type Listener = Box<dyn FnMut(&SourceEvent) + Send>;

/// Returned by [`Listeners::add`], needed to remove the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Ordered listener lists per [`EventKind`]
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    table: BTreeMap<EventKind, Vec<(ListenerId, Listener)>>,
}

impl core::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.table.iter().map(|(kind, list)| (kind, list.len())))
            .finish()
    }
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&SourceEvent) + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.table
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Returns false if no such listener was registered for `kind`
    pub fn remove(&mut self, kind: &EventKind, id: ListenerId) -> bool {
        let Some(list) = self.table.get_mut(kind) else {
            return false;
        };
        let Some(position) = list.iter().position(|(listener_id, _)| *listener_id == id) else {
            return false;
        };
        list.remove(position);
        if list.is_empty() {
            self.table.remove(kind);
        }
        true
    }

    pub fn has_listeners(&self, kind: &EventKind) -> bool {
        self.table.get(kind).is_some_and(|list| !list.is_empty())
    }

    /// Calls every listener registered for the event's kind, in registration order. Custom typed events nobody
    /// listens for explicitly go to the [`EventKind::Message`] listeners.
    pub fn dispatch(&mut self, event: &SourceEvent) {
        let mut kind = event.kind();
        if matches!(kind, EventKind::Custom(_)) && !self.has_listeners(&kind) {
            kind = EventKind::Message;
        }

        if let Some(list) = self.table.get_mut(&kind) {
            for (_, listener) in list.iter_mut() {
                listener(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bytes_utils::Str;

    use super::*;
    use crate::{errors::SourceError, event::Event};

    fn message(kind: &'static str, data: &'static str) -> SourceEvent {
        SourceEvent::Message(Event {
            event: Str::from_static(kind),
            data: Str::from_static(data),
            origin: Str::from_static("http://localhost/api"),
            last_event_id: Str::from_static(""),
        })
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> impl FnMut(&SourceEvent) + Send + 'static {
        let log = Arc::clone(log);
        move |event| {
            let entry = match event {
                SourceEvent::Open => format!("{tag}:open"),
                SourceEvent::Error(_) => format!("{tag}:error"),
                SourceEvent::Message(event) => format!("{tag}:{}", event.data),
            };
            log.lock().unwrap().push(entry);
        }
    }

    #[test]
    fn dispatches_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();
        listeners.add(EventKind::Message, recorder(&log, "first"));
        listeners.add(EventKind::Message, recorder(&log, "second"));
        listeners.add(EventKind::Open, recorder(&log, "open"));

        listeners.dispatch(&SourceEvent::Open);
        listeners.dispatch(&message("message", "a"));
        listeners.dispatch(&SourceEvent::Error(SourceError::Stale));

        assert_eq!(
            *log.lock().unwrap(),
            vec!["open:open", "first:a", "second:a"]
        );
    }

    #[test]
    fn custom_events_fall_back_to_message_listeners() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();
        listeners.add(EventKind::Message, recorder(&log, "message"));

        listeners.dispatch(&message("ping", "unclaimed"));
        listeners.add(EventKind::from("ping"), recorder(&log, "ping"));
        listeners.dispatch(&message("ping", "claimed"));

        assert_eq!(
            *log.lock().unwrap(),
            vec!["message:unclaimed", "ping:claimed"]
        );
    }

    #[test]
    fn removed_listeners_stop_receiving() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();
        let first = listeners.add(EventKind::Error, recorder(&log, "first"));
        listeners.add(EventKind::Error, recorder(&log, "second"));

        assert!(listeners.remove(&EventKind::Error, first));
        assert!(!listeners.remove(&EventKind::Error, first));
        assert!(!listeners.remove(&EventKind::Open, first));

        listeners.dispatch(&SourceEvent::Error(SourceError::Stale));
        assert_eq!(*log.lock().unwrap(), vec!["second:error"]);
    }
}
