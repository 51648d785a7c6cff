//! Turns the accumulated body of a polled response into [`Directive`]s
//!
//! The parser keeps no state between calls. The caller holds on to the returned cursor and passes the whole body
//! again once more of it has arrived; only text past the cursor is looked at.
//!
//! A pass that is not final only consumes up to the end of the last complete record (the last blank line), an
//! incomplete trailing record is left alone so it can be parsed in full once the rest of it shows up. The final pass
//! for a response consumes everything, and a trailing record that never saw its blank line is dropped.
//!
//! `retry` is the exception: it takes effect as soon as its line is complete, whether or not the record around it
//! ever is. A `retry` line in an incomplete trailing record is reported again by every pass that sees it.

use core::time::Duration;

use bytes_utils::Str;

use crate::{
    constants::{EMPTY_STR, MESSAGE_STR},
    event::{Event, str_from},
    parser::{EventLine, Lines, parse_line, parse_retry},
};

/// Instruction for the session driving the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// A record finished with data
    Dispatch(Event),
    /// The server asked for a new polling interval
    Retry(Duration),
    /// `Some` for `id:` lines, `None` when a bare `id` line reset it
    LastEventId(Option<Str>),
    /// A record finished without any data
    EmptyBoundary,
}

/// What a pass knows besides the body
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Copied into [Event::origin]
    pub origin: Str,
    /// Last event id in effect before this pass, used to stamp events until an `id` line changes it
    pub last_event_id: Option<Str>,
    /// Set once the response is complete
    pub is_final: bool,
}

impl ParseContext {
    pub fn new(origin: Str, last_event_id: Option<Str>) -> Self {
        Self {
            origin,
            last_event_id,
            is_final: false,
        }
    }

    #[must_use]
    pub fn finished(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }
}

/// Result of a pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parsed {
    pub directives: Vec<Directive>,
    /// Offset into the body everything before which has been consumed
    pub cursor: usize,
}

#[derive(Debug)]
struct PendingRecord {
    event: Option<Str>,
    data: Option<String>,
}

impl PendingRecord {
    fn new() -> Self {
        Self {
            event: None,
            data: None,
        }
    }

    fn push_data(&mut self, line: &str) {
        match &mut self.data {
            Some(data) => {
                data.push('\n');
                data.push_str(line);
            }
            None => self.data = Some(line.to_owned()),
        }
    }

    fn take_event(&mut self, origin: &Str, last_event_id: Option<&Str>) -> Option<Event> {
        let PendingRecord { event, data } = core::mem::replace(self, PendingRecord::new());

        let data = data?;

        Some(Event {
            event: event.unwrap_or(MESSAGE_STR),
            data: str_from(&data),
            origin: origin.clone(),
            last_event_id: last_event_id.cloned().unwrap_or(EMPTY_STR),
        })
    }
}

struct Pass<'a> {
    context: &'a ParseContext,
    last_event_id: Option<Str>,
    record: PendingRecord,
    // id and boundary directives of the record currently being read, only kept once it completes (or on the final pass)
    uncommitted: Vec<Directive>,
    directives: Vec<Directive>,
}

impl<'a> Pass<'a> {
    fn new(context: &'a ParseContext) -> Self {
        Self {
            context,
            last_event_id: context.last_event_id.clone(),
            record: PendingRecord::new(),
            uncommitted: Vec::new(),
            directives: Vec::new(),
        }
    }

    /// Returns true when the line closed a record
    fn add(&mut self, line: EventLine<'_>) -> bool {
        match line {
            EventLine::Event(event) => self.record.event = Some(str_from(event)),
            EventLine::Retry(value) => {
                if let Some(retry) = parse_retry(value) {
                    self.directives.push(Directive::Retry(retry));
                }
            }
            EventLine::Data(data) => self.record.push_data(data),
            EventLine::Id(id) => {
                let id = str_from(id);
                self.last_event_id = Some(id.clone());
                self.uncommitted.push(Directive::LastEventId(Some(id)));
            }
            EventLine::ResetId => {
                self.last_event_id = None;
                self.uncommitted.push(Directive::LastEventId(None));
            }
            EventLine::Empty => {
                let directive = match self
                    .record
                    .take_event(&self.context.origin, self.last_event_id.as_ref())
                {
                    Some(event) => Directive::Dispatch(event),
                    None => Directive::EmptyBoundary,
                };
                self.uncommitted.push(directive);
                self.commit();
                return true;
            }
            EventLine::Ignored => (),
        }
        false
    }

    fn commit(&mut self) {
        self.directives.append(&mut self.uncommitted);
    }
}

/// Parses `body[cursor..]`, see the [module docs][self] for how much of it gets consumed.
///
/// Calling this again with the same body and the returned cursor yields no directives, apart from the `retry` of an
/// incomplete trailing record.
pub fn parse_body(body: &str, cursor: usize, context: &ParseContext) -> Parsed {
    let Some(unparsed) = body.get(cursor..) else {
        return Parsed {
            directives: Vec::new(),
            cursor,
        };
    };

    let mut pass = Pass::new(context);
    let mut consumed = 0;
    let mut lines = Lines::new(unparsed);

    for (line, line_end) in lines.by_ref() {
        if pass.add(parse_line(line)) {
            consumed = line_end;
        }
    }

    if context.is_final {
        let remainder = lines.remainder();
        if !remainder.is_empty() {
            pass.add(parse_line(remainder));
        }
        // a record still pending here never got its boundary, its data goes but its id stays
        pass.commit();
        consumed = unparsed.len();
    }

    Parsed {
        directives: pass.directives,
        cursor: cursor + consumed,
    }
}
