//! Line level parsing for the polled event stream format
//!
//! Classification is prefix based: any line starting with `event`, `retry`, `data` or `id` is treated as that
//! field, the optional colon and all whitespace after the field name are dropped, and every other line is ignored.

use core::time::Duration;

use crate::constants::{LF, NBSP};

const BOM_CHAR: char = '\u{FEFF}';

/// A single classified line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLine<'a> {
    /// Sets the type of the pending event
    Event(&'a str),
    /// Raw value of a `retry` line, see [parse_retry]
    Retry(&'a str),
    /// Appends a payload line to the pending event
    Data(&'a str),
    /// `id:` with a value, which may be empty
    Id(&'a str),
    /// `id` without a colon, clears the last event id
    ResetId,
    /// Record boundary
    Empty,
    /// Unknown fields, comments, anything else
    Ignored,
}

fn is_trimmed(c: char) -> bool {
    c.is_whitespace() || c == NBSP || c == BOM_CHAR
}

/// Strips leading and trailing whitespace, including no-break spaces, carriage returns and byte order marks
pub fn trim_line(line: &str) -> &str {
    line.trim_matches(is_trimmed)
}

/// Drops an optional colon and any whitespace that follows the field name
fn field_value(rest: &str) -> &str {
    let rest = rest.strip_prefix(':').unwrap_or(rest);
    rest.trim_start_matches(is_trimmed)
}

/// Classifies one line, without its terminating LF
pub fn parse_line(line: &str) -> EventLine<'_> {
    let line = trim_line(line);

    if line.is_empty() {
        EventLine::Empty
    } else if let Some(rest) = line.strip_prefix("event") {
        EventLine::Event(field_value(rest))
    } else if let Some(rest) = line.strip_prefix("retry") {
        EventLine::Retry(field_value(rest))
    } else if let Some(rest) = line.strip_prefix("data") {
        EventLine::Data(field_value(rest))
    } else if let Some(rest) = line.strip_prefix("id:") {
        EventLine::Id(rest.trim_start_matches(is_trimmed))
    } else if line.starts_with("id") {
        EventLine::ResetId
    } else {
        EventLine::Ignored
    }
}

/// Reads the leading decimal digits of a `retry` value as milliseconds. Returns [None] when there are no
/// leading digits or the number does not fit.
pub fn parse_retry(value: &str) -> Option<Duration> {
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());

    value[..digits_end]
        .parse::<u64>()
        .ok()
        .map(Duration::from_millis)
}

/// Iterator over the LF terminated lines of a str, yielding each line without its LF along with the offset just past
/// it. Text after the final LF is not yielded.
pub struct Lines<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> Lines<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }

    /// Whatever follows the last LF seen so far
    pub fn remainder(&self) -> &'a str {
        &self.text[self.position..]
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = (&'a str, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text.as_bytes()[self.position..];
        let line_end = self.position + memchr::memchr(LF, rest)?;
        let line = &self.text[self.position..line_end];
        self.position = line_end + 1;
        Some((line, self.position))
    }
}
