use core::time::Duration;

use bytes_utils::Str;

pub(crate) const LF: u8 = b'\n';

// stripped from both ends of every line along with regular whitespace
pub(crate) const NBSP: char = '\u{00A0}';

pub(crate) const EMPTY_STR: Str = Str::from_static("");
pub(crate) const MESSAGE_STR: Str = Str::from_static("message");

pub(crate) const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

pub(crate) const ACCEPT: Str = Str::from_static("Accept");
pub(crate) const CACHE_CONTROL: Str = Str::from_static("Cache-Control");
pub(crate) const LAST_EVENT_ID: Str = Str::from_static("Last-Event-ID");
pub(crate) const X_REQUESTED_WITH: Str = Str::from_static("X-Requested-With");

pub(crate) const EVENT_STREAM: Str = Str::from_static("text/event-stream");
pub(crate) const NO_CACHE: Str = Str::from_static("no-cache");
pub(crate) const XML_HTTP_REQUEST: Str = Str::from_static("XMLHttpRequest");
