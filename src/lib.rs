//! [Server-Sent Events](https://html.spec.whatwg.org/multipage/server-sent-events.html) over plain, repeated HTTP
//! requests, for servers and networks where a long-lived streaming response is not an option.
//!
//! Every poll is a GET that carries `Last-Event-ID`, so the server can answer with everything that happened since the
//! last one and then end the response. Events are parsed out of the body as it arrives and the next poll goes out
//! after a fixed interval, which the server can change with a `retry` field.
//!
//! `ssepoll` provides a layered API:
//!
//! - [`EventService`] - hands out [`Subscription`]s, plain [`Stream`][futures_core::Stream]s of message
//!   [`Event`]s, through an injected [`Connect`] strategy.
//! - [`PollingEventSource`] - the polling session itself. A [`Stream`][futures_core::Stream] of [`SourceEvent`]s
//!   (`open`, `error` and messages) that also supports per event type listeners.
//! - [`Transport`] and [`Timer`] - the seams a source does its I/O and scheduling through.
//!   [`ReqwestTransport`][reqwest::ReqwestTransport] (requires `reqwest` feature) and [`FuturesTimer`] cover the
//!   common case.
//! - [`JsonStream`][json_stream::JsonStream] (requires `json` feature) - deserialises each event's `data` into a typed
//!   value via [`serde_json`].
//! - Low-level parsing via [`stream_parser::parse_body`] and [`parser::parse_line`] for custom integrations.
//!
//! # Quick start with `reqwest`
//!
//! ```ignore
//! use futures::StreamExt;
//! use ssepoll::{EventService, PollingConfig, PollingConnector};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = EventService::new(PollingConnector::reqwest(PollingConfig::default()));
//! let mut updates = service.subscribe("https://example.com/updates")?;
//!
//! while let Some(event) = updates.next().await {
//!     println!("{}: {}", event.event, event.data);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Listeners and lifecycle events
//!
//! A [`PollingEventSource`] can be consumed directly when `open` and `error` matter. Errors never end the stream, the
//! source keeps polling until it is closed:
//!
//! ```ignore
//! use futures::StreamExt;
//! use ssepoll::{EventKind, PollingConfig, PollingEventSource, SourceEvent, reqwest::ReqwestTransport};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = PollingEventSource::open(
//!     "https://example.com/updates",
//!     ReqwestTransport::default(),
//!     ssepoll::FuturesTimer,
//!     PollingConfig::default(),
//! )?;
//! source.add_event_listener("price", |event| println!("price changed: {event:?}"));
//!
//! while let Some(event) = source.next().await {
//!     match event {
//!         SourceEvent::Open => println!("open"),
//!         SourceEvent::Error(e) => eprintln!("error: {e}"),
//!         SourceEvent::Message(_) => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Parsing a body yourself
//!
//! ```rust
//! use bytes_utils::Str;
//! use ssepoll::stream_parser::{Directive, ParseContext, parse_body};
//!
//! let body = "id: 1\ndata: hello\n\ndata: incomp";
//! let context = ParseContext::new(Str::from_static("https://example.com"), None);
//!
//! let parsed = parse_body(body, 0, &context);
//! assert_eq!(parsed.directives.len(), 2);
//! assert!(matches!(&parsed.directives[1], Directive::Dispatch(event) if &*event.data == "hello"));
//! // the incomplete record is left for the next pass
//! assert_eq!(parsed.cursor, "id: 1\ndata: hello\n\n".len());
//! ```
//!
//! # Feature flags
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `serde` | off | Derives [`Serialize`][::serde::Serialize] and [`Deserialize`][::serde::Deserialize] on [`Event`] and enables `serde` support in [`bytes-utils`][bytes_utils]. |
//! | `reqwest` | off | Provides [`ReqwestTransport`][reqwest::ReqwestTransport] and [`PollingConnector::reqwest`]. |
//! | `json` | off | Provides [`JsonStream`][json_stream::JsonStream] for deserialising event data into typed values via [`serde_json`] and lets you choose between the default errors or [`serde_path_to_error`] for richer errors. |

pub(crate) mod constants;
pub mod config;
pub mod errors;
pub mod event;
pub mod listeners;
pub mod parser;
#[cfg(feature = "reqwest")]
pub mod reqwest;
pub mod service;
pub mod source;
pub mod stream_parser;
pub mod timer;
pub mod transport;
pub mod utf8;

#[cfg(feature = "json")]
pub mod json_stream;

#[cfg(test)]
mod test_util;

pub use config::PollingConfig;
pub use errors::{OpenError, SourceError};
pub use event::{Event, EventKind, ReadyState, SourceEvent};
pub use service::{Connect, EventService, EventSource, PollingConnector, Subscription};
pub use source::{CloseHandle, PollingEventSource};
pub use timer::{FuturesTimer, Timer};
pub use transport::{PollRequest, PollResponse, Transport};
