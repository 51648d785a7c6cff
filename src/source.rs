//! [`PollingEventSource`], an event source built out of repeated plain GET requests
//!
//! Every poll cycle issues one request carrying the last event id, feeds the growing response body through
//! [`parse_body`][crate::stream_parser::parse_body] as chunks arrive, and once the response completes schedules the
//! next poll after the current interval. Failures are retried on the same fixed cadence forever, only the server can
//! change it through `retry`.
//!
//! Every request is aborted once it has run for the configured request timeout, even if it is still streaming data.

use core::{
    pin::Pin,
    sync::atomic::{AtomicBool, Ordering},
    task::{Context, Poll, ready},
    time::Duration,
};
use std::{collections::VecDeque, sync::Arc};

use bytes_utils::Str;
use futures_core::Stream;
use futures_util::task::AtomicWaker;
use pin_project_lite::pin_project;
use tracing::{debug, info, warn};

use crate::{
    config::PollingConfig,
    errors::{OpenError, SourceError},
    event::{EventKind, ReadyState, SourceEvent, str_from},
    listeners::{ListenerId, Listeners},
    stream_parser::{Directive, ParseContext, parse_body},
    timer::Timer,
    transport::{PollRequest, Transport},
    utf8::Utf8Decoder,
};

#[derive(Debug, Default)]
struct CloseSignal {
    closed: AtomicBool,
    waker: AtomicWaker,
}

impl CloseSignal {
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.waker.wake();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Closes a [`PollingEventSource`] from anywhere, including other tasks.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    signal: Arc<CloseSignal>,
}

impl CloseHandle {
    /// Same as [`PollingEventSource::close`]
    pub fn close(&self) {
        self.signal.close();
    }

    pub fn is_closed(&self) -> bool {
        self.signal.is_closed()
    }
}

/// State of the request currently in flight
#[derive(Debug, Default)]
struct Cycle {
    body: String,
    cursor: usize,
    decoder: Utf8Decoder,
    /// Last event id when the request went out, for the stale connection check
    start_id: Option<Str>,
}

impl Cycle {
    fn restart(&mut self, start_id: Option<Str>) {
        self.body.clear();
        self.cursor = 0;
        self.decoder.reset();
        self.start_id = start_id;
    }
}

pin_project! {
    #[project = ConnectionProjection]
    enum Connection<F, B, D> {
        Scheduled {
            #[pin]
            delay: D,
        },
        Requesting {
            #[pin]
            response: F,
        },
        Reading {
            #[pin]
            body: B,
        },
        Closed,
    }
}

pin_project! {
    /// Event source polling `url` through a [`Transport`].
    ///
    /// Consume it as a [`Stream`] of [`SourceEvent`]s; every event is handed to the registered listeners right before
    /// the stream yields it. The stream ends once the source is closed.
    #[project = SourceProjection]
    pub struct PollingEventSource<T, K>
    where
        T: Transport,
        K: Timer,
    {
        transport: T,
        timer: K,
        url: Str,
        config: PollingConfig,
        interval: Duration,
        ready_state: ReadyState,
        last_event_id: Option<Str>,
        cycle: Cycle,
        pending: VecDeque<SourceEvent>,
        listeners: Listeners,
        signal: Arc<CloseSignal>,
        #[pin]
        connection: Connection<T::Response, T::Body, K::Delay>,
        #[pin]
        watchdog: Option<K::Delay>,
    }
}

impl<T, K> PollingEventSource<T, K>
where
    T: Transport,
    K: Timer,
{
    /// Creates a source in [`ReadyState::Connecting`] with its first poll scheduled after
    /// [`PollingConfig::first_poll_delay`].
    ///
    /// # Errors
    ///
    /// Returns an [`OpenError`] for an empty url or an invalid config, nothing is scheduled in that case.
    pub fn open(url: &str, transport: T, timer: K, config: PollingConfig) -> Result<Self, OpenError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(OpenError::EmptyUrl);
        }
        config.validate()?;

        let url = str_from(url);
        info!(url = %url, "event source created, connecting");

        let delay = timer.delay(config.first_poll_delay);
        Ok(Self {
            transport,
            timer,
            url,
            interval: config.interval,
            config,
            ready_state: ReadyState::Connecting,
            last_event_id: None,
            cycle: Cycle::default(),
            pending: VecDeque::new(),
            listeners: Listeners::new(),
            signal: Arc::default(),
            connection: Connection::Scheduled { delay },
            watchdog: None,
        })
    }

    pub fn url(&self) -> &Str {
        &self.url
    }

    pub fn ready_state(&self) -> ReadyState {
        if self.signal.is_closed() {
            ReadyState::Closed
        } else {
            self.ready_state
        }
    }

    /// The id the next request resumes from
    pub fn last_event_id(&self) -> Option<&Str> {
        self.last_event_id.as_ref()
    }

    /// Current delay between polls
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn add_event_listener<F>(&mut self, kind: impl Into<EventKind>, listener: F) -> ListenerId
    where
        F: FnMut(&SourceEvent) + Send + 'static,
    {
        self.listeners.add(kind.into(), listener)
    }

    pub fn remove_event_listener(&mut self, kind: impl Into<EventKind>, id: ListenerId) -> bool {
        self.listeners.remove(&kind.into(), id)
    }

    /// Stops polling for good. Nothing is delivered after this returns. Calling it again does nothing.
    ///
    /// Through `&self` the pending poll and any in-flight request can only be dropped later: the next time the
    /// source is polled, or when it is dropped. Use [`close_now`][Self::close_now] to abort the request right away.
    pub fn close(&self) {
        self.signal.close();
    }

    /// [`close`][Self::close], and drop the pending poll and any in-flight request before returning
    pub fn close_now(self: Pin<&mut Self>) {
        self.signal.close();
        let mut this = self.project();
        if !this.ready_state.is_closed() {
            this.shutdown();
        }
    }

    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            signal: Arc::clone(&self.signal),
        }
    }
}

impl<'pin, T, K> SourceProjection<'pin, T, K>
where
    T: Transport,
    K: Timer,
{
    fn start_request(&mut self) {
        self.cycle.restart(self.last_event_id.clone());
        let request = PollRequest::new(
            self.url.clone(),
            self.last_event_id.as_ref(),
            &self.config.headers,
        );
        debug!(url = %self.url, last_event_id = ?self.last_event_id, "polling");

        let response = self.transport.send(request);
        self.connection.set(Connection::Requesting { response });
        self.watchdog
            .set(Some(self.timer.delay(self.config.request_timeout)));
    }

    fn schedule_next(&mut self) {
        self.watchdog.set(None);
        let delay = self.timer.delay(*self.interval);
        self.connection.set(Connection::Scheduled { delay });
    }

    fn mark_open(&mut self) {
        if *self.ready_state == ReadyState::Connecting {
            info!(url = %self.url, "event source open");
            *self.ready_state = ReadyState::Open;
            self.pending.push_back(SourceEvent::Open);
        }
    }

    /// Back to connecting with an error for the consumer, but only if the last event id has not moved since the
    /// request went out
    fn check_stale(&mut self, error: SourceError) {
        if *self.last_event_id != self.cycle.start_id {
            debug!(url = %self.url, %error, "last event id moved during this request, not reporting");
            return;
        }
        warn!(url = %self.url, interval = ?self.interval, %error, "event source error, reconnecting");
        *self.ready_state = ReadyState::Connecting;
        self.pending.push_back(SourceEvent::Error(error));
    }

    fn fail(&mut self, error: SourceError) {
        self.check_stale(error);
        self.schedule_next();
    }

    fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Dispatch(event) => self.pending.push_back(SourceEvent::Message(event)),
            Directive::Retry(interval) => {
                debug!(url = %self.url, ?interval, "server changed the polling interval");
                *self.interval = interval;
            }
            Directive::LastEventId(id) => *self.last_event_id = id,
            Directive::EmptyBoundary => self.check_stale(SourceError::Stale),
        }
    }

    fn ingest(&mut self, is_final: bool) {
        let context =
            ParseContext::new(self.url.clone(), self.last_event_id.clone()).finished(is_final);
        let parsed = parse_body(&self.cycle.body, self.cycle.cursor, &context);
        self.cycle.cursor = parsed.cursor;

        for directive in parsed.directives {
            self.apply(directive);
        }
    }

    fn on_chunk(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.mark_open();

        let cycle = &mut *self.cycle;
        match cycle.decoder.push(chunk, &mut cycle.body) {
            Ok(()) => self.ingest(false),
            Err(_) => self.fail(SourceError::Utf8),
        }
    }

    fn on_complete(&mut self) {
        self.mark_open();

        match self.cycle.decoder.finish() {
            Ok(()) => {
                self.ingest(true);
                self.schedule_next();
            }
            Err(_) => self.fail(SourceError::Utf8),
        }
    }

    fn shutdown(&mut self) {
        info!(url = %self.url, "event source closed");
        *self.ready_state = ReadyState::Closed;
        self.pending.clear();
        self.watchdog.set(None);
        self.connection.set(Connection::Closed);
    }
}

impl<T, K> Stream for PollingEventSource<T, K>
where
    T: Transport,
    K: Timer,
{
    type Item = SourceEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        this.signal.waker.register(cx.waker());

        loop {
            if this.signal.is_closed() {
                if !this.ready_state.is_closed() {
                    this.shutdown();
                }
                return Poll::Ready(None);
            }

            if let Some(event) = this.pending.pop_front() {
                this.listeners.dispatch(&event);
                return Poll::Ready(Some(event));
            }

            if let Some(watchdog) = this.watchdog.as_mut().as_pin_mut()
                && watchdog.poll(cx).is_ready()
            {
                let timeout = this.config.request_timeout;
                debug!(url = %this.url, ?timeout, "aborting request");
                this.fail(SourceError::Timeout(timeout));
                continue;
            }

            match this.connection.as_mut().project() {
                ConnectionProjection::Scheduled { delay } => {
                    ready!(delay.poll(cx));
                    this.start_request();
                }
                ConnectionProjection::Requesting { response } => match ready!(response.poll(cx)) {
                    Ok(response) if response.is_success() => {
                        this.connection.set(Connection::Reading {
                            body: response.body,
                        });
                    }
                    Ok(response) => this.fail(SourceError::Status(response.status)),
                    Err(e) => this.fail(SourceError::transport(e)),
                },
                ConnectionProjection::Reading { body } => match ready!(body.poll_next(cx)) {
                    Some(Ok(chunk)) => this.on_chunk(&chunk),
                    Some(Err(e)) => this.fail(SourceError::transport(e)),
                    None => this.on_complete(),
                },
                ConnectionProjection::Closed => return Poll::Ready(None),
            }
        }
    }
}
