//! Subscribing to event streams without caring how they are delivered
//!
//! [`EventService`] asks its [`Connect`] strategy for a source per url and hands out [`Subscription`]s that only carry
//! the message events. The strategy is picked once, up front: [`PollingConnector`] for servers that have to be polled,
//! or any other [`Connect`] implementation wrapping a native streaming client.

use core::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use futures_core::Stream;
use tracing::{debug, warn};

use crate::{
    config::PollingConfig,
    errors::OpenError,
    event::{Event, ReadyState, SourceEvent},
    source::PollingEventSource,
    timer::{FuturesTimer, Timer},
    transport::Transport,
};

/// What [`Subscription`] needs from a source
pub trait EventSource: Stream<Item = SourceEvent> {
    /// Stop delivering events, the stream ends afterwards
    fn close(&self);

    fn ready_state(&self) -> ReadyState;
}

impl<T, K> EventSource for PollingEventSource<T, K>
where
    T: Transport,
    K: Timer,
{
    fn close(&self) {
        PollingEventSource::close(self);
    }

    fn ready_state(&self) -> ReadyState {
        PollingEventSource::ready_state(self)
    }
}

/// Opens sources for an [`EventService`]
pub trait Connect {
    type Source: EventSource + Unpin;

    /// # Errors
    ///
    /// Returns an [`OpenError`] when no source can be created for `url`
    fn connect(&self, url: &str) -> Result<Self::Source, OpenError>;
}

/// [`Connect`] strategy creating a [`PollingEventSource`] per url, all sharing one transport and config
#[derive(Debug, Clone)]
pub struct PollingConnector<T, K = FuturesTimer> {
    transport: T,
    timer: K,
    config: PollingConfig,
}

impl<T> PollingConnector<T> {
    pub fn new(transport: T, config: PollingConfig) -> Self {
        Self::with_timer(transport, FuturesTimer, config)
    }
}

#[cfg(feature = "reqwest")]
impl PollingConnector<crate::reqwest::ReqwestTransport> {
    /// Polls with a default [`reqwest::Client`]
    pub fn reqwest(config: PollingConfig) -> Self {
        Self::new(crate::reqwest::ReqwestTransport::default(), config)
    }
}

impl<T, K> PollingConnector<T, K> {
    pub fn with_timer(transport: T, timer: K, config: PollingConfig) -> Self {
        Self {
            transport,
            timer,
            config,
        }
    }

    pub fn config(&self) -> &PollingConfig {
        &self.config
    }
}

impl<T, K> Connect for PollingConnector<T, K>
where
    T: Transport + Clone,
    K: Timer + Clone,
    PollingEventSource<T, K>: Unpin,
{
    type Source = PollingEventSource<T, K>;

    fn connect(&self, url: &str) -> Result<Self::Source, OpenError> {
        PollingEventSource::open(
            url,
            self.transport.clone(),
            self.timer.clone(),
            self.config.clone(),
        )
    }
}

/// Hands out [`Subscription`]s through a [`Connect`] strategy
#[derive(Debug, Clone)]
pub struct EventService<C> {
    connector: C,
}

impl<C: Connect> EventService<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Opens a new source for `url`, every call gets its own.
    ///
    /// # Errors
    ///
    /// Whatever the connector fails with
    pub fn subscribe(&self, url: &str) -> Result<Subscription<C::Source>, OpenError> {
        let source = self.connector.connect(url)?;
        debug!(url, "subscribed");
        Ok(Subscription::new(source))
    }
}

/// Stream of the message events of one source, in delivery order.
///
/// `open` and `error` events are not yielded; errors are retried by the source unless
/// [`close_on_error`][Self::close_on_error] is set. Dropping the subscription closes the source.
#[derive(Debug)]
pub struct Subscription<S: EventSource> {
    source: S,
    close_on_error: bool,
}

impl<S: EventSource> Drop for Subscription<S> {
    fn drop(&mut self) {
        self.source.close();
    }
}

impl<S: EventSource + Unpin> Subscription<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            close_on_error: false,
        }
    }

    /// End the subscription on the first error instead of letting the source retry
    #[must_use]
    pub fn close_on_error(mut self, close_on_error: bool) -> Self {
        self.close_on_error = close_on_error;
        self
    }

    pub fn ready_state(&self) -> ReadyState {
        self.source.ready_state()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access, to register listeners on the source for example
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Same as dropping the subscription
    pub fn unsubscribe(self) {
        self.source.close();
    }
}

impl<S: EventSource + Unpin> Stream for Subscription<S> {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match ready!(Pin::new(&mut this.source).poll_next(cx)) {
                Some(SourceEvent::Message(event)) => return Poll::Ready(Some(event)),
                Some(SourceEvent::Error(error)) if this.close_on_error => {
                    warn!(%error, "closing subscription");
                    this.source.close();
                }
                Some(SourceEvent::Open | SourceEvent::Error(_)) => {}
                None => return Poll::Ready(None),
            }
        }
    }
}
