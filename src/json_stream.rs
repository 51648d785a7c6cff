//! Typed event data, for servers that send JSON in `data`
use core::{
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
};

use futures_core::Stream;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::event::Event;

pin_project_lite::pin_project! {
    /// Deserialises the `data` of every [`Event`] coming out of `S`, a [`Subscription`][crate::Subscription] for
    /// example. A failed event does not end the stream.
    #[derive(Debug)]
    pub struct JsonStream<T, S, DeserError = serde_json::Error> {
        #[pin]
        stream_state: JsonStreamState<S>,
        output_marker: PhantomData<fn() -> (T, DeserError)>,
    }
}

pub type DefaultJsonStream<T, S> = JsonStream<T, S, serde_json::Error>;

pub type PathErrorJsonStream<T, S> =
    JsonStream<T, S, serde_path_to_error::Error<serde_json::Error>>;

impl<T, S> JsonStream<T, S, serde_json::Error> {
    #[must_use]
    /// Creates a new [`JsonStream`] atop `stream` that returns type T or an error
    pub fn new_default(stream: S) -> Self
    where
        T: DeserializeOwned,
    {
        JsonStream {
            stream_state: JsonStreamState::Active { stream },
            output_marker: PhantomData,
        }
    }
}

impl<T, S> JsonStream<T, S, serde_path_to_error::Error<serde_json::Error>> {
    #[must_use]
    /// Creates a new [`JsonStream`] atop `stream` that returns type T or an error with path information via [serde_path_to_error]
    pub fn new_path(stream: S) -> Self
    where
        T: DeserializeOwned,
    {
        JsonStream {
            stream_state: JsonStreamState::Active { stream },
            output_marker: PhantomData,
        }
    }
}

pin_project_lite::pin_project! {
    #[derive(Debug)]
    #[project = JsonStreamStateProjection]
    enum JsonStreamState<S> {
        Active {
            #[pin]
            stream: S
        },
        Inactive,
    }
}

/// An event whose data did not deserialise, the event comes along so nothing is lost
#[derive(Error, Debug)]
#[error("event `{}` has invalid json data: {source}", .event.event)]
pub struct JsonStreamError<E> {
    pub event: Event,
    #[source]
    pub source: E,
}

impl<S> JsonStreamState<S> {
    fn poll_event(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Event>>
    where
        S: Stream<Item = Event>,
    {
        let stream = match self.as_mut().project() {
            JsonStreamStateProjection::Active { stream } => stream,
            JsonStreamStateProjection::Inactive => return Poll::Ready(None),
        };

        let Some(event) = core::task::ready!(stream.poll_next(cx)) else {
            self.set(JsonStreamState::Inactive);
            return Poll::Ready(None);
        };
        Poll::Ready(Some(event))
    }
}

impl<T, S> Stream for JsonStream<T, S, serde_json::Error>
where
    S: Stream<Item = Event>,
    T: DeserializeOwned,
{
    type Item = Result<T, JsonStreamError<serde_json::Error>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let Some(event) = core::task::ready!(this.stream_state.poll_event(cx)) else {
            return Poll::Ready(None);
        };

        Poll::Ready(Some(
            serde_json::from_str(&event.data).map_err(|source| JsonStreamError { event, source }),
        ))
    }
}

impl<T, S> Stream for JsonStream<T, S, serde_path_to_error::Error<serde_json::Error>>
where
    S: Stream<Item = Event>,
    T: DeserializeOwned,
{
    type Item = Result<T, JsonStreamError<serde_path_to_error::Error<serde_json::Error>>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let Some(event) = core::task::ready!(this.stream_state.poll_event(cx)) else {
            return Poll::Ready(None);
        };

        let mut deserializer = serde_json::Deserializer::from_str(&event.data);
        let result = serde_path_to_error::deserialize(&mut deserializer);
        Poll::Ready(Some(
            result.map_err(|source| JsonStreamError { event, source }),
        ))
    }
}
