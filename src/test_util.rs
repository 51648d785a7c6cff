//! Scripted transport and simulated time for driving sources in tests

use std::{
    collections::VecDeque,
    pin::Pin,
    sync::{Arc, Mutex},
    time::Duration,
};

use bytes::Bytes;
use futures::{
    FutureExt, StreamExt,
    future::{self, BoxFuture},
    stream::{self, BoxStream},
};
use tokio::time::{Instant, Sleep};

use crate::{
    timer::Timer,
    transport::{PollRequest, PollResponse, Transport},
};

pub(crate) type TestBody = BoxStream<'static, Result<Bytes, String>>;

/// What the transport answers to one request
pub(crate) enum Reply {
    /// Status plus every chunk of the body, then the body completes
    Body(u16, Vec<Bytes>),
    /// Chunks that arrive, then a body that never completes
    Stalled(Vec<Bytes>),
    /// Chunks followed by a body error
    BodyError(Vec<Bytes>, &'static str),
    /// The request fails before any response
    Fail(&'static str),
}

impl Reply {
    pub(crate) fn ok(chunks: &[&'static str]) -> Self {
        Reply::Body(200, chunks.iter().copied().map(|c| Bytes::from_static(c.as_bytes())).collect())
    }

    pub(crate) fn stalled(chunks: &[&'static str]) -> Self {
        Reply::Stalled(chunks.iter().copied().map(|c| Bytes::from_static(c.as_bytes())).collect())
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    requests: Vec<(Instant, PollRequest)>,
}

/// Answers requests from a script, once it runs out every request hangs forever
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    // cloned into every response future and body, so the count tells how many are still alive
    in_flight: Arc<Arc<()>>,
}

impl ScriptedTransport {
    pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        let transport = Self::default();
        transport.script.lock().unwrap().replies.extend(replies);
        transport
    }

    pub(crate) fn requests(&self) -> Vec<PollRequest> {
        self.script
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// Response futures and bodies that have not been dropped yet
    pub(crate) fn open_requests(&self) -> usize {
        Arc::strong_count(&*self.in_flight) - 1
    }

    /// Time between consecutive requests
    pub(crate) fn gaps(&self) -> Vec<Duration> {
        let script = self.script.lock().unwrap();
        script
            .requests
            .windows(2)
            .map(|pair| pair[1].0 - pair[0].0)
            .collect()
    }
}

fn chunk_stream(chunks: Vec<Bytes>) -> impl futures::Stream<Item = Result<Bytes, String>> {
    stream::iter(chunks.into_iter().map(Ok::<Bytes, String>))
}

fn respond(status: u16, body: TestBody) -> BoxFuture<'static, Result<PollResponse<TestBody>, String>> {
    future::ready(Ok::<_, String>(PollResponse::new(status, body))).boxed()
}

/// Keeps `guard` alive for as long as the response future, and after that the body
fn hold(
    guard: Arc<()>,
    response: BoxFuture<'static, Result<PollResponse<TestBody>, String>>,
) -> BoxFuture<'static, Result<PollResponse<TestBody>, String>> {
    response
        .map(move |result| {
            result.map(|response| {
                let body = response.body.map(move |chunk| {
                    let _held = &guard;
                    chunk
                });
                PollResponse::new(response.status, body.boxed())
            })
        })
        .boxed()
}

impl Transport for ScriptedTransport {
    type Error = String;
    type Body = TestBody;
    type Response = BoxFuture<'static, Result<PollResponse<TestBody>, String>>;

    fn send(&self, request: PollRequest) -> Self::Response {
        let mut script = self.script.lock().unwrap();
        script.requests.push((Instant::now(), request));

        let response = match script.replies.pop_front() {
            Some(Reply::Body(status, chunks)) => respond(status, chunk_stream(chunks).boxed()),
            Some(Reply::Stalled(chunks)) => {
                respond(200, chunk_stream(chunks).chain(stream::pending()).boxed())
            }
            Some(Reply::BodyError(chunks, message)) => respond(
                200,
                chunk_stream(chunks)
                    .chain(stream::once(future::ready(Err(message.to_string()))))
                    .boxed(),
            ),
            Some(Reply::Fail(message)) => {
                future::ready(Err::<PollResponse<TestBody>, String>(message.to_string())).boxed()
            }
            None => future::pending().boxed(),
        };
        hold(Arc::clone(&*self.in_flight), response)
    }
}

/// [`Timer`] on tokio's clock, pair with `#[tokio::test(start_paused = true)]`
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TokioTimer;

impl Timer for TokioTimer {
    type Delay = Pin<Box<Sleep>>;

    fn delay(&self, duration: Duration) -> Self::Delay {
        Box::pin(tokio::time::sleep(duration))
    }
}
