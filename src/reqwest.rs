//! [`Transport`] over a [`reqwest::Client`]

use futures_core::future::BoxFuture;
use futures_util::FutureExt;
use http_body_util::BodyDataStream;
use reqwest::{Body, Client, Error as ReqwestError, Response};

use crate::transport::{PollRequest, PollResponse, Transport};

/// Sends every poll as a GET through the wrapped [`Client`], which is cheap to clone and shared between sources.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl From<Client> for ReqwestTransport {
    fn from(client: Client) -> Self {
        Self::new(client)
    }
}

fn response_to_body(response: Response) -> BodyDataStream<Body> {
    BodyDataStream::new(Body::from(response))
}

impl Transport for ReqwestTransport {
    type Error = ReqwestError;
    type Body = BodyDataStream<Body>;
    type Response = BoxFuture<'static, Result<PollResponse<Self::Body>, ReqwestError>>;

    fn send(&self, request: PollRequest) -> Self::Response {
        let mut builder = self.client.get(&*request.url);
        // bad urls and header values surface as errors from `send`
        for (name, value) in &request.headers {
            builder = builder.header(&**name, &**value);
        }

        async move {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            Ok(PollResponse::new(status, response_to_body(response)))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use bytes_utils::Str;
    use futures::StreamExt;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::mpsc,
        time::timeout,
    };

    use super::*;
    use crate::{
        config::PollingConfig,
        service::{EventService, PollingConnector},
    };

    /// Serves one canned body per connection and reports every request head it read
    async fn serve(bodies: Vec<&'static str>) -> (String, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/events", listener.local_addr().unwrap());
        let (heads, received) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            for body in bodies {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.ends_with(b"\r\n\r\n") {
                    let read = socket.read(&mut buf).await.unwrap();
                    if read == 0 {
                        break;
                    }
                    head.extend_from_slice(&buf[..read]);
                }
                heads
                    .send(String::from_utf8_lossy(&head).to_lowercase())
                    .unwrap();

                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        (url, received)
    }

    #[tokio::test]
    async fn polls_a_real_server() {
        let (url, mut heads) = serve(vec!["id: 1\ndata: hi\n\n", "data: again\n\n"]).await;
        let config = PollingConfig::new()
            .first_poll_delay(Duration::ZERO)
            .interval(Duration::from_millis(10))
            .header(Str::from_static("x-client"), Str::from_static("ssepoll-test"));
        let service = EventService::new(PollingConnector::reqwest(config));
        let mut subscription = service.subscribe(&url).unwrap();

        let events = timeout(Duration::from_secs(10), (&mut subscription).take(2).collect::<Vec<_>>())
            .await
            .unwrap();
        assert_eq!(&*events[0].data, "hi");
        assert_eq!(&*events[0].last_event_id, "1");
        assert_eq!(&*events[1].data, "again");
        assert_eq!(&*events[1].origin, url.as_str());
        subscription.unsubscribe();

        let first = heads.recv().await.unwrap();
        assert!(first.starts_with("get /events http/1.1"));
        assert!(first.contains("accept: text/event-stream"));
        assert!(first.contains("cache-control: no-cache"));
        assert!(first.contains("x-client: ssepoll-test"));
        assert!(!first.contains("last-event-id"));

        let second = heads.recv().await.unwrap();
        assert!(second.contains("last-event-id: 1"));
    }
}
