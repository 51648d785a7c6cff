//! Polls an event stream and prints every event it delivers.
//!
//! ```text
//! RUST_LOG=ssepoll=debug cargo run --example tail --features reqwest -- https://example.com/updates [interval_ms]
//! ```

use std::time::Duration;

use futures::StreamExt;
use ssepoll::{
    EventKind, FuturesTimer, PollingConfig, PollingEventSource, SourceEvent,
    reqwest::ReqwestTransport,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().ok_or("usage: tail <url> [interval_ms]")?;
    let mut config = PollingConfig::new().first_poll_delay(Duration::ZERO);
    if let Some(interval) = args.next() {
        config = config.interval(Duration::from_millis(interval.parse()?));
    }

    let mut source = PollingEventSource::open(&url, ReqwestTransport::default(), FuturesTimer, config)?;
    source.add_event_listener(EventKind::Error, |event| {
        if let SourceEvent::Error(e) = event {
            eprintln!("! {e}");
        }
    });

    let closer = source.close_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            closer.close();
        }
    });

    while let Some(event) = source.next().await {
        match event {
            SourceEvent::Open => eprintln!("* open"),
            SourceEvent::Message(event) => {
                println!("[{}] id={} {}", event.event, event.last_event_id, event.data)
            }
            SourceEvent::Error(_) => {}
        }
    }

    Ok(())
}
