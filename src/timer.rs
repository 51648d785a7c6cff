//! Scheduling abstraction for the poll delay and the request watchdog
//!
//! A scheduled callback is a delay future owned by the source; dropping it cancels it. Sources only ever go through
//! [`Timer`], which lets tests run them on simulated time.

use core::{future::Future, time::Duration};

use futures_timer::Delay;

/// Creates delay futures
pub trait Timer {
    type Delay: Future<Output = ()>;

    fn delay(&self, duration: Duration) -> Self::Delay;
}

/// [`Timer`] backed by [`futures_timer`], works on any executor
#[derive(Debug, Clone, Copy, Default)]
pub struct FuturesTimer;

impl Timer for FuturesTimer {
    type Delay = Delay;

    fn delay(&self, duration: Duration) -> Self::Delay {
        Delay::new(duration)
    }
}
