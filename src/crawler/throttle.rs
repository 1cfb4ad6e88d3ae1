//! Request pacing
//!
//! Every pipeline waits on a [`Throttle`] before each request. The only
//! policy shipped is a fixed interval between consecutive requests.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Decides when the next request may be sent
pub trait Throttle {
    /// Waits until a request may be sent, then counts it as sent
    fn ready(&mut self) -> impl Future<Output = ()> + Send;
}

/// Keeps at least `interval` between the starts of two requests
///
/// The first request goes out immediately.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    interval: Duration,
    last: Option<Instant>,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Throttle for FixedInterval {
    async fn ready(&mut self) {
        if let Some(last) = self.last {
            tokio::time::sleep_until(last + self.interval).await;
        }
        self.last = Some(Instant::now());
    }
}
