//! The inter-send rate throttle.
//!
//! The dispatcher pauses *between* recipients, never before the first one,
//! so a campaign of n recipients at rate r takes at least (n - 1) / r
//! seconds. The trait exists so tests can swap in a recording throttle.

use std::{future::Future, time::Duration};

/// A pause inserted between consecutive sends.
pub trait Throttle: Send + Sync {
  fn pause(&self) -> impl Future<Output = ()> + Send + '_;
}

/// Sleeps a fixed `1 / rate` between sends. A non-positive rate disables
/// the delay entirely.
pub struct FixedDelay {
  delay: Duration,
}

impl FixedDelay {
  pub fn per_second(rate_per_sec: f64) -> Self {
    let delay = if rate_per_sec > 0.0 {
      Duration::from_secs_f64(1.0 / rate_per_sec)
    } else {
      Duration::ZERO
    };
    Self { delay }
  }
}

impl Throttle for FixedDelay {
  async fn pause(&self) {
    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }
  }
}
