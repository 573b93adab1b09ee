use std::time::Duration;

use navigator_client::entities::config::edge::EdgeConfig;

/// Exponential reconnect backoff with jitter. Doubles up to the
/// cap; reset after a successful session.
#[derive(Debug)]
pub struct Backoff {
  initial: Duration,
  max: Duration,
  jitter_ratio: f64,
  current: Duration,
}

impl Backoff {
  pub fn new(
    initial: Duration,
    max: Duration,
    jitter_ratio: f64,
  ) -> Backoff {
    Backoff {
      initial,
      max,
      jitter_ratio,
      current: initial,
    }
  }

  pub fn from_config(config: &EdgeConfig) -> Backoff {
    Backoff::new(
      Duration::from_secs(config.reconnect_backoff_initial),
      Duration::from_secs(config.reconnect_backoff_max),
      config.reconnect_jitter_ratio,
    )
  }

  pub fn reset(&mut self) {
    self.current = self.initial;
  }

  /// The next delay to sleep, with jitter applied. Advances the
  /// internal doubling.
  pub fn next_delay(&mut self) -> Duration {
    let base = self.current;
    self.current = (self.current * 2).min(self.max);
    jitter(base, self.jitter_ratio)
  }
}

fn jitter(duration: Duration, ratio: f64) -> Duration {
  if ratio <= 0.0 {
    return duration;
  }
  let factor =
    1.0 + ratio * (rand::random::<f64>() * 2.0 - 1.0);
  duration.mul_f64(factor.max(0.0))
}
