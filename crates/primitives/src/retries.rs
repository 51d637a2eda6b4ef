use std::{future::Future, time::Duration};

use rand::Rng;
use tokio_retry::RetryIf;

/// The default number of retries after the first probe attempt.
pub const DEFAULT_PROBE_RETRIES: u32 = 2;

/// Growth factor applied to the attempt timeout on every retry.
pub const TIMEOUT_GROWTH_FACTOR: f64 = 1.5;

/// Per-attempt timeouts that grow geometrically up to a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSchedule {
    base: Duration,
    cap: Duration,
}

impl TimeoutSchedule {
    /// Create a schedule starting at `base` and never exceeding `cap`.
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Timeout for the 0-based `attempt`: `min(base * 1.5^attempt, cap)`.
    pub fn timeout_for(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let grown = self.base.mul_f64(TIMEOUT_GROWTH_FACTOR.powi(exp).min(1e6));
        grown.min(self.cap)
    }
}

/// Random delay slept before each attempt so overlapping runs do not fire in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    min: Duration,
    max: Duration,
}

impl Jitter {
    /// 100ms to 500ms.
    pub const DEFAULT: Self = Self { min: Duration::from_millis(100), max: Duration::from_millis(500) };

    /// No delay at all.
    pub const NONE: Self = Self { min: Duration::ZERO, max: Duration::ZERO };

    /// Draw a delay from the range.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Run `op` up to `retries + 1` times while `condition` holds for the error.
///
/// `op` receives the 0-based attempt number so callers can pick the attempt's
/// timeout from a [`TimeoutSchedule`]. A jittered delay precedes every attempt,
/// including the first.
pub async fn retry_with_jitter_if<F, Fut, T, E, C>(
    retries: u32,
    jitter: Jitter,
    mut op: F,
    condition: C,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: FnMut(&E) -> bool,
{
    tokio::time::sleep(jitter.sample()).await;

    let strategy = std::iter::repeat_with(move || jitter.sample()).take(retries as usize);
    let mut attempt = 0;
    RetryIf::start(
        strategy,
        || {
            let current = attempt;
            attempt += 1;
            op(current)
        },
        condition,
    )
    .await
}
