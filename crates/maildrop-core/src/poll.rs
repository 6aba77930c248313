//! Polling policy for blocking receives

use crate::error::TransportError;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::trace;

/// How often to re-check an empty mailbox, and for how long
///
/// The default checks once per second forever.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Sleep after the first empty check
    pub interval: Duration,
    /// Upper bound for the sleep once backoff has grown it
    pub max_interval: Duration,
    /// Factor applied to the sleep after each empty check (1.0 = fixed)
    pub backoff: f64,
    /// Give up with [`TransportError::Timeout`] after this long
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1))
    }
}

impl PollPolicy {
    /// Fixed interval, no deadline
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            backoff: 1.0,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff = factor;
        self.max_interval = max_interval;
        self
    }

    /// Sleep to use after `current`, grown by `backoff` and capped
    pub fn next_interval(&self, current: Duration) -> Duration {
        let cap = self.max_interval.max(self.interval);
        let factor = if self.backoff.is_finite() && self.backoff >= 1.0 {
            self.backoff
        } else {
            1.0
        };
        let grown = current.as_nanos() as f64 * factor;
        if grown >= cap.as_nanos() as f64 {
            return cap;
        }
        Duration::from_nanos(grown.round() as u64)
    }

    /// Call `attempt` until it yields something other than "no message"
    ///
    /// Any error except [`TransportError::NoMessage`] is returned at once.
    /// Sleeps never run past the deadline; one final attempt is made when it
    /// is reached.
    pub fn run<T, F>(&self, mailbox: &Path, mut attempt: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Result<T, TransportError>,
    {
        let start = Instant::now();
        let mut interval = self.interval;
        let mut attempts: u64 = 0;

        loop {
            attempts += 1;
            match attempt() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_no_message() => {}
                Err(e) => return Err(e),
            }

            let sleep_for = match self.timeout {
                Some(timeout) => {
                    let elapsed = start.elapsed();
                    if elapsed >= timeout {
                        return Err(TransportError::Timeout {
                            mailbox: mailbox.to_path_buf(),
                            waited: elapsed,
                        });
                    }
                    interval.min(timeout - elapsed)
                }
                None => interval,
            };

            trace!(attempts, ?sleep_for, mailbox = %mailbox.display(), "mailbox empty, sleeping");
            std::thread::sleep(sleep_for);
            interval = self.next_interval(interval);
        }
    }
}
