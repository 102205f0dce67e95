//! Wall-clock timing helpers used around sweeps and batches.

use std::time::{Duration, Instant};

/// Scoped wall-clock timer.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    /// Starts timing now.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time elapsed since [`Stopwatch::start`].
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time rendered by [`format_elapsed`].
    pub fn formatted(&self) -> String {
        format_elapsed(self.elapsed())
    }
}

/// Runs `work` and returns its result together with the wall-clock duration.
pub fn timed<T>(work: impl FnOnce() -> T) -> (T, Duration) {
    let watch = Stopwatch::start();
    let value = work();
    (value, watch.elapsed())
}

/// Formats a duration as `HH:MM:SS.ss`.
///
/// Hours are not wrapped at 24; seconds keep two decimals.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    let hours = (total / 3600.0).floor();
    let rem = total - hours * 3600.0;
    let minutes = (rem / 60.0).floor();
    let seconds = rem - minutes * 60.0;
    format!("{:02}:{:02}:{:05.2}", hours as u64, minutes as u64, seconds)
}
