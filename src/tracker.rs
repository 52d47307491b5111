//! Lock-minimal progress state and rate estimation.
//!
//! [`Tracker`] is the counting half of a progress bar. Its state is split by access
//! pattern:
//!
//! * **Hot Data:** the current count, the total, and a fixed ring of
//!   [`HISTORY_CAPACITY`] `(progress, timestamp)` samples. All of these are plain
//!   atomics, so [`Tracker::advance`] never takes a lock no matter how many threads
//!   call it.
//! * **Cold Data:** the cached rate estimate, guarded by a
//!   [`Mutex`](parking_lot::Mutex). Scanning the ring is `O(N)`, so the result is
//!   reused for [`DEFAULT_RATE_CACHE_INTERVAL`] before it is recomputed.
//!
//! # Rate Window
//!
//! The rate is a sliding window over the last (up to) [`HISTORY_CAPACITY`] advances,
//! not a lifetime average: the oldest and newest samples in the ring are located by
//! comparing timestamps, and the rate is the progress delta between them divided by
//! their time delta. Comparing timestamps rather than slot positions keeps the scan
//! correct when concurrent writers land their samples out of order.
//!
//! # Torn Samples
//!
//! A sample's progress value and timestamp are two independent relaxed stores. A reader
//! racing a writer on the same slot can pair a timestamp from one advance with a
//! progress value from another. The rate is advisory, so this is accepted rather than
//! locked away; the only guard is that a negative delta saturates to zero.

use std::{
    array,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use log::trace;
use parking_lot::Mutex;
use web_time::Instant;

/// Number of samples kept in the rate-estimation ring.
pub const HISTORY_CAPACITY: usize = 64;

/// How long a computed rate is reused before the ring is scanned again.
pub const DEFAULT_RATE_CACHE_INTERVAL: Duration = Duration::from_millis(100);

/// One slot of the history ring.
///
/// Each slot sits on its own cache line so that writers on neighbouring slots do not
/// false-share.
#[repr(align(64))]
#[derive(Default)]
struct HistorySample {
    progress: AtomicU64,
    /// Microseconds since tracker creation, plus one. Zero marks an empty slot.
    timestamp: AtomicU64,
}

/// The last computed rate and when it was computed.
#[derive(Clone, Copy, Debug, Default)]
struct RateCache {
    rate: f64,
    computed_at: Option<Instant>,
    elapsed: Duration,
}

/// Thread-safe progress counter with a windowed rate estimate.
///
/// All methods take `&self`; share a tracker by reference (or inside an `Arc`) and call
/// [`advance`](Self::advance) from as many threads as needed. None of the operations
/// fail: degenerate inputs (zero total, empty history, zero rate) yield defined
/// sentinel values.
pub struct Tracker {
    start: Instant,

    // Hot path.
    current: AtomicU64,
    total: AtomicU64,
    history: [HistorySample; HISTORY_CAPACITY],
    cursor: AtomicU64,

    // Cold path.
    cache: Mutex<RateCache>,
    cache_interval: Duration,
}

impl Tracker {
    /// Creates a tracker for `total` units of work, starting the clock now.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self::with_cache_interval(total, DEFAULT_RATE_CACHE_INTERVAL)
    }

    /// Creates a tracker whose rate estimate is reused for `cache_interval`.
    ///
    /// A zero interval recomputes the rate on every call to [`rate`](Self::rate).
    #[must_use]
    pub fn with_cache_interval(total: u64, cache_interval: Duration) -> Self {
        Self {
            start: Instant::now(),
            current: AtomicU64::new(0),
            total: AtomicU64::new(total),
            history: array::from_fn(|_| HistorySample::default()),
            cursor: AtomicU64::new(0),
            cache: Mutex::new(RateCache::default()),
            cache_interval,
        }
    }

    // ========================================================================
    // Hot Path
    // ========================================================================

    /// Adds `n` to the current count and records a history sample.
    ///
    /// The counter itself uses acquire/release ordering so that a reader never observes
    /// a value older than one it has already seen. The history sample is written with
    /// relaxed stores; see the module docs for the tolerance this implies.
    ///
    /// The count saturates at `u64::MAX` instead of wrapping, so it never decreases.
    pub fn advance(&self, n: u64) {
        let (Ok(prev) | Err(prev)) = self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some(c.saturating_add(n)));
        let progress = prev.saturating_add(n);

        #[allow(clippy::cast_possible_truncation)]
        let slot = (self.cursor.fetch_add(1, Ordering::Relaxed) % HISTORY_CAPACITY as u64) as usize;
        let sample = &self.history[slot];
        sample.progress.store(progress, Ordering::Relaxed);
        sample.timestamp.store(self.stamp(), Ordering::Relaxed);
    }

    /// Returns the current count.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Returns the total.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Replaces the total. The current count is left untouched.
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Release);
    }

    // ========================================================================
    // Derived Metrics
    // ========================================================================

    /// Returns the completion percentage, clamped to `[0, 100]`.
    ///
    /// Returns `0.0` when the total is zero. The raw counters are never clamped, only
    /// this figure.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        percentage(self.current(), self.total())
    }

    /// Returns the time since the tracker was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Returns the recent throughput in updates per second.
    ///
    /// Returns `0.0` until the history holds two samples with distinct timestamps.
    /// The value is cached; calls within the cache interval return the previous
    /// result unchanged.
    #[must_use]
    pub fn rate(&self) -> f64 {
        let now = Instant::now();

        {
            let cache = self.cache.lock();
            if let Some(at) = cache.computed_at {
                if now.duration_since(at) < self.cache_interval {
                    return cache.rate;
                }
            }
        }

        let rate = self.scan_rate();
        let elapsed = now.duration_since(self.start);
        trace!("rate recomputed: {rate:.3}/s after {elapsed:?}");

        *self.cache.lock() = RateCache {
            rate,
            computed_at: Some(now),
            elapsed,
        };
        rate
    }

    /// Returns the most recently cached rate together with the tracker's elapsed time
    /// at the moment it was computed, or `None` if no rate has been computed yet.
    #[must_use]
    pub fn cached_rate(&self) -> Option<(f64, Duration)> {
        let cache = *self.cache.lock();
        cache.computed_at.map(|_| (cache.rate, cache.elapsed))
    }

    /// Estimates the time remaining at the current rate.
    ///
    /// Returns `None` ("unknown") while the rate is zero. Once the count reaches or
    /// passes the total, returns `Some(Duration::ZERO)`. An estimate too large to
    /// represent is also reported as unknown.
    #[must_use]
    pub fn eta(&self) -> Option<Duration> {
        eta(self.current(), self.total(), self.rate())
    }

    /// Captures every metric at once for rendering.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.into()
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn stamp(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_micros())
            .unwrap_or(u64::MAX)
            .saturating_add(1)
    }

    fn scan_rate(&self) -> f64 {
        let written = self.cursor.load(Ordering::Relaxed);
        let filled = usize::try_from(written).map_or(HISTORY_CAPACITY, |n| n.min(HISTORY_CAPACITY));

        window_rate(self.history[..filled].iter().map(|sample| {
            (
                sample.progress.load(Ordering::Relaxed),
                sample.timestamp.load(Ordering::Relaxed),
            )
        }))
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("current", &self.current())
            .field("total", &self.total())
            .field("elapsed", &self.elapsed())
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(current: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (100.0 * current as f64 / total as f64).min(100.0)
}

#[allow(clippy::cast_precision_loss)]
fn eta(current: u64, total: u64, rate: f64) -> Option<Duration> {
    if rate <= 0.0 || !rate.is_finite() {
        return None;
    }
    let remaining = total.saturating_sub(current) as f64;
    Duration::try_from_secs_f64(remaining / rate).ok()
}

/// Computes updates per second from `(progress, timestamp_micros)` samples.
///
/// Samples with a zero timestamp are empty slots and are skipped. The oldest and
/// newest samples are chosen by timestamp, so the order of the input does not matter.
#[allow(clippy::cast_precision_loss)]
fn window_rate(samples: impl Iterator<Item = (u64, u64)>) -> f64 {
    let mut oldest: Option<(u64, u64)> = None;
    let mut newest: Option<(u64, u64)> = None;

    for (progress, stamp) in samples {
        if stamp == 0 {
            continue;
        }
        if oldest.is_none_or(|(_, t)| stamp < t) {
            oldest = Some((progress, stamp));
        }
        if newest.is_none_or(|(_, t)| stamp > t) {
            newest = Some((progress, stamp));
        }
    }

    match (oldest, newest) {
        (Some((p0, t0)), Some((p1, t1))) if t1 > t0 => {
            let delta = p1.saturating_sub(p0) as f64;
            1e6 * delta / (t1 - t0) as f64
        }
        _ => 0.0,
    }
}

/// A plain-data view of a [`Tracker`] at one instant.
///
/// Render strategies receive one of these, so every figure on a status line comes
/// from the same moment and no locks are held while formatting.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressSnapshot {
    current: u64,
    total: u64,
    percentage: f64,
    rate: f64,
    elapsed: Duration,
    eta: Option<Duration>,
}

impl From<&Tracker> for ProgressSnapshot {
    fn from(tracker: &Tracker) -> Self {
        let current = tracker.current();
        let total = tracker.total();
        let rate = tracker.rate();

        Self {
            current,
            total,
            percentage: percentage(current, total),
            rate,
            elapsed: tracker.elapsed(),
            eta: eta(current, total, rate),
        }
    }
}

impl ProgressSnapshot {
    /// Builds a snapshot from explicit figures, deriving percentage and ETA.
    ///
    /// Useful for driving a render strategy without a live tracker.
    #[must_use]
    pub fn from_parts(current: u64, total: u64, rate: f64, elapsed: Duration) -> Self {
        Self {
            current,
            total,
            percentage: percentage(current, total),
            rate,
            elapsed,
            eta: eta(current, total, rate),
        }
    }

    /// Returns the current count.
    #[must_use]
    pub const fn current(&self) -> u64 {
        self.current
    }

    /// Returns the total.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Returns the completion percentage in `[0, 100]`.
    #[must_use]
    pub const fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Returns the windowed rate in updates per second.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns the elapsed time.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns the ETA, or `None` when unknown.
    #[must_use]
    pub const fn eta(&self) -> Option<Duration> {
        self.eta
    }
}
