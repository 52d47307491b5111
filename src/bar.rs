//! The progress bar controller.
//!
//! [`ProgressBar`] ties a [`Tracker`] to a [`RenderStrategy`] and adds the two rules that
//! make it safe to hammer from many threads:
//!
//! * **Render throttle.** After every advance the bar *may* render, but at most once per
//!   render interval (33 ms by default). Admission is a single compare-and-swap on the
//!   last-render timestamp; the winning thread renders synchronously, every other thread
//!   returns as soon as its counter update is done.
//! * **Exactly-once finish.** The bar moves from [`Lifecycle::Active`] to
//!   [`Lifecycle::Finished`] once, by compare-and-swap. The winner draws the final frame;
//!   every later call (explicit or from [`Drop`]) is a no-op.
//!
//! A bar is deliberately not [`Clone`]: it is the sole owner of its line on the output
//! surface. Share it by reference (`std::thread::scope`) or inside an `Arc`:
//!
//! ```compile_fail
//! let bar = atomic_bar::ProgressBar::new(10);
//! let copy = bar.clone();
//! ```

use std::{
    sync::atomic::{AtomicU8, AtomicU64, Ordering},
    thread,
    time::Duration,
};

use log::{debug, trace, warn};
use parking_lot::Mutex;
use web_time::Instant;

use crate::{
    builder::ProgressBarBuilder,
    error::Result,
    render::RenderStrategy,
    tracker::{ProgressSnapshot, Tracker},
};

/// Minimum time between two throttled renders.
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_millis(33);

/// Lifecycle of a [`ProgressBar`]. The only transition is `Active -> Finished`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifecycle {
    /// Accepting advances and rendering.
    #[default]
    Active = 0,
    /// Final frame drawn; no further rendering.
    Finished = 1,
}

impl Lifecycle {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Active,
            _ => Self::Finished,
        }
    }
}

/// A thread-safe, throttled, self-finishing progress bar.
///
/// # Examples
///
/// ```no_run
/// use atomic_bar::ProgressBar;
///
/// let bar = ProgressBar::new(1_000);
/// std::thread::scope(|s| {
///     for _ in 0..8 {
///         s.spawn(|| {
///             for _ in 0..125 {
///                 bar.inc();
///             }
///         });
///     }
/// });
/// assert_eq!(bar.current(), 1_000);
/// // Dropping `bar` draws the final frame if `finish` was never called.
/// ```
pub struct ProgressBar {
    tracker: Tracker,
    strategy: Box<dyn RenderStrategy>,
    interactive: bool,

    lifecycle: AtomicU8,

    // Render throttle.
    epoch: Instant,
    render_interval_ms: u64,
    last_render_ms: AtomicU64,
    render_lock: Mutex<()>,
}

impl ProgressBar {
    /// Creates a bar for `total` units with the default renderer and settings.
    ///
    /// If standard output is a terminal, the 0% frame is drawn immediately.
    #[must_use]
    pub fn new(total: u64) -> Self {
        ProgressBarBuilder::new(total).build()
    }

    /// Creates a bar for `total` units drawn by `strategy`.
    #[must_use]
    pub fn with_strategy(total: u64, strategy: impl RenderStrategy + 'static) -> Self {
        ProgressBarBuilder::new(total).strategy(strategy).build()
    }

    /// Starts a [`ProgressBarBuilder`].
    #[must_use]
    pub fn builder(total: u64) -> ProgressBarBuilder {
        ProgressBarBuilder::new(total)
    }

    pub(crate) fn from_parts(
        tracker: Tracker,
        strategy: Box<dyn RenderStrategy>,
        interactive: bool,
        render_interval: Duration,
    ) -> Self {
        let bar = Self {
            tracker,
            strategy,
            interactive,
            lifecycle: AtomicU8::new(Lifecycle::Active as u8),
            epoch: Instant::now(),
            render_interval_ms: u64::try_from(render_interval.as_millis()).unwrap_or(u64::MAX),
            last_render_ms: AtomicU64::new(0),
            render_lock: Mutex::new(()),
        };

        debug!(
            "progress bar created: total={}, interactive={}, render_interval={:?}",
            bar.tracker.total(),
            interactive,
            render_interval
        );

        if interactive {
            if let Err(err) = bar.render_now() {
                warn!("initial progress render failed: {err}");
            }
        }
        bar
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Adds `n` to the count, then renders if the throttle admits this call.
    ///
    /// Never fails. A failed throttled render is logged and otherwise ignored; the final
    /// render from [`finish`](Self::finish) reports I/O errors to the caller.
    pub fn advance(&self, n: u64) {
        self.tracker.advance(n);
        self.try_render();
    }

    /// Shorthand for `advance(1)`.
    pub fn inc(&self) {
        self.advance(1);
    }

    /// Replaces the total. Takes effect on the next frame.
    pub fn set_total(&self, total: u64) {
        self.tracker.set_total(total);
    }

    /// Forwards `label` to the render strategy if it supports labels; otherwise does
    /// nothing.
    pub fn set_label(&self, label: &str) {
        if let Some(labeled) = self.strategy.as_labeled() {
            labeled.set_label(label);
        }
    }

    /// Draws a frame now, ignoring the throttle.
    ///
    /// Does nothing once the bar has finished, or when the output is not interactive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if writing the frame fails.
    pub fn refresh(&self) -> Result<()> {
        if !self.interactive {
            return Ok(());
        }
        self.render_now()?;
        Ok(())
    }

    /// Finishes the bar, drawing the final frame.
    ///
    /// Only the first call (from any thread, or from [`Drop`]) does anything; later
    /// calls return `Ok(())` immediately. On a non-interactive output the transition
    /// still happens but nothing is drawn.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if writing the final frame fails.
    pub fn finish(&self) -> Result<()> {
        if self
            .lifecycle
            .compare_exchange(
                Lifecycle::Active as u8,
                Lifecycle::Finished as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Ok(());
        }

        debug!(
            "progress bar finished: {}/{} in {:?}",
            self.tracker.current(),
            self.tracker.total(),
            self.tracker.elapsed()
        );

        if !self.interactive {
            return Ok(());
        }

        let _guard = self.render_lock.lock();
        self.strategy.finish(&self.tracker.snapshot())?;
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the current count.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.tracker.current()
    }

    /// Returns the total.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.tracker.total()
    }

    /// Returns the completion percentage in `[0, 100]`.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.tracker.percentage()
    }

    /// Returns the recent rate in updates per second.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.tracker.rate()
    }

    /// Returns the time since the bar was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.tracker.elapsed()
    }

    /// Returns the estimated time remaining, or `None` while the rate is unknown.
    #[must_use]
    pub fn eta(&self) -> Option<Duration> {
        self.tracker.eta()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::Acquire))
    }

    /// Returns `true` once [`finish`](Self::finish) has run.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.lifecycle() == Lifecycle::Finished
    }

    /// Returns `true` if this bar draws anything at all.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Captures the tracker state.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tracker.snapshot()
    }

    /// Returns the underlying tracker.
    #[must_use]
    pub const fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Runs `f` over `items` on `threads` scoped worker threads, advancing this bar once
    /// per item, then finishes the bar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the final frame cannot be written.
    pub fn for_each_concurrent<T, F>(self, items: &[T], threads: usize, f: F) -> Result<()>
    where
        T: Sync,
        F: Fn(&T) + Sync,
    {
        if !items.is_empty() {
            let chunk = items.len().div_ceil(threads.max(1));
            thread::scope(|s| {
                for part in items.chunks(chunk) {
                    let bar = &self;
                    let f = &f;
                    s.spawn(move || {
                        for item in part {
                            f(item);
                            bar.inc();
                        }
                    });
                }
            });
        }
        self.finish()
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Renders if the interval has passed and this thread wins the timestamp swap.
    fn try_render(&self) {
        if !self.interactive || self.is_finished() {
            return;
        }

        let now = self.now_ms();
        let last = self.last_render_ms.load(Ordering::Acquire);
        if now.saturating_sub(last) < self.render_interval_ms {
            return;
        }
        if self
            .last_render_ms
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        trace!("render admitted at {now}ms");
        if let Err(err) = self.render_now() {
            warn!("progress render failed: {err}");
        }
    }

    fn render_now(&self) -> std::io::Result<()> {
        let _guard = self.render_lock.lock();
        // A finish may have landed while this thread waited for the lock.
        if self.is_finished() {
            return Ok(());
        }
        self.strategy.render(&self.tracker.snapshot())
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            warn!("progress bar finish on drop failed: {err}");
        }
    }
}

impl std::fmt::Debug for ProgressBar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressBar")
            .field("tracker", &self.tracker)
            .field("lifecycle", &self.lifecycle())
            .field("interactive", &self.interactive)
            .field("render_interval_ms", &self.render_interval_ms)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, atomic::Ordering},
        thread,
        time::Duration,
    };

    use super::{Lifecycle, ProgressBar};
    use crate::{
        render::{BarRenderer, Surface},
        testing::{Counts, CountingStrategy, SharedBuffer},
    };

    fn counted(total: u64, interval: Duration) -> (ProgressBar, Arc<Counts>) {
        let counts = Arc::new(Counts::default());
        let bar = ProgressBar::builder(total)
            .strategy(CountingStrategy(counts.clone()))
            .interactive(true)
            .render_interval(interval)
            .build();
        (bar, counts)
    }

    fn buffered(total: u64, buf: &SharedBuffer) -> ProgressBar {
        ProgressBar::builder(total)
            .strategy(
                BarRenderer::new()
                    .with_surface(Surface::writer(buf.clone()))
                    .with_color(false)
                    .with_width(10)
                    .with_rate(false)
                    .with_eta(false),
            )
            .interactive(true)
            .build()
    }

    /// Final segment of the output, i.e. what is visible once the bar is done.
    fn last_frame(out: &str) -> &str {
        out.rsplit('\r').next().unwrap_or_default()
    }

    /// Single-Thread Run To Completion
    /// 1000 advances give 1000/1000, 100%, and one finish frame.
    #[test]
    #[allow(clippy::float_cmp)]
    fn test_single_thread_completion() {
        let buf = SharedBuffer::default();
        let bar = buffered(1_000, &buf);

        for _ in 0..1_000 {
            bar.advance(1);
        }

        assert_eq!(bar.current(), 1_000);
        assert_eq!(bar.percentage(), 100.0);
        assert!(bar.eta().is_none_or(|eta| eta.is_zero()));

        bar.finish().unwrap();
        let out = buf.contents();
        assert_eq!(out.matches('\n').count(), 1, "exactly one finish frame");
        assert!(last_frame(&out).contains("1000/1000"));
        assert!(out.ends_with('\n'));
    }

    /// Zero Total
    /// Percentage stays at 0 and the ETA is unknown; nothing panics.
    #[test]
    #[allow(clippy::float_cmp)]
    fn test_zero_total() {
        let (bar, counts) = counted(0, Duration::ZERO);
        bar.advance(5);

        assert_eq!(bar.current(), 5);
        assert_eq!(bar.percentage(), 0.0);
        assert!(bar.eta().is_none());

        drop(bar);
        assert_eq!(counts.finishes.load(Ordering::SeqCst), 1);
    }

    /// Concurrent Advance
    /// Eight threads of 125 reach exactly 1000, and one finish frame fires.
    #[test]
    fn test_concurrent_advance() {
        let (bar, counts) = counted(1_000, Duration::from_millis(1));

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| bar.advance(125));
            }
        });
        assert_eq!(bar.current(), 1_000);

        bar.finish().unwrap();
        assert_eq!(counts.finishes.load(Ordering::SeqCst), 1);
        let last = counts.last.lock().clone().expect("finish saw a snapshot");
        assert_eq!(last.current(), 1_000);
    }

    /// Exactly-Once Finish
    /// Many finish calls across threads, plus drop, produce one finish render.
    #[test]
    fn test_finish_exactly_once() {
        let (bar, counts) = counted(10, Duration::ZERO);

        thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    for _ in 0..10 {
                        bar.finish().unwrap();
                    }
                });
            }
        });
        assert_eq!(bar.lifecycle(), Lifecycle::Finished);

        drop(bar);
        assert_eq!(counts.finishes.load(Ordering::SeqCst), 1);
    }

    /// No Render After Finish
    /// Advances on a finished bar still count but draw nothing.
    #[test]
    fn test_no_render_after_finish() {
        let (bar, counts) = counted(10, Duration::ZERO);
        bar.finish().unwrap();
        let before = counts.renders.load(Ordering::SeqCst);

        bar.advance(3);
        bar.refresh().unwrap();

        assert_eq!(bar.current(), 3);
        assert_eq!(counts.renders.load(Ordering::SeqCst), before);
    }

    /// Scoped Auto-Finish
    /// Dropping an unfinished bar leaves the same final frame as finishing it.
    #[test]
    fn test_drop_matches_finish() {
        let manual = SharedBuffer::default();
        let scoped = SharedBuffer::default();

        {
            let bar = buffered(20, &manual);
            bar.advance(20);
            bar.finish().unwrap();
        }
        {
            let bar = buffered(20, &scoped);
            bar.advance(20);
        }

        let (manual, scoped) = (manual.contents(), scoped.contents());
        assert_eq!(last_frame(&manual), last_frame(&scoped));
        assert!(scoped.ends_with('\n'));
    }

    /// Render Throttle
    /// Renders are bounded by window / interval + 1, however many advances arrive.
    #[test]
    fn test_render_throttle_bound() {
        let interval = Duration::from_millis(20);
        let (bar, counts) = counted(u64::MAX, interval);
        // Discount the construction frame.
        let initial = counts.renders.load(Ordering::SeqCst);
        assert_eq!(initial, 1);

        let start = std::time::Instant::now();
        let mut calls = 0u64;
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while start.elapsed() < Duration::from_millis(200) {
                        bar.inc();
                    }
                });
            }
            while start.elapsed() < Duration::from_millis(200) {
                bar.inc();
                calls += 1;
            }
        });
        let window = start.elapsed();

        let renders = counts.renders.load(Ordering::SeqCst) - initial;
        let bound = u64::try_from(window.as_millis() / interval.as_millis()).unwrap() + 1;
        assert!(calls > bound, "test needs more advances than renders");
        assert!(
            u64::try_from(renders).unwrap() <= bound,
            "{renders} renders in {window:?} exceeds {bound}"
        );
    }

    /// Non-Interactive Output
    /// The counter still moves but nothing is ever drawn.
    #[test]
    fn test_non_interactive_suppresses_rendering() {
        let counts = Arc::new(Counts::default());
        let bar = ProgressBar::builder(10)
            .strategy(CountingStrategy(counts.clone()))
            .interactive(false)
            .render_interval(Duration::ZERO)
            .build();

        bar.advance(10);
        bar.finish().unwrap();

        assert_eq!(bar.current(), 10);
        assert!(bar.is_finished());
        assert_eq!(counts.renders.load(Ordering::SeqCst), 0);
        assert_eq!(counts.finishes.load(Ordering::SeqCst), 0);
    }

    /// Label Forwarding
    /// Labels reach a labeled renderer and are ignored by other strategies.
    #[test]
    fn test_set_label() {
        let buf = SharedBuffer::default();
        let bar = buffered(4, &buf);
        bar.set_label("fetch");
        bar.advance(4);
        bar.finish().unwrap();
        assert!(last_frame(&buf.contents()).starts_with("fetch: 100%"));

        let (plain, _counts) = counted(4, Duration::ZERO);
        plain.set_label("ignored");
        plain.finish().unwrap();
    }

    /// Moving Ownership
    /// A bar moved into another thread keeps its state and finishes once.
    #[test]
    fn test_move_between_threads() {
        let (bar, counts) = counted(5, Duration::ZERO);
        bar.advance(2);

        let handle = thread::spawn(move || {
            bar.advance(3);
            bar.current()
        });

        assert_eq!(handle.join().unwrap(), 5);
        assert_eq!(counts.finishes.load(Ordering::SeqCst), 1);
    }

    /// Concurrent For-Each
    /// Every item is visited once and the bar finishes at the item count.
    #[test]
    fn test_for_each_concurrent() {
        let (bar, counts) = counted(0, Duration::ZERO);
        bar.set_total(100);
        let items: Vec<u64> = (1..=100).collect();
        let sum = std::sync::atomic::AtomicU64::new(0);

        bar.for_each_concurrent(&items, 4, |&n| {
            sum.fetch_add(n, Ordering::Relaxed);
        })
        .unwrap();

        assert_eq!(sum.load(Ordering::Relaxed), 5_050);
        assert_eq!(counts.finishes.load(Ordering::SeqCst), 1);
        let last = counts.last.lock().clone().unwrap();
        assert_eq!(last.current(), 100);
    }
}
