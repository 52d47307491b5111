//! # `atomic_bar`
//!
//! A concurrent, throttled terminal progress bar.
//!
//! Any number of threads may advance one bar at once. Counting is lock-free, rendering is
//! throttled to a fixed rate no matter how fast advances arrive, and the final frame is
//! drawn exactly once, either by an explicit [`ProgressBar::finish`] or when the bar is
//! dropped.
//!
//! * **Lock-minimal**: the hot path is one `fetch_add` plus two relaxed stores into a
//!   fixed history ring. The only locks guard the cached rate and the output surface.
//! * **Bounded rendering**: a compare-and-swap on the last-render timestamp admits at
//!   most one render per interval; losing threads return immediately.
//! * **Pluggable output**: the [`RenderStrategy`] trait decides what a frame looks like;
//!   [`BarRenderer`] is the stock status line.
//! * **Sole ownership**: a [`ProgressBar`] is not `Clone`. It may be moved, or shared by
//!   reference, but never duplicated.
//!
//! ## Modules
//!
//! * [`bar`]: The [`ProgressBar`] controller: lifecycle, throttle, auto-finish.
//! * [`builder`]: Fluent configuration via [`ProgressBarBuilder`].
//! * [`tracker`]: The lock-minimal [`Tracker`] and its [`ProgressSnapshot`].
//! * [`render`]: The [`RenderStrategy`] trait, [`BarRenderer`] and output [`Surface`]s.
//! * [`theme`]: Glyph tables for the stock renderer.
//! * [`format`]: Human-readable time, rate and color helpers.
//! * [`terminal`]: Terminal width and the `NO_COLOR` convention.
//! * [`iter`]: Extension traits for tracking progress on Iterators.
//!
//! ## Example
//!
//! ```no_run
//! use atomic_bar::{ProgressBar, Theme};
//!
//! let bar = ProgressBar::builder(1_000)
//!     .label("hashing")
//!     .theme(Theme::ASCII)
//!     .build();
//!
//! std::thread::scope(|s| {
//!     for _ in 0..4 {
//!         s.spawn(|| {
//!             for _ in 0..250 {
//!                 bar.inc();
//!             }
//!         });
//!     }
//! });
//!
//! bar.finish()?;
//! # Ok::<(), atomic_bar::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bar;
pub mod builder;
pub mod error;
pub mod format;
pub mod iter;
pub mod render;
pub mod terminal;
pub mod theme;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use bar::{DEFAULT_RENDER_INTERVAL, Lifecycle, ProgressBar};
pub use builder::ProgressBarBuilder;
pub use error::{Error, Result};
pub use iter::{ProgressIter, ProgressIteratorExt};
pub use render::{BarRenderer, DEFAULT_WIDTH, Labeled, RenderStrategy, Surface};
pub use theme::Theme;
pub use tracker::{DEFAULT_RATE_CACHE_INTERVAL, HISTORY_CAPACITY, ProgressSnapshot, Tracker};
