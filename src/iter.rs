//! Iterator adapters for automatic progress tracking.
//!
//! This module provides the [`ProgressIteratorExt`] trait, which adds helper methods
//! to any Rust [`Iterator`]. This allows you to attach a progress bar to a loop with
//! a single method call.
//!
//! The bar's total comes from [`Iterator::size_hint`] when the bounds agree, and is
//! zero otherwise (the bar then shows counts but no meaningful percentage).
//!
//! # Example
//!
//! ```no_run
//! use atomic_bar::ProgressIteratorExt;
//!
//! for _item in vec![1, 2, 3].into_iter().progress_with_label("items") {
//!     // ...
//! }
//! ```

use compact_str::CompactString;
use log::warn;

use crate::{bar::ProgressBar, builder::ProgressBarBuilder};

/// An iterator adapter that owns a [`ProgressBar`] and advances it once per item.
///
/// Every yielded element counts, the last one included, so a fully consumed sequence of
/// `n` items ends at `n/n` rather than stopping one short at `(n-1)/n`.
///
/// The bar is finished when the inner iterator is exhausted, or when the adapter is
/// dropped early.
pub struct ProgressIter<I> {
    iter: I,
    bar: ProgressBar,
}

impl<I> ProgressIter<I> {
    /// Creates a new `ProgressIter`.
    ///
    /// Note: This is usually constructed via [`ProgressIteratorExt`] methods.
    pub const fn new(iter: I, bar: ProgressBar) -> Self {
        Self { iter, bar }
    }

    /// Returns the bar, e.g. to change its label mid-loop.
    #[must_use]
    pub const fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl<I: Iterator> Iterator for ProgressIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.iter.next();

        if item.is_some() {
            self.bar.inc();
        } else if let Err(err) = self.bar.finish() {
            warn!("progress bar finish failed: {err}");
        }

        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Extension trait to easily attach a progress bar to any Iterator.
pub trait ProgressIteratorExt: Sized {
    /// Wraps the iterator in a new [`ProgressBar`] sized from `size_hint`.
    fn progress(self) -> ProgressIter<Self>;

    /// Wraps the iterator in a new labeled [`ProgressBar`].
    fn progress_with_label(self, label: impl Into<CompactString>) -> ProgressIter<Self>;

    /// Wraps the iterator using an existing [`ProgressBar`].
    fn progress_with(self, bar: ProgressBar) -> ProgressIter<Self>;

    /// Returns the exact length from `size_hint`, or `0` when it is not exact.
    fn total_from_size_hint(&self) -> u64;
}

impl<I: Iterator> ProgressIteratorExt for I {
    fn progress(self) -> ProgressIter<Self> {
        let bar = ProgressBar::new(self.total_from_size_hint());
        ProgressIter::new(self, bar)
    }

    fn progress_with_label(self, label: impl Into<CompactString>) -> ProgressIter<Self> {
        let bar = ProgressBarBuilder::new(self.total_from_size_hint())
            .label(label)
            .build();
        ProgressIter::new(self, bar)
    }

    fn progress_with(self, bar: ProgressBar) -> ProgressIter<Self> {
        ProgressIter::new(self, bar)
    }

    fn total_from_size_hint(&self) -> u64 {
        match self.size_hint() {
            (lower, Some(upper)) if lower == upper => upper as u64,
            _ => 0,
        }
    }
}
