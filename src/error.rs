//! Error type for the fallible edges of the crate.
//!
//! Almost everything here is infallible: counters, rates and percentages degrade to
//! sentinel values instead of failing. The two things that can go wrong are writing
//! to the output surface and asking the builder for an impossible configuration.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`ProgressBar`](crate::ProgressBar) and
/// [`ProgressBarBuilder`](crate::ProgressBarBuilder).
#[derive(Debug, Error)]
pub enum Error {
    /// Writing to the output surface failed (closed pipe, full disk, ...).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The builder was given a configuration that cannot be rendered.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
