//! Read-only queries about the process's terminal.
//!
//! These are environmental facts the bar consumes but never owns: how wide the terminal
//! is, and whether the user asked for colorless output. Whether a given output is a
//! terminal at all is answered by [`Surface::is_terminal`](crate::render::Surface::is_terminal).

/// Returns the terminal width in columns, or `None` if it cannot be determined.
#[must_use]
pub fn width() -> Option<u16> {
    crossterm::terminal::size().ok().map(|(cols, _)| cols)
}

/// Returns `false` when the `NO_COLOR` convention asks for monochrome output.
#[must_use]
pub fn color_allowed() -> bool {
    std::env::var_os("NO_COLOR").is_none_or(|v| v.is_empty())
}
