//! Turning tracker state into visible output.
//!
//! A [`RenderStrategy`] receives a [`ProgressSnapshot`] and writes it somewhere. The
//! [`ProgressBar`](crate::ProgressBar) decides *when* to call it (throttling, lifecycle);
//! the strategy only decides *what* the output looks like.
//!
//! [`BarRenderer`] is the stock implementation: a single carriage-return-updated status
//! line of the form
//!
//! ```text
//! label:  42% ################=       | 420/1000 [1.2 K/s, 1m 3s<1m 27s]
//! ```
//!
//! Callers can substitute their own strategy entirely. Strategies that can display a
//! label advertise it through [`RenderStrategy::as_labeled`].

use std::{
    fmt::Write as _,
    io::{self, IsTerminal},
    sync::atomic::{AtomicUsize, Ordering},
};

use compact_str::CompactString;
use crossterm::{
    Command,
    style::{Color, ResetColor, SetForegroundColor},
};
use parking_lot::{Mutex, RwLock};

use crate::{
    format::{format_rate, format_time, hsv_to_rgb},
    terminal,
    theme::Theme,
    tracker::ProgressSnapshot,
};

/// Default number of cells in the bar.
pub const DEFAULT_WIDTH: usize = 40;

/// A pluggable way of drawing progress.
///
/// Implementations must be [`Send`] and [`Sync`]: the owning bar is shared across the
/// threads that advance it, and whichever thread wins the render throttle calls in.
/// The bar guarantees that at most one call is in flight at a time and that
/// [`finish`](Self::finish) is called exactly once, after which `render` is never called
/// again.
pub trait RenderStrategy: Send + Sync {
    /// Draws the current state. Called repeatedly; each call should fully replace the
    /// previous output.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying output reports when a write fails.
    fn render(&self, snapshot: &ProgressSnapshot) -> io::Result<()>;

    /// Draws the final state and leaves the output ready for ordinary text.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying output reports when a write fails.
    fn finish(&self, snapshot: &ProgressSnapshot) -> io::Result<()>;

    /// Returns the label capability, if this strategy has one.
    fn as_labeled(&self) -> Option<&dyn Labeled> {
        None
    }
}

/// Optional capability for strategies that show a text label.
pub trait Labeled {
    /// Replaces the label. An empty label hides it.
    fn set_label(&self, label: &str);

    /// Returns the current label.
    fn label(&self) -> CompactString;
}

/// Where rendered frames are written.
///
/// Every frame is written and flushed under one lock, so frames from rapid successive
/// renders never interleave. The standard streams use the process-wide stream locks,
/// which also serializes bars that share a stream.
pub enum Surface {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
    /// Any other writer.
    Writer(Mutex<Box<dyn io::Write + Send>>),
}

impl Surface {
    /// Wraps an arbitrary writer.
    pub fn writer(writer: impl io::Write + Send + 'static) -> Self {
        Self::Writer(Mutex::new(Box::new(writer)))
    }

    /// Returns `true` if this surface is an interactive terminal.
    ///
    /// Each standard stream is checked on its own; an arbitrary writer is never
    /// considered a terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Stdout => io::stdout().is_terminal(),
            Self::Stderr => io::stderr().is_terminal(),
            Self::Writer(_) => false,
        }
    }

    /// Writes and flushes one frame.
    ///
    /// # Errors
    ///
    /// Propagates the writer's error.
    pub fn write_frame(&self, frame: &str) -> io::Result<()> {
        fn emit(out: &mut dyn io::Write, frame: &str) -> io::Result<()> {
            out.write_all(frame.as_bytes())?;
            out.flush()
        }

        match self {
            Self::Stdout => emit(&mut io::stdout().lock(), frame),
            Self::Stderr => emit(&mut io::stderr().lock(), frame),
            Self::Writer(writer) => emit(&mut **writer.lock(), frame),
        }
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::Stdout
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => f.write_str("Surface::Stdout"),
            Self::Stderr => f.write_str("Surface::Stderr"),
            Self::Writer(_) => f.write_str("Surface::Writer(..)"),
        }
    }
}

/// The stock status-line renderer.
///
/// Draws a fixed-width bar with eight sub-cell fill levels, optionally tinted from red
/// to green as it fills, followed by counts, rate, elapsed time and ETA. It remembers
/// the visible width of its previous frame and pads shorter frames with spaces so no
/// stale characters survive a shrinking line. It must be the only writer of progress
/// lines to its surface.
pub struct BarRenderer {
    theme: Theme,
    width: usize,
    color: Option<bool>,
    auto_color: bool,
    show_percentage: bool,
    show_rate: bool,
    show_eta: bool,
    label: RwLock<CompactString>,
    last_width: AtomicUsize,
    surface: Surface,
}

impl BarRenderer {
    /// Creates a renderer writing to standard output.
    ///
    /// Unless forced with [`with_color`](Self::with_color), color is enabled when the
    /// surface is a terminal and `NO_COLOR` is unset.
    #[must_use]
    pub fn new() -> Self {
        let surface = Surface::Stdout;
        Self {
            theme: Theme::default(),
            width: DEFAULT_WIDTH,
            color: None,
            auto_color: auto_color(&surface),
            show_percentage: true,
            show_rate: true,
            show_eta: true,
            label: RwLock::new(CompactString::default()),
            last_width: AtomicUsize::new(0),
            surface,
        }
    }

    /// Sets the glyph theme.
    #[must_use]
    pub const fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Sets the number of cells in the bar (at least one).
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    /// Enables or disables the color escape sequences.
    #[must_use]
    pub const fn with_color(mut self, color: bool) -> Self {
        self.color = Some(color);
        self
    }

    /// Shows or hides the leading percentage.
    #[must_use]
    pub const fn with_percentage(mut self, show: bool) -> Self {
        self.show_percentage = show;
        self
    }

    /// Shows or hides the rate.
    #[must_use]
    pub const fn with_rate(mut self, show: bool) -> Self {
        self.show_rate = show;
        self
    }

    /// Shows or hides the ETA.
    #[must_use]
    pub const fn with_eta(mut self, show: bool) -> Self {
        self.show_eta = show;
        self
    }

    /// Sets the initial label.
    #[must_use]
    pub fn with_label(self, label: impl Into<CompactString>) -> Self {
        *self.label.write() = label.into();
        self
    }

    /// Sets the output surface.
    #[must_use]
    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.auto_color = auto_color(&surface);
        self.surface = surface;
        self
    }

    /// Returns the bar width in cells.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Returns `true` if color escapes are emitted.
    #[must_use]
    pub fn color(&self) -> bool {
        self.color.unwrap_or(self.auto_color)
    }

    /// Builds the status line, returning it with its visible width (escape sequences
    /// excluded).
    fn compose(&self, snapshot: &ProgressSnapshot) -> (String, usize) {
        let mut line = String::with_capacity(self.width + 64);
        let mut hidden = 0;
        let percentage = snapshot.percentage();
        let color = self.color();

        {
            let label = self.label.read();
            if !label.is_empty() {
                line.push_str(&label);
                line.push_str(": ");
            }
        }

        if self.show_percentage {
            let _ = write!(line, "{percentage:>3.0}% ");
        }

        if color {
            let rgb = hsv_to_rgb(percentage / 300.0, 0.8, 1.0);
            let before = line.len();
            let _ = SetForegroundColor(Color::Rgb {
                r: rgb.r,
                g: rgb.g,
                b: rgb.b,
            })
            .write_ansi(&mut line);
            hidden += line.len() - before;
        }

        line.push_str(self.theme.left_bracket);
        self.push_cells(&mut line, percentage);
        line.push_str(self.theme.right_bracket);

        if color {
            let before = line.len();
            let _ = ResetColor.write_ansi(&mut line);
            hidden += line.len() - before;
        }

        line.push_str(self.theme.right_pad);
        line.push(' ');
        let _ = write!(line, "{}/{}", snapshot.current(), snapshot.total());

        if self.show_rate || self.show_eta {
            line.push_str(" [");
            if self.show_rate {
                line.push_str(&format_rate(snapshot.rate()));
                line.push_str(", ");
            }
            line.push_str(&format_time(snapshot.elapsed()));
            if self.show_eta && percentage < 100.0 {
                line.push('<');
                match snapshot.eta() {
                    Some(eta) => line.push_str(&format_time(eta)),
                    None => line.push('?'),
                }
            }
            line.push(']');
        }

        let visible = line.chars().count() - hidden;
        (line, visible)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn push_cells(&self, line: &mut String, percentage: f64) {
        let fills = (percentage / 100.0) * self.width as f64;
        let whole = (fills.floor().max(0.0) as usize).min(self.width);

        for _ in 0..whole {
            line.push_str(self.theme.full());
        }

        if whole < self.width {
            let level = ((fills - whole as f64) * 8.0).floor().clamp(0.0, 8.0) as usize;
            line.push_str(self.theme.block(level));
            for _ in (whole + 1)..self.width {
                line.push_str(self.theme.empty());
            }
        }
    }

    /// Builds a complete frame: carriage return, line, padding, terminator.
    fn frame(&self, snapshot: &ProgressSnapshot, terminator: &str) -> String {
        let (mut line, visible) = self.compose(snapshot);

        let previous = self.last_width.swap(visible, Ordering::AcqRel);
        if previous > visible {
            line.extend(std::iter::repeat_n(' ', previous - visible));
        }

        let mut frame = String::with_capacity(line.len() + 2);
        frame.push('\r');
        frame.push_str(&line);
        frame.push_str(terminator);
        frame
    }
}

fn auto_color(surface: &Surface) -> bool {
    surface.is_terminal() && terminal::color_allowed()
}

impl Default for BarRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BarRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BarRenderer")
            .field("theme", &self.theme)
            .field("width", &self.width)
            .field("color", &self.color())
            .field("label", &*self.label.read())
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl RenderStrategy for BarRenderer {
    fn render(&self, snapshot: &ProgressSnapshot) -> io::Result<()> {
        self.surface.write_frame(&self.frame(snapshot, ""))
    }

    fn finish(&self, snapshot: &ProgressSnapshot) -> io::Result<()> {
        let frame = self.frame(snapshot, "\n");
        // The next frame starts on a fresh line.
        self.last_width.store(0, Ordering::Release);
        self.surface.write_frame(&frame)
    }

    fn as_labeled(&self) -> Option<&dyn Labeled> {
        Some(self)
    }
}

impl Labeled for BarRenderer {
    fn set_label(&self, label: &str) {
        *self.label.write() = CompactString::from(label);
    }

    fn label(&self) -> CompactString {
        self.label.read().clone()
    }
}
