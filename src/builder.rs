//! Fluent configuration for [`ProgressBar`] instances.
//!
//! [`ProgressBar::new`] covers the common case. The [`ProgressBarBuilder`] exposes every
//! knob the bar and its stock renderer have.
//!
//! # Key Features
//!
//! * **Renderer settings:** theme, width, color, label and which fields are shown are
//!   passed through to the [`BarRenderer`].
//! * **Custom strategies:** [`strategy`](ProgressBarBuilder::strategy) replaces the stock
//!   renderer entirely; the renderer settings are then ignored.
//! * **Timing:** the render throttle and the rate cache intervals can be tuned.
//! * **Environment overrides:** interactivity, color and the fitted width are derived
//!   from the configured [`Surface`] (standard error is checked on its own, an arbitrary
//!   writer is never a terminal). Interactivity can be forced either way, which is how
//!   output is captured in tests or piped logs get a bar anyway.

use std::time::Duration;

use compact_str::CompactString;

use crate::{
    bar::{DEFAULT_RENDER_INTERVAL, ProgressBar},
    error::{Error, Result},
    render::{BarRenderer, DEFAULT_WIDTH, RenderStrategy, Surface},
    terminal,
    theme::Theme,
    tracker::{DEFAULT_RATE_CACHE_INTERVAL, Tracker},
};

/// Columns left for the label, counts and timings when the bar width is derived from
/// the terminal.
const RESERVED_COLUMNS: usize = 40;

/// A builder for [`ProgressBar`].
pub struct ProgressBarBuilder {
    total: u64,
    label: CompactString,
    theme: Theme,
    width: Option<usize>,
    color: Option<bool>,
    show_percentage: bool,
    show_rate: bool,
    show_eta: bool,
    render_interval: Duration,
    rate_cache_interval: Duration,
    interactive: Option<bool>,
    surface: Surface,
    strategy: Option<Box<dyn RenderStrategy>>,
}

impl Default for ProgressBarBuilder {
    fn default() -> Self {
        Self {
            total: 0,
            label: CompactString::default(),
            theme: Theme::default(),
            width: None,
            color: None,
            show_percentage: true,
            show_rate: true,
            show_eta: true,
            render_interval: DEFAULT_RENDER_INTERVAL,
            rate_cache_interval: DEFAULT_RATE_CACHE_INTERVAL,
            interactive: None,
            surface: Surface::Stdout,
            strategy: None,
        }
    }
}

impl ProgressBarBuilder {
    /// Starts building a bar for `total` units.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Sets the label shown before the percentage.
    #[must_use]
    pub fn label(mut self, label: impl Into<CompactString>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the glyph theme.
    #[must_use]
    pub const fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Sets the bar width in cells.
    ///
    /// Without this, the width is [`DEFAULT_WIDTH`], narrowed to fit the terminal.
    #[must_use]
    pub const fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Forces color on or off. By default color is on when the surface is a terminal and
    /// `NO_COLOR` is unset.
    #[must_use]
    pub const fn color(mut self, color: bool) -> Self {
        self.color = Some(color);
        self
    }

    /// Shows or hides the percentage.
    #[must_use]
    pub const fn show_percentage(mut self, show: bool) -> Self {
        self.show_percentage = show;
        self
    }

    /// Shows or hides the rate.
    #[must_use]
    pub const fn show_rate(mut self, show: bool) -> Self {
        self.show_rate = show;
        self
    }

    /// Shows or hides the ETA.
    #[must_use]
    pub const fn show_eta(mut self, show: bool) -> Self {
        self.show_eta = show;
        self
    }

    /// Sets the minimum time between throttled renders. Zero renders on every advance.
    #[must_use]
    pub const fn render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }

    /// Sets how long a computed rate is reused.
    #[must_use]
    pub const fn rate_cache_interval(mut self, interval: Duration) -> Self {
        self.rate_cache_interval = interval;
        self
    }

    /// Overrides interactivity detection.
    ///
    /// By default the bar is interactive when its [`Surface`] is a terminal; a
    /// [`Surface::Writer`] never is.
    #[must_use]
    pub const fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    /// Sets the output surface for the stock renderer.
    #[must_use]
    pub fn surface(mut self, surface: Surface) -> Self {
        self.surface = surface;
        self
    }

    /// Replaces the stock renderer with a custom strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: impl RenderStrategy + 'static) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    /// Consumes the builder and returns the bar, rejecting impossible settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an explicit width of zero.
    pub fn try_build(self) -> Result<ProgressBar> {
        if self.width == Some(0) {
            return Err(Error::InvalidConfig("bar width must be at least one cell"));
        }
        Ok(self.build())
    }

    /// Consumes the builder and returns the bar.
    ///
    /// A zero width is raised to one cell.
    #[must_use]
    pub fn build(self) -> ProgressBar {
        let on_terminal = self.surface.is_terminal();
        let interactive = self.interactive.unwrap_or(on_terminal);
        let tracker = Tracker::with_cache_interval(self.total, self.rate_cache_interval);

        let strategy = match self.strategy {
            Some(strategy) => strategy,
            None => {
                let width = self.width.unwrap_or_else(|| fitted_width(on_terminal));
                let color = self
                    .color
                    .unwrap_or_else(|| on_terminal && terminal::color_allowed());

                Box::new(
                    BarRenderer::new()
                        .with_theme(self.theme)
                        .with_width(width)
                        .with_color(color)
                        .with_percentage(self.show_percentage)
                        .with_rate(self.show_rate)
                        .with_eta(self.show_eta)
                        .with_label(self.label)
                        .with_surface(self.surface),
                )
            }
        };

        ProgressBar::from_parts(tracker, strategy, interactive, self.render_interval)
    }
}

/// Default width, narrowed so the whole line fits the terminal the bar draws on.
fn fitted_width(on_terminal: bool) -> usize {
    if !on_terminal {
        return DEFAULT_WIDTH;
    }
    terminal::width().map_or(DEFAULT_WIDTH, |cols| {
        usize::from(cols)
            .saturating_sub(RESERVED_COLUMNS)
            .clamp(1, DEFAULT_WIDTH)
    })
}
