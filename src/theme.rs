//! Glyph tables for [`BarRenderer`](crate::render::BarRenderer).
//!
//! A theme supplies nine fill levels: index 0 is an empty cell, index 8 a full one, and
//! the seven in between draw the partially filled cell at the head of the bar.

/// The glyphs used to draw a bar.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Theme {
    /// Fill levels from empty (`0`) to full (`8`).
    pub blocks: [&'static str; 9],
    /// Printed after the closing bracket, before the counts.
    pub right_pad: &'static str,
    /// Printed before the first cell.
    pub left_bracket: &'static str,
    /// Printed after the last cell.
    pub right_bracket: &'static str,
}

impl Theme {
    /// The default theme.
    pub const UNICODE: Self = Self {
        blocks: [" ", ".", ":", "-", "=", "#", "#", "#", "#"],
        right_pad: "|",
        left_bracket: "",
        right_bracket: "",
    };

    /// Bracketed, dash-and-hash theme.
    pub const ASCII: Self = Self {
        blocks: [" ", "-", "-", "=", "=", "=", "#", "#", "#"],
        right_pad: "|",
        left_bracket: "[",
        right_bracket: "]",
    };

    /// Dots growing into circles.
    pub const CIRCLES: Self = Self {
        blocks: [" ", ".", "o", "o", "o", "o", "o", "o", "O"],
        right_pad: " ",
        left_bracket: "",
        right_bracket: "",
    };

    /// Sparse dotted theme.
    pub const BRAILLE: Self = Self {
        blocks: [" ", ".", ".", ":", ":", ":", "*", "*", "*"],
        right_pad: " ",
        left_bracket: "",
        right_bracket: "",
    };

    /// Returns the glyph for a fill level, clamping out-of-range levels.
    #[must_use]
    pub fn block(&self, level: usize) -> &'static str {
        self.blocks[level.min(8)]
    }

    /// Returns the glyph for a full cell.
    #[must_use]
    pub const fn full(&self) -> &'static str {
        self.blocks[8]
    }

    /// Returns the glyph for an empty cell.
    #[must_use]
    pub const fn empty(&self) -> &'static str {
        self.blocks[0]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::UNICODE
    }
}
