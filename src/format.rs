//! Human-readable units for durations, rates and colors.

use std::time::Duration;

/// Formats a duration the way the status line shows elapsed time and ETA.
///
/// * one hour or more: `"1h 5m"`
/// * one minute or more: `"3m 20s"`
/// * anything shorter: `"42s"`
///
/// Sub-second remainders are truncated.
#[must_use]
pub fn format_time(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

/// Formats a rate in updates per second, stepping through `K`, `M` and `G` at
/// each power of one thousand.
#[must_use]
pub fn format_rate(rate: f64) -> String {
    if rate >= 1e9 {
        format!("{:.1} G/s", rate / 1e9)
    } else if rate >= 1e6 {
        format!("{:.1} M/s", rate / 1e6)
    } else if rate >= 1e3 {
        format!("{:.1} K/s", rate / 1e3)
    } else {
        format!("{rate:.1} /s")
    }
}

/// An 8-bit-per-channel color.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

/// Converts a hue/saturation/value triple (each in `[0, 1]`) to [`Rgb`].
///
/// Inputs outside the unit range are clamped.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
#[must_use]
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb {
    let h = h.clamp(0.0, 1.0);
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);
    let channel = |x: f64| (255.0 * x) as u8;

    if s < 1e-6 {
        let grey = channel(v);
        return Rgb {
            r: grey,
            g: grey,
            b: grey,
        };
    }

    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = channel(v * (1.0 - s));
    let q = channel(v * (1.0 - s * f));
    let t = channel(v * (1.0 - s * (1.0 - f)));
    let v = channel(v);

    let (r, g, b) = match (sector as u8) % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb { r, g, b }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Rgb, format_rate, format_time, hsv_to_rgb};

    /// Time Units
    /// Each magnitude picks the coarsest pair of units.
    #[test]
    fn test_format_time() {
        assert_eq!(format_time(Duration::ZERO), "0s");
        assert_eq!(format_time(Duration::from_millis(999)), "0s");
        assert_eq!(format_time(Duration::from_secs(42)), "42s");
        assert_eq!(format_time(Duration::from_secs(200)), "3m 20s");
        assert_eq!(format_time(Duration::from_secs(3_900)), "1h 5m");
        assert_eq!(format_time(Duration::from_secs(90_000)), "25h 0m");
    }

    /// Rate Units
    /// Suffixes step at 1e3 / 1e6 / 1e9.
    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.0), "0.0 /s");
        assert_eq!(format_rate(999.0), "999.0 /s");
        assert_eq!(format_rate(1_500.0), "1.5 K/s");
        assert_eq!(format_rate(2_000_000.0), "2.0 M/s");
        assert_eq!(format_rate(3_300_000_000.0), "3.3 G/s");
    }

    /// Color Conversion
    /// Primary hues and the zero-saturation grey path.
    #[test]
    fn test_hsv_to_rgb() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(hsv_to_rgb(0.5, 1.0, 1.0), Rgb { r: 0, g: 255, b: 255 });
        assert_eq!(hsv_to_rgb(0.5, 0.0, 1.0), Rgb { r: 255, g: 255, b: 255 });
        assert_eq!(hsv_to_rgb(0.0, 0.0, 0.0), Rgb::default());
    }
}
