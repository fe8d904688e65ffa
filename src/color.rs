//! Deterministic pastel palettes keyed by ticker symbol.
//!
//! The hash mirrors the classic `hash = c + ((hash << 5) - hash)` string hash
//! evaluated with 32-bit wrapping shifts over UTF-16 code units, so a symbol
//! maps to the same hue here as it does in a browser. No attempt is made to
//! keep distinct symbols apart; collisions are rare enough for a dozen cards.

use std::fmt;

use ratatui::style::Color;

use crate::models::Theme;

/// A color in HSL space. Saturation and lightness are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl Hsl {
    pub const fn new(hue: u16, saturation: u8, lightness: u8) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    /// Convert to 8-bit RGB channels.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let h = f64::from(self.hue % 360) / 360.0;
        let s = f64::from(self.saturation.min(100)) / 100.0;
        let l = f64::from(self.lightness.min(100)) / 100.0;

        if s == 0.0 {
            let v = channel(l);
            return (v, v, v);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            channel(hue_to_rgb(p, q, h)),
            channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
        )
    }
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn channel(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

impl From<Hsl> for Color {
    fn from(hsl: Hsl) -> Self {
        let (r, g, b) = hsl.to_rgb();
        Color::Rgb(r, g, b)
    }
}

/// Raw string hash. Intermediate values can leave the 32-bit range between
/// iterations; only the shift operand is truncated.
fn string_hash(input: &str) -> i64 {
    input.encode_utf16().fold(0i64, |hash, unit| {
        let shifted = (hash as i32).wrapping_shl(5);
        i64::from(unit)
            .wrapping_add(i64::from(shifted))
            .wrapping_sub(hash)
    })
}

/// Hue in `[0, 360)` derived from `input`.
pub fn hue_for(input: &str) -> u16 {
    (string_hash(input).unsigned_abs() % 360) as u16
}

/// Pastel card background for the light theme.
pub fn string_to_color(input: &str) -> Hsl {
    Hsl::new(hue_for(input), 70, 85)
}

/// Card background for the dark theme.
pub fn string_to_dark_color(input: &str) -> Hsl {
    Hsl::new(hue_for(input), 60, 25)
}

/// Text color contrasting with [`string_to_color`].
pub fn string_to_text_color(input: &str) -> Hsl {
    Hsl::new(hue_for(input), 80, 30)
}

/// Text color contrasting with [`string_to_dark_color`].
pub fn string_to_dark_text_color(input: &str) -> Hsl {
    Hsl::new(hue_for(input), 80, 80)
}

/// Background/foreground pair used for a card's symbol badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardPalette {
    pub background: Hsl,
    pub text: Hsl,
}

pub fn card_palette(symbol: &str, theme: Theme) -> CardPalette {
    match theme {
        Theme::Light => CardPalette {
            background: string_to_color(symbol),
            text: string_to_text_color(symbol),
        },
        Theme::Dark => CardPalette {
            background: string_to_dark_color(symbol),
            text: string_to_dark_text_color(symbol),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_same_color() {
        assert_eq!(string_to_color("BTC"), string_to_color("BTC"));
        assert_eq!(string_to_text_color("ETH"), string_to_text_color("ETH"));
    }

    #[test]
    fn different_inputs_usually_differ() {
        assert_ne!(string_to_color("BTC"), string_to_color("ETH"));
        assert_ne!(string_to_text_color("BTC"), string_to_text_color("ETH"));
        assert_ne!(string_to_color("SOL"), string_to_color("ADA"));
    }

    #[test]
    fn hues_match_the_browser_hash() {
        assert_eq!(hue_for(""), 0);
        assert_eq!(hue_for("A"), 65);
        assert_eq!(hue_for("BTC"), 217);
        assert_eq!(hue_for("ETH"), 225);
        assert_eq!(hue_for("SOL"), 208);
        assert_eq!(hue_for("ADA"), 198);
        // Exercises the 32-bit wrap of the shift.
        assert_eq!(hue_for("Bitcoin"), 98);
        assert_eq!(hue_for("a much longer symbol string to overflow"), 5);
    }

    #[test]
    fn palettes_use_fixed_saturation_and_lightness() {
        assert_eq!(string_to_color("BTC").to_string(), "hsl(217, 70%, 85%)");
        assert_eq!(string_to_dark_color("BTC").to_string(), "hsl(217, 60%, 25%)");
        assert_eq!(string_to_text_color("BTC").to_string(), "hsl(217, 80%, 30%)");
        assert_eq!(string_to_dark_text_color("BTC").to_string(), "hsl(217, 80%, 80%)");
    }

    #[test]
    fn card_palette_follows_theme() {
        let light = card_palette("ETH", Theme::Light);
        assert_eq!(light.background, string_to_color("ETH"));
        let dark = card_palette("ETH", Theme::Dark);
        assert_eq!(dark.text, string_to_dark_text_color("ETH"));
    }

    #[test]
    fn hsl_converts_to_rgb() {
        assert_eq!(Hsl::new(0, 100, 50).to_rgb(), (255, 0, 0));
        assert_eq!(Hsl::new(120, 100, 50).to_rgb(), (0, 255, 0));
        assert_eq!(Hsl::new(240, 100, 25).to_rgb(), (0, 0, 128));
        assert_eq!(Hsl::new(42, 0, 100).to_rgb(), (255, 255, 255));
        assert_eq!(Color::from(Hsl::new(0, 0, 0)), Color::Rgb(0, 0, 0));
    }
}
