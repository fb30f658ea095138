//! Unit theme derivation.
//!
//! Each unit picks a single brand color; the UI palette is derived from
//! it in HSL space and injected as CSS custom properties.

use serde::{Deserialize, Serialize};

use crate::error::{GymError, GymResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Hue in degrees `[0, 360)`, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Rgb {
    /// Parse `#RGB` or `#RRGGBB`; the leading `#` is optional.
    pub fn from_hex(input: &str) -> GymResult<Self> {
        let hex = input.trim().trim_start_matches('#');
        let invalid = || GymError::validation(format!("invalid hex color: {input}"));
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(invalid()),
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_hsl(self) -> Hsl {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let delta = max - min;

        if delta == 0.0 {
            return Hsl {
                h: 0.0,
                s: 0.0,
                l: l * 100.0,
            };
        }

        let s = if l > 0.5 {
            delta / (2.0 - max - min)
        } else {
            delta / (max + min)
        };

        let h = if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };

        Hsl {
            h: h * 60.0,
            s: s * 100.0,
            l: l * 100.0,
        }
    }
}

impl Hsl {
    pub fn to_rgb(self) -> Rgb {
        let h = self.h.rem_euclid(360.0) / 360.0;
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);

        let to_byte = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;

        if s == 0.0 {
            let v = to_byte(l);
            return Rgb { r: v, g: v, b: v };
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let hue_to_rgb = |mut t: f64| {
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
        };

        Rgb {
            r: to_byte(hue_to_rgb(h + 1.0 / 3.0)),
            g: to_byte(hue_to_rgb(h)),
            b: to_byte(hue_to_rgb(h - 1.0 / 3.0)),
        }
    }

    /// CSS custom-property form: `H S% L%` with whole numbers.
    pub fn css(self) -> String {
        format!(
            "{} {}% {}%",
            self.h.round() as i64,
            self.s.round() as i64,
            self.l.round() as i64
        )
    }
}

/// Foreground colors used on top of the primary color.
const LIGHT_FOREGROUND: Hsl = Hsl {
    h: 0.0,
    s: 0.0,
    l: 100.0,
};
const DARK_FOREGROUND: Hsl = Hsl {
    h: 222.0,
    s: 47.0,
    l: 11.0,
};

/// Palette derived from a unit's brand color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThemePalette {
    pub primary: Hsl,
    pub primary_foreground: Hsl,
    pub secondary: Hsl,
    pub accent: Hsl,
    pub ring: Hsl,
}

impl ThemePalette {
    pub fn derive(primary_hex: &str) -> GymResult<Self> {
        let primary = Rgb::from_hex(primary_hex)?.to_hsl();

        let primary_foreground = if primary.l <= 60.0 {
            LIGHT_FOREGROUND
        } else {
            DARK_FOREGROUND
        };

        Ok(Self {
            primary,
            primary_foreground,
            secondary: Hsl {
                h: primary.h,
                s: primary.s.min(30.0),
                l: 96.0,
            },
            accent: Hsl {
                h: primary.h,
                s: primary.s,
                l: 90.0,
            },
            ring: primary,
        })
    }

    /// `--name: H S% L%;` declarations, one per line.
    pub fn css_variables(&self) -> String {
        [
            ("primary", self.primary),
            ("primary-foreground", self.primary_foreground),
            ("secondary", self.secondary),
            ("accent", self.accent),
            ("ring", self.ring),
        ]
        .iter()
        .map(|(name, color)| format!("--{name}: {};", color.css()))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(
            Rgb::from_hex("#fff").unwrap(),
            Rgb {
                r: 255,
                g: 255,
                b: 255
            }
        );
        assert_eq!(
            Rgb::from_hex("2563EB").unwrap(),
            Rgb {
                r: 0x25,
                g: 0x63,
                b: 0xeb
            }
        );
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("#gggggg").is_err());
        assert!(Rgb::from_hex("").is_err());
    }

    #[test]
    fn primary_colors_to_hsl() {
        let red = Rgb::from_hex("#ff0000").unwrap().to_hsl();
        assert_eq!((red.h, red.s, red.l), (0.0, 100.0, 50.0));

        let green = Rgb::from_hex("#00ff00").unwrap().to_hsl();
        assert_eq!(green.h, 120.0);

        let blue = Rgb::from_hex("#0000ff").unwrap().to_hsl();
        assert_eq!(blue.h, 240.0);

        let gray = Rgb::from_hex("#808080").unwrap().to_hsl();
        assert_eq!(gray.s, 0.0);
    }

    #[test]
    fn hsl_round_trips_to_rgb() {
        for hex in ["#2563eb", "#16a34a", "#f97316", "#000000", "#ffffff", "#7c3aed"] {
            let rgb = Rgb::from_hex(hex).unwrap();
            assert_eq!(rgb.to_hsl().to_rgb(), rgb, "{hex}");
        }
    }

    #[test]
    fn palette_picks_contrasting_foreground() {
        let dark = ThemePalette::derive("#1e3a8a").unwrap();
        assert_eq!(dark.primary_foreground, LIGHT_FOREGROUND);

        let light = ThemePalette::derive("#fde68a").unwrap();
        assert_eq!(light.primary_foreground, DARK_FOREGROUND);
        assert_eq!(light.secondary.l, 96.0);
        assert!(light.secondary.s <= 30.0);
        assert_eq!(light.ring, light.primary);
    }

    #[test]
    fn css_variables_render() {
        let css = ThemePalette::derive("#ff0000").unwrap().css_variables();
        assert!(css.contains("--primary: 0 100% 50%;"));
        assert!(css.contains("--primary-foreground: 0 0% 100%;"));
        assert!(css.contains("--accent: 0 100% 90%;"));
        assert_eq!(css.lines().count(), 5);
    }
}
