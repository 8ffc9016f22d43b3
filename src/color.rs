//! Packed 32-bit ARGB colors and HSL conversion

use serde::{Deserialize, Serialize};

/// A color packed as `0xAARRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

/// Hue, saturation and lightness, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Color {
    pub const BLACK: Color = Color(0xff00_0000);
    pub const WHITE: Color = Color(0xffff_ffff);

    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_argb(0xff, r, g, b)
    }

    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Same RGB channels with a different alpha
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Color((alpha as u32) << 24 | (self.0 & 0x00ff_ffff))
    }

    pub fn to_hsl(self) -> Hsl {
        let r = self.r() as f64 / 255.0;
        let g = self.g() as f64 / 255.0;
        let b = self.b() as f64 / 255.0;

        let min = r.min(g).min(b);
        let max = r.max(g).max(b);
        let delta = max - min;
        let l = (max + min) * 0.5;

        let mut h = 0.0;
        let mut s = 0.0;

        if delta != 0.0 {
            s = if l >= 0.5 {
                delta / (2.0 - max - min)
            } else {
                delta / (max + min)
            };

            if r == max {
                h = (g - b) / delta;
            } else if g == max {
                h = 2.0 + (b - r) / delta;
            } else {
                h = 4.0 + (r - g) / delta;
            }
        }

        h /= 6.0;
        if h < 0.0 {
            h += 1.0;
        }

        Hsl { h, s, l }
    }

    /// Convert back from HSL, keeping the given alpha
    pub fn from_hsl(hsl: Hsl, alpha: u8) -> Self {
        let Hsl { h, s, l } = hsl;

        if s == 0.0 {
            let v = channel(l);
            return Self::from_argb(alpha, v, v, v);
        }

        let t2 = if l >= 0.5 { l + s - l * s } else { l * (1.0 + s) };
        let t1 = 2.0 * l - t2;

        Self::from_argb(
            alpha,
            channel(hue_to_rgb(h + 1.0 / 3.0, t1, t2)),
            channel(hue_to_rgb(h, t1, t2)),
            channel(hue_to_rgb(h - 1.0 / 3.0, t1, t2)),
        )
    }
}

fn channel(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

fn hue_to_rgb(h: f64, t1: f64, t2: f64) -> f64 {
    let h = if h < 0.0 {
        h + 1.0
    } else if h > 1.0 {
        h - 1.0
    } else {
        h
    };

    if 6.0 * h < 1.0 {
        t1 + (t2 - t1) * 6.0 * h
    } else if 2.0 * h < 1.0 {
        t2
    } else if 3.0 * h < 2.0 {
        t1 + (t2 - t1) * (4.0 - h * 6.0)
    } else {
        t1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_unpack() {
        let c = Color(0x80_12_34_56);
        assert_eq!((c.a(), c.r(), c.g(), c.b()), (0x80, 0x12, 0x34, 0x56));
        assert_eq!(Color::from_argb(0x80, 0x12, 0x34, 0x56), c);
    }

    #[test]
    fn with_alpha_replaces_only_alpha() {
        assert_eq!(Color(0x7fff_00ff).with_alpha(0xff), Color(0xffff_00ff));
    }

    #[test]
    fn pure_red_to_hsl() {
        let hsl = Color::from_rgb(255, 0, 0).to_hsl();
        assert_eq!(hsl, Hsl { h: 0.0, s: 1.0, l: 0.5 });
    }

    #[test]
    fn gray_has_no_saturation() {
        let hsl = Color::from_rgb(128, 128, 128).to_hsl();
        assert_eq!(hsl.s, 0.0);
        assert_eq!(Color::from_hsl(hsl, 0xff), Color::from_rgb(128, 128, 128));
    }

    #[test]
    fn hsl_round_trips_common_colors() {
        for c in [
            Color::from_rgb(255, 0, 0),
            Color::from_rgb(0, 255, 0),
            Color::from_rgb(0, 0, 255),
            Color::from_rgb(0, 63, 63),
            Color::from_rgb(255, 127, 63),
            Color::WHITE,
            Color::BLACK,
        ] {
            assert_eq!(Color::from_hsl(c.to_hsl(), c.a()), c, "{:#010x}", c.0);
        }
    }

    #[test]
    fn from_hsl_keeps_alpha() {
        let c = Color::from_hsl(Hsl { h: 0.5, s: 1.0, l: 0.25 }, 0x40);
        assert_eq!(c.a(), 0x40);
        assert_eq!((c.r(), c.g(), c.b()), (0, 128, 128));
    }

    #[test]
    fn lightness_extremes() {
        let hue = Color::from_rgb(0, 63, 63).to_hsl();
        assert_eq!(Color::from_hsl(Hsl { l: 1.0, ..hue }, 0xff), Color::WHITE);
        assert_eq!(Color::from_hsl(Hsl { l: 0.0, ..hue }, 0xff), Color::BLACK);
    }
}
