//! Colours and the four-corner colour field.
//!
//! Every simulation colours its cells and agents by sampling a [`ColourField`]:
//! each surface corner carries a hue that rotates with its own period, and a
//! point's hue is the bilinear blend of the four corner hues. Hues are blended
//! as unit vectors on the colour wheel so that 350° and 10° meet at 0° rather
//! than sweeping back through 180°.

use std::f64::consts::TAU;

/// 8-bit sRGB colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Multiply every channel by `factor`, saturating at 255
    pub fn scale(self, factor: f32) -> Self {
        let f = factor.max(0.0);
        let ch = |c: u8| (c as f32 * f).round().min(255.0) as u8;
        Self::new(ch(self.r), ch(self.g), ch(self.b))
    }

    /// Linear blend towards `other` by `t` in [0, 1]
    pub fn mix(self, other: Rgb, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::new(ch(self.r, other.r), ch(self.g, other.g), ch(self.b, other.b))
    }

    /// Parse `#rgb` or `#rrggbb`
    pub fn parse(text: &str) -> Option<Self> {
        let hex = text.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
                Some(Self::new(digit(0)?, digit(1)?, digit(2)?))
            }
            6 => {
                let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Self::new(pair(0)?, pair(2)?, pair(4)?))
            }
            _ => None,
        }
    }

    /// Parse, falling back to `fallback` on malformed input
    pub fn parse_or(text: &str, fallback: Rgb) -> Self {
        Self::parse(text).unwrap_or_else(|| {
            log::warn!("Malformed colour {:?}, using {:?}", text, fallback);
            fallback
        })
    }
}

/// Convert HSL (hue in degrees, saturation and lightness in [0, 1]) to RGB
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let h = hue.rem_euclid(360.0) / 360.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return Rgb::new(v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let channel = |mut t: f64| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgb::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

/// One corner of the field: a start hue that completes a full turn every
/// `period_ms` milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    pub start_hue: f64,
    pub period_ms: f64,
}

impl Corner {
    pub const fn new(start_hue: f64, period_ms: f64) -> Self {
        Self {
            start_hue,
            period_ms,
        }
    }

    /// Hue in [0, 360) after `elapsed_ms`; the start hue when time is `None`
    /// or the period is unusable
    pub fn hue_at(&self, elapsed_ms: Option<f64>) -> f64 {
        match elapsed_ms {
            Some(t) if self.period_ms > 0.0 && t.is_finite() => {
                (self.start_hue + (t / self.period_ms) * 360.0).rem_euclid(360.0)
            }
            _ => self.start_hue.rem_euclid(360.0),
        }
    }

    fn vector_at(&self, elapsed_ms: Option<f64>) -> (f64, f64) {
        let rad = self.hue_at(elapsed_ms).to_radians();
        (rad.cos(), rad.sin())
    }
}

/// Spatial and temporal colour generator driven by four rotating corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColourField {
    pub top_left: Corner,
    pub top_right: Corner,
    pub bottom_left: Corner,
    pub bottom_right: Corner,
}

impl Default for ColourField {
    fn default() -> Self {
        Self {
            top_left: Corner::new(0.0, 20_000.0),
            top_right: Corner::new(90.0, 27_000.0),
            bottom_left: Corner::new(200.0, 33_000.0),
            bottom_right: Corner::new(300.0, 41_000.0),
        }
    }
}

impl ColourField {
    /// Blended hue at normalised position (u, v) in [0, 1]²
    pub fn hue_at(&self, u: f64, v: f64, elapsed_ms: Option<f64>) -> f64 {
        let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.0 };
        let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };

        let lerp = |a: (f64, f64), b: (f64, f64), t: f64| {
            (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
        };

        let top = lerp(
            self.top_left.vector_at(elapsed_ms),
            self.top_right.vector_at(elapsed_ms),
            u,
        );
        let bottom = lerp(
            self.bottom_left.vector_at(elapsed_ms),
            self.bottom_right.vector_at(elapsed_ms),
            u,
        );
        let (x, y) = lerp(top, bottom, v);

        y.atan2(x).rem_euclid(TAU).to_degrees().rem_euclid(360.0)
    }

    /// Colour at pixel (x, y) on a `width` × `height` surface
    pub fn colour_at(
        &self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        saturation: f64,
        lightness: f64,
        elapsed_ms: Option<f64>,
    ) -> Rgb {
        let u = if width > 0.0 { x / width } else { 0.0 };
        let v = if height > 0.0 { y / height } else { 0.0 };
        hsl_to_rgb(self.hue_at(u, v, elapsed_ms), saturation, lightness)
    }
}

/// Per-cell colours for one grid layout and one time bucket.
#[derive(Clone, Debug, Default)]
pub struct ColourCache {
    rows: usize,
    cols: usize,
    stamp: Option<i64>,
    colours: Vec<Rgb>,
}

impl ColourCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached colour
    pub fn invalidate(&mut self) {
        self.stamp = None;
        self.colours.clear();
    }

    pub fn is_valid(&self) -> bool {
        self.stamp.is_some()
    }

    /// Cached colours for `rows` × `cols`, refilled when the layout or the
    /// stamp changes
    pub fn colours(
        &mut self,
        rows: usize,
        cols: usize,
        stamp: i64,
        mut fill: impl FnMut(usize, usize) -> Rgb,
    ) -> &[Rgb] {
        if self.stamp != Some(stamp) || self.rows != rows || self.cols != cols {
            self.rows = rows;
            self.cols = cols;
            self.colours.clear();
            self.colours.reserve(rows * cols);
            for row in 0..rows {
                for col in 0..cols {
                    self.colours.push(fill(row, col));
                }
            }
            self.stamp = Some(stamp);
        }
        &self.colours
    }
}
