//! Software render surface.

use crate::colour::Rgb;

/// Soft halo drawn around filled circles while set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    pub colour: Rgb,
    pub blur: f64,
}

/// RGBA pixel buffer with the handful of primitives the simulations need:
/// rectangle fill, filled circles, line strokes, glow and full clear.
///
/// A zero-sized pixmap is "detached": every primitive is a no-op.
#[derive(Clone, Debug)]
pub struct Pixmap {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
    shadow: Option<Shadow>,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 255]; width as usize * height as usize],
            shadow: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_detached(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Reallocate for a new size; contents are cleared to black
    pub fn set_size(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![[0, 0, 0, 255]; width as usize * height as usize];
    }

    /// Raw RGBA bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let [r, g, b, _] = self.pixels[(y * self.width + x) as usize];
        Some(Rgb::new(r, g, b))
    }

    pub fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.shadow = shadow;
    }

    pub fn clear(&mut self, colour: Rgb) {
        self.pixels.fill([colour.r, colour.g, colour.b, 255]);
    }

    /// Fill the axis-aligned rectangle, clipped to the surface
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, colour: Rgb) {
        if self.is_detached() || !(w > 0.0 && h > 0.0) {
            return;
        }
        let x0 = x.floor().max(0.0) as u32;
        let y0 = y.floor().max(0.0) as u32;
        let x1 = ((x + w).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((y + h).ceil().max(0.0) as u32).min(self.height);
        let px = [colour.r, colour.g, colour.b, 255];
        for row in y0..y1 {
            let start = (row * self.width) as usize;
            for col in x0..x1 {
                self.pixels[start + col as usize] = px;
            }
        }
    }

    /// Fill a disc, with the current shadow drawn beneath it
    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, colour: Rgb) {
        if self.is_detached() || !(radius > 0.0) || !cx.is_finite() || !cy.is_finite() {
            return;
        }

        let blur = self.shadow.map_or(0.0, |s| s.blur.max(0.0));
        let reach = radius + blur;
        let (x0, x1) = self.span(cx - reach, cx + reach, self.width);
        let (y0, y1) = self.span(cy - reach, cy + reach, self.height);

        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist <= radius {
                    self.blend(px, py, colour, 1.0);
                } else if let Some(shadow) = self.shadow {
                    if blur > 0.0 && dist < reach {
                        let falloff = 1.0 - (dist - radius) / blur;
                        self.blend(px, py, shadow.colour, (falloff * falloff * 0.6) as f32);
                    }
                }
            }
        }
    }

    /// Stroke a line segment of the given width
    pub fn stroke_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, colour: Rgb) {
        if self.is_detached() || ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return;
        }
        let half = (width / 2.0).max(0.5);
        let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        let steps = (length / 0.5).ceil().max(1.0) as usize;

        let saved = self.shadow.take();
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            self.fill_circle(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, half, colour);
        }
        self.shadow = saved;
    }

    /// Alpha-blend `colour` over pixel (x, y)
    pub fn blend(&mut self, x: u32, y: u32, colour: Rgb, alpha: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) as usize;
        let [r, g, b, a] = self.pixels[idx];
        let mixed = Rgb::new(r, g, b).mix(colour, alpha);
        self.pixels[idx] = [mixed.r, mixed.g, mixed.b, a];
    }

    fn span(&self, lo: f64, hi: f64, limit: u32) -> (u32, u32) {
        let start = lo.floor().max(0.0) as u32;
        let end = (hi.ceil().max(0.0) as u32).min(limit);
        (start.min(end), end)
    }
}
