//! # Pixel Frame
//!
//! A fixed-size RGB buffer. Every drawing call clips to the frame, so renderers
//! can place text at negative or overflowing offsets while scrolling.

/// One pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Unlit.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    /// Builds a colour from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Each channel multiplied by `scale` (clamped to `[0, 1]`) and truncated.
    pub fn scaled(self, scale: f64) -> Self {
        let s = scale.clamp(0.0, 1.0);
        let ch = |v: u8| (f64::from(v) * s) as u8;
        Self::new(ch(self.r), ch(self.g), ch(self.b))
    }

    /// True for any non-black pixel.
    pub fn is_lit(self) -> bool {
        self != Self::BLACK
    }
}

/// # Frame
///
/// Row-major pixels, `width * height` long. Dimensions never change after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Frame {
    /// All-black frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, pixels: vec![Rgb::BLACK; (width as usize) * (height as usize)] }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sets every pixel to black.
    pub fn clear(&mut self) {
        self.pixels.fill(Rgb::BLACK);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Pixel at `(x, y)`, `None` outside the frame.
    pub fn get(&self, x: i32, y: i32) -> Option<Rgb> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Sets one pixel; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Fills a clipped rectangle.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
        for yy in y.max(0)..(y + h).min(self.height as i32) {
            for xx in x.max(0)..(x + w).min(self.width as i32) {
                self.set(xx, yy, color);
            }
        }
    }

    /// Multiplies every pixel by `scale`. Values at or above 0.999 are a no-op.
    pub fn apply_brightness(&mut self, scale: f64) {
        if scale >= 0.999 {
            return;
        }
        for p in &mut self.pixels {
            *p = p.scaled(scale);
        }
    }

    /// Number of non-black pixels in the rectangle.
    pub fn lit_in(&self, x: i32, y: i32, w: i32, h: i32) -> usize {
        let mut n = 0;
        for yy in y..y + h {
            for xx in x..x + w {
                if self.get(xx, yy).is_some_and(Rgb::is_lit) {
                    n += 1;
                }
            }
        }
        n
    }

    /// Number of non-black pixels.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| p.is_lit()).count()
    }

    /// True when any pixel has exactly `color`.
    pub fn contains_color(&self, color: Rgb) -> bool {
        self.pixels.contains(&color)
    }

    /// Packed `RGBRGB...` bytes, row-major.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for p in &self.pixels {
            out.extend_from_slice(&[p.r, p.g, p.b]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_outside_are_clipped() {
        let mut f = Frame::new(4, 2);
        f.set(-1, 0, Rgb::new(1, 1, 1));
        f.set(4, 1, Rgb::new(1, 1, 1));
        f.fill_rect(-2, -2, 3, 3, Rgb::new(9, 9, 9));
        assert_eq!(f.lit_count(), 1);
        assert_eq!(f.get(0, 0), Some(Rgb::new(9, 9, 9)));
        assert_eq!(f.get(5, 0), None);
    }

    #[test]
    fn brightness_scales_channels() {
        let mut f = Frame::new(1, 1);
        f.set(0, 0, Rgb::new(200, 100, 0));
        f.apply_brightness(0.5);
        assert_eq!(f.get(0, 0), Some(Rgb::new(100, 50, 0)));
        assert_eq!(f.to_rgb_bytes(), vec![100, 50, 0]);
    }
}
