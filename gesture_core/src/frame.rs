//! Captured camera frames.

use std::time::Instant;

/// Byte order of the three colour channels in [`Frame::pixels`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelOrder {
    Rgb,
    /// Native order of most capture APIs (and of the synthetic camera).
    Bgr,
}

/// A timestamped, tightly packed 3-channel image.
///
/// Frames are mirrored once, at capture time, so that moving the hand to the
/// right moves it to the right on screen.  After publication a frame is only
/// ever shared behind an `Arc` and never mutated again.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width:       usize,
    pub height:      usize,
    pub order:       PixelOrder,
    pub pixels:      Vec<u8>,
    pub captured_at: Instant,
}

impl Frame {
    /// Wrap a raw buffer.  `pixels` must hold `width * height * 3` bytes;
    /// a short buffer is zero-padded, a long one truncated.
    pub fn new(width: usize, height: usize, order: PixelOrder, mut pixels: Vec<u8>) -> Self {
        pixels.resize(width * height * 3, 0);
        Frame { width, height, order, pixels, captured_at: Instant::now() }
    }

    /// Solid-colour frame, mostly useful for tests and the simulator.
    pub fn filled(width: usize, height: usize, order: PixelOrder, rgb: [u8; 3]) -> Self {
        let px = match order {
            PixelOrder::Rgb => rgb,
            PixelOrder::Bgr => [rgb[2], rgb[1], rgb[0]],
        };
        let pixels = px.iter().copied().cycle().take(width * height * 3).collect();
        Frame::new(width, height, order, pixels)
    }

    /// Flip left/right in place.
    pub fn mirror_horizontal(&mut self) {
        let stride = self.width * 3;
        for row in self.pixels.chunks_exact_mut(stride) {
            let (mut l, mut r) = (0usize, self.width.saturating_sub(1));
            while l < r {
                for c in 0..3 {
                    row.swap(l * 3 + c, r * 3 + c);
                }
                l += 1;
                r -= 1;
            }
        }
    }

    /// Pixel at `(x, y)` as `[r, g, b]`, or `None` when out of bounds.
    pub fn rgb_at(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 3;
        let p = &self.pixels[i..i + 3];
        Some(match self.order {
            PixelOrder::Rgb => [p[0], p[1], p[2]],
            PixelOrder::Bgr => [p[2], p[1], p[0]],
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> Frame {
        // 3×1, RGB: red, green, blue
        Frame::new(3, 1, PixelOrder::Rgb, vec![255, 0, 0, 0, 255, 0, 0, 0, 255])
    }

    #[test]
    fn mirror_reverses_each_row() {
        let mut f = strip();
        f.mirror_horizontal();
        assert_eq!(f.rgb_at(0, 0), Some([0, 0, 255]));
        assert_eq!(f.rgb_at(1, 0), Some([0, 255, 0]));
        assert_eq!(f.rgb_at(2, 0), Some([255, 0, 0]));
    }

    #[test]
    fn mirror_twice_is_identity() {
        let f = strip();
        let mut back = f.clone();
        back.mirror_horizontal();
        back.mirror_horizontal();
        assert_eq!(back.pixels, f.pixels);
    }

    #[test]
    fn bgr_pixels_read_as_rgb() {
        let f = Frame::filled(2, 2, PixelOrder::Bgr, [10, 20, 30]);
        assert_eq!(&f.pixels[0..3], &[30, 20, 10]);
        assert_eq!(f.rgb_at(1, 1), Some([10, 20, 30]));
    }

    #[test]
    fn short_buffer_is_padded() {
        let f = Frame::new(4, 4, PixelOrder::Rgb, vec![1, 2, 3]);
        assert_eq!(f.pixels.len(), 48);
        assert_eq!(f.rgb_at(3, 3), Some([0, 0, 0]));
        assert_eq!(f.rgb_at(4, 0), None);
    }
}
