//! Software-rendered overlay window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  status: Active (Volume)  FPS: 29.8           │
//! │  ┌─┐                                          │
//! │  │ │ volume bar       camera frame            │
//! │  │█│                  + hand skeleton         │
//! │  └─┘ 42%              + gesture feedback      │
//! │  legend (simulation only)                     │
//! └───────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::{anyhow, Result};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use gesture_core::classifier::SwipeDirection;
use gesture_core::dispatch::VolumeReadout;
use gesture_core::engine::{ModeEffect, TickReport};
use gesture_core::frame::Frame;
use gesture_core::landmarks::{Detection, PixelPoint, HAND_CONNECTIONS};
use gesture_core::mode::Mode;
use gesture_core::status::StatusLine;

use crate::sim::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Colours
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:     u32 = 0xFF10101A;
const TEXT_BG:      u32 = 0xFF0F3460;
const BONE_COLOR:   u32 = 0xFFEEEEEE;
const JOINT_COLOR:  u32 = 0xFFFF3355;
const ACTIVE_COLOR: u32 = 0xFF33DD55;
const ALERT_COLOR:  u32 = 0xFFFF3333;
const SCROLL_COLOR: u32 = 0xFF3388FF;
const LEGEND_COLOR: u32 = 0xFF888888;

/// Darkening applied to the camera image while detection is off.
const INACTIVE_DIM: f32 = 0.35;
const TEXT_SCALE:   usize = 2;

/// Everything one frame of the overlay shows.
pub struct OverlayView<'a> {
    pub frame:     Option<&'a Frame>,
    pub detection: Option<&'a Detection>,
    pub report:    Option<&'a TickReport>,
    pub status:    StatusLine,
    /// Fade-in opacity of the camera image, `[0, 1]`.
    pub alpha:     f32,
    pub feedback:  bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay
// ════════════════════════════════════════════════════════════════════════════

pub struct Overlay {
    window:  Window,
    buf:     Vec<u32>,
    width:   usize,
    height:  usize,
    sim_tx:  Option<Sender<SimInput>>,
    pinched: bool,
}

impl Overlay {
    /// `sim_tx` receives mouse/keyboard input for the simulated hand; pass
    /// `None` with a real camera.
    pub fn new(width: usize, height: usize, sim_tx: Option<Sender<SimInput>>) -> Result<Self> {
        let mut window = Window::new(
            "Gesture Control",
            width,
            height,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )
        .map_err(|e| anyhow!("open overlay window: {e}"))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Overlay {
            window,
            buf: vec![BG_COLOR; width * height],
            width,
            height,
            sim_tx,
            pinched: false,
        })
    }

    /// False once the window is closed or Escape is pressed.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() || self.window.is_key_down(Key::Escape) {
            return false;
        }
        let Some(tx) = self.sim_tx.as_ref() else {
            return true;
        };

        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            let _ = tx.send(SimInput::Pointer(mx / self.width as f32, my / self.height as f32));
        }
        let down = self.window.get_mouse_down(MouseButton::Left);
        if down != self.pinched {
            self.pinched = down;
            let _ = tx.send(SimInput::Pinch(down));
        }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        for (key, sim) in [
            (Key::Key1, SimKey::CursorPose),
            (Key::Key2, SimKey::ScrollPose),
            (Key::Key3, SimKey::VolumePose),
            (Key::Key4, SimKey::Fist),
            (Key::Key5, SimKey::OpenHand),
            (Key::H,    SimKey::ToggleHand),
        ] {
            if one_shot(key) {
                let _ = tx.send(SimInput::KeyDown(sim));
            }
        }
        if held(Key::Up) {
            let _ = tx.send(SimInput::KeyDown(SimKey::LiftUp));
        }
        if held(Key::Down) {
            let _ = tx.send(SimInput::KeyDown(SimKey::LiftDown));
        }
        true
    }

    /// Render one frame.
    pub fn render(&mut self, view: &OverlayView<'_>) {
        self.buf.fill(BG_COLOR);

        // ── Camera image ──────────────────────────────────────────────────
        if let Some(frame) = view.frame {
            let alpha = if view.status.active { view.alpha } else { view.alpha * INACTIVE_DIM };
            self.blit(frame, alpha);
        }

        // ── Hand + feedback ───────────────────────────────────────────────
        if view.status.active {
            if let Some(det) = view.detection {
                self.draw_hand(det);
            }
            if let (true, Some(report)) = (view.feedback, view.report) {
                self.draw_feedback(report, view.detection.map(|d| d.frame_size));
            }
        }

        // ── Status bar ────────────────────────────────────────────────────
        let color = if view.status.active { ACTIVE_COLOR } else { ALERT_COLOR };
        self.fill_rect(0, 0, self.width, 24, TEXT_BG);
        let headline = view.status.headline();
        self.draw_label(&headline, 8, 7, color);
        let fps = format!("FPS: {:.1}", view.status.fps);
        let fx = 8 + (headline.len() + 2) * 4 * TEXT_SCALE;
        self.draw_label(&fps, fx, 7, BONE_COLOR);
        if view.status.low_fps() {
            let wx = fx + (fps.len() + 2) * 4 * TEXT_SCALE;
            self.draw_label("LOW FPS WARNING", wx, 7, ALERT_COLOR);
        }

        // ── Key legend ────────────────────────────────────────────────────
        if self.sim_tx.is_some() {
            self.draw_label_scaled(
                "mouse=move  click=pinch  1=cursor 2=scroll 3=volume 4=fist 5=open  up/down=lift  h=hide  esc=quit",
                8, self.height.saturating_sub(10), LEGEND_COLOR, 1,
            );
        }

        self.window.update_with_buffer(&self.buf, self.width, self.height).ok();
    }

    // ── Camera image ──────────────────────────────────────────────────────

    /// Nearest-neighbour scale of `frame` onto the whole window.
    fn blit(&mut self, frame: &Frame, alpha: f32) {
        if frame.is_empty() {
            return;
        }
        for y in 0..self.height {
            let sy = y * frame.height / self.height;
            for x in 0..self.width {
                let sx = x * frame.width / self.width;
                if let Some([r, g, b]) = frame.rgb_at(sx, sy) {
                    let px = 0xFF000000 | (r as u32) << 16 | (g as u32) << 8 | b as u32;
                    self.buf[y * self.width + x] = blend(BG_COLOR, px, alpha);
                }
            }
        }
    }

    // ── Hand skeleton ─────────────────────────────────────────────────────

    fn draw_hand(&mut self, det: &Detection) {
        let Some(hand) = det.hand.as_ref() else { return };
        let pts: Vec<(isize, isize)> = hand
            .points()
            .iter()
            .map(|p| ((p.x * self.width as f32) as isize, (p.y * self.height as f32) as isize))
            .collect();
        for &(a, b) in HAND_CONNECTIONS.iter() {
            self.draw_line(pts[a], pts[b], BONE_COLOR, 1);
        }
        for &p in &pts {
            self.fill_circle(p, 3, JOINT_COLOR);
        }
    }

    // ── Gesture feedback ──────────────────────────────────────────────────

    fn draw_feedback(&mut self, report: &TickReport, frame_size: Option<(usize, usize)>) {
        let Some(geom) = report.geometry else { return };
        let (fw, fh) = frame_size.unwrap_or((self.width, self.height));
        let to_win = |p: PixelPoint| -> (isize, isize) {
            (
                p.x as isize * self.width as isize / fw.max(1) as isize,
                p.y as isize * self.height as isize / fh.max(1) as isize,
            )
        };
        let thumb = to_win(geom.thumb_tip);
        let index = to_win(geom.index_tip);
        let middle = to_win(geom.middle_tip);

        match report.mode {
            Mode::Volume => {
                self.fill_circle(thumb, 10, ACTIVE_COLOR);
                self.fill_circle(index, 10, ACTIVE_COLOR);
                self.draw_line(thumb, index, ACTIVE_COLOR, 3);
            }
            Mode::Scroll => {
                self.fill_circle(index, 10, SCROLL_COLOR);
                self.fill_circle(middle, 10, SCROLL_COLOR);
                self.draw_line(index, middle, SCROLL_COLOR, 3);
            }
            Mode::Cursor | Mode::Neutral => {}
        }

        if let ModeEffect::Volume(readout) = report.effect {
            self.draw_volume_bar(&readout);
        }

        if report.pinch.is_some() {
            self.fill_circle(index, 10, ALERT_COLOR);
            self.draw_label("PINCH DETECTED", 50, 150, ALERT_COLOR);
        }
        if let Some((dir, _)) = report.swipe {
            let text = match dir {
                SwipeDirection::Left  => "SWIPE LEFT",
                SwipeDirection::Right => "SWIPE RIGHT",
            };
            self.draw_label(text, 50, 120, ALERT_COLOR);
        }
    }

    fn draw_volume_bar(&mut self, readout: &VolumeReadout) {
        const X: usize = 50;
        const W: usize = 35;
        let (top, bottom) = (150usize.min(self.height), 400usize.min(self.height));
        let span = bottom.saturating_sub(top);
        let filled = (span as f32 * readout.percent.clamp(0.0, 100.0) / 100.0) as usize;
        self.fill_rect(X, bottom - filled, W, filled, ACTIVE_COLOR);
        self.draw_border(X, top, W, span, ACTIVE_COLOR);
        let label = format!("{}%", readout.percent as u32);
        self.draw_label(&label, X - 10, bottom + 12, ACTIVE_COLOR);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 {
            return;
        }
        for col in x..(x + w).min(self.width) {
            self.set_pixel(col as isize, y as isize, color);
            self.set_pixel(col as isize, (y + h - 1) as isize, color);
        }
        for row in y..(y + h).min(self.height) {
            self.set_pixel(x as isize, row as isize, color);
            self.set_pixel((x + w - 1) as isize, row as isize, color);
        }
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    fn fill_circle(&mut self, (cx, cy): (isize, isize), r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Bresenham, `thickness` pixels square brush.
    fn draw_line(&mut self, (x0, y0): (isize, isize), (x1, y1): (isize, isize), color: u32, thickness: isize) {
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        let half = thickness / 2;
        loop {
            for oy in -half..=half {
                for ox in -half..=half {
                    self.set_pixel(x + ox, y + oy, color);
                }
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        self.draw_label_scaled(text, x, y, color, TEXT_SCALE);
    }

    /// 3×5 bitmap font, each dot drawn as a `scale × scale` block.
    fn draw_label_scaled(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let mut cx = x;
        for ch in text.chars() {
            for (row, &bits) in char_glyph(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
            if cx + 4 * scale > self.width { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colours. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t) as u32;
    let ch = |c: u32, s: u32| (c >> s) & 0xFF;
    0xFF000000
        | lerp(ch(a, 16), ch(b, 16)) << 16
        | lerp(ch(a, 8), ch(b, 8)) << 8
        | lerp(ch(a, 0), ch(b, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
        assert_eq!(blend(0xFF000000, 0xFF0000FF, 2.0), 0xFF0000FF);
    }

    #[test]
    fn status_text_has_glyphs() {
        let fallback = char_glyph('~');
        for c in "Active (Volume) INACTIVE FPS: 29.8 LOW FPS WARNING 42% PINCH DETECTED SWIPE LEFT".chars() {
            if c != ' ' {
                assert_ne!(char_glyph(c), fallback, "missing glyph {:?}", c);
            }
        }
    }
}
