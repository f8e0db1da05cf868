//! Frame-rate measurement and the per-tick status line.

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use crate::mode::Mode;

/// Below this the overlay shows a warning.
pub const LOW_FPS_THRESHOLD: f32 = 25.0;

/// Moving-average FPS over the last `buffer_len` tick intervals.
#[derive(Debug)]
pub struct FpsMeter {
    last:       Option<Instant>,
    intervals:  VecDeque<f32>,
    buffer_len: usize,
}

impl FpsMeter {
    pub fn new(buffer_len: usize) -> Self {
        FpsMeter {
            last:       None,
            intervals:  VecDeque::with_capacity(buffer_len.max(1)),
            buffer_len: buffer_len.max(1),
        }
    }

    /// Register a tick at `now` and return the current estimate (0 until
    /// two ticks have been seen).
    pub fn tick(&mut self, now: Instant) -> f32 {
        if let Some(last) = self.last {
            let secs = now.saturating_duration_since(last).as_secs_f32();
            if self.intervals.len() == self.buffer_len {
                self.intervals.pop_front();
            }
            self.intervals.push_back(secs);
        }
        self.last = Some(now);
        self.fps()
    }

    pub fn fps(&self) -> f32 {
        if self.intervals.is_empty() {
            return 0.0;
        }
        let mean = self.intervals.iter().sum::<f32>() / self.intervals.len() as f32;
        if mean <= f32::EPSILON { 0.0 } else { 1.0 / mean }
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        FpsMeter::new(10)
    }
}

/// What the overlay prints in its status area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusLine {
    pub active:  bool,
    pub mode:    Mode,
    pub fps:     f32,
}

impl StatusLine {
    pub fn new(active: bool, mode: Mode, fps: f32) -> Self {
        StatusLine { active, mode, fps }
    }

    /// Degraded, not fatal.  Not raised before a rate has been measured.
    pub fn low_fps(&self) -> bool {
        self.fps > 0.0 && self.fps < LOW_FPS_THRESHOLD
    }

    pub fn headline(&self) -> String {
        if self.active {
            format!("Active ({})", self.mode)
        } else {
            "INACTIVE".to_string()
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  FPS: {:.1}", self.headline(), self.fps)?;
        if self.low_fps() {
            f.write_str("  LOW FPS WARNING")?;
        }
        Ok(())
    }
}
