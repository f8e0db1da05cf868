//! Cross-thread application flags and the activation toggle.
//!
//! `running` and `detection_active` are the only state shared between the
//! capture, inference, control and hotkey contexts besides the two slots.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared run/stop and on/off flags.
#[derive(Debug)]
pub struct SharedState {
    running:          AtomicBool,
    detection_active: AtomicBool,
}

impl Default for SharedState {
    fn default() -> Self {
        SharedState {
            running:          AtomicBool::new(true),
            detection_active: AtomicBool::new(true),
        }
    }
}

impl SharedState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask every context to exit at its next check.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.detection_active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.detection_active.store(active, Ordering::Release);
    }

    /// Flip detection on/off.  Returns the new value.
    pub fn toggle_active(&self) -> bool {
        !self.detection_active.fetch_xor(true, Ordering::AcqRel)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ActivationToggle — what the hotkey callback calls
// ════════════════════════════════════════════════════════════════════════════

/// Flips [`SharedState`]'s activation flag.  Cheap to clone into whatever
/// thread delivers hotkey events.
#[derive(Clone, Debug)]
pub struct ActivationToggle {
    state: Arc<SharedState>,
}

impl ActivationToggle {
    pub fn new(state: Arc<SharedState>) -> Self {
        ActivationToggle { state }
    }

    pub fn fire(&self) -> bool {
        let now_active = self.state.toggle_active();
        log::info!("detection {}", if now_active { "ACTIVE" } else { "INACTIVE" });
        now_active
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Fade — linear show animation requested on activation
// ════════════════════════════════════════════════════════════════════════════

pub const FADE_STEPS:    u32 = 10;
pub const FADE_DURATION: Duration = Duration::from_millis(500);

/// A stepped linear fade-in.  The UI surface reads [`Fade::alpha`] each
/// frame; the core only keeps the timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fade {
    started: Instant,
}

impl Fade {
    pub fn start(now: Instant) -> Self {
        Fade { started: now }
    }

    /// Opacity in `[0, 1]`, rising in [`FADE_STEPS`] equal steps.
    pub fn alpha(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= FADE_DURATION {
            return 1.0;
        }
        let step_len = FADE_DURATION / FADE_STEPS;
        let step = (elapsed.as_nanos() / step_len.as_nanos()) as u32;
        step as f32 / FADE_STEPS as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_running_and_active() {
        let s = SharedState::new();
        assert!(s.is_running());
        assert!(s.is_active());
        s.stop();
        assert!(!s.is_running());
    }

    #[test]
    fn toggle_flips_and_reports() {
        let s = SharedState::new();
        let t = ActivationToggle::new(Arc::clone(&s));
        assert!(!t.fire());
        assert!(!s.is_active());
        assert!(t.fire());
        assert!(s.is_active());
    }

    #[test]
    fn concurrent_toggles_are_not_lost() {
        let s = SharedState::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let t = ActivationToggle::new(Arc::clone(&s));
                thread::spawn(move || {
                    for _ in 0..1000 {
                        t.toggle_only();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // 4000 flips → back where we started
        assert!(s.is_active());
    }

    impl ActivationToggle {
        fn toggle_only(&self) {
            self.state.toggle_active();
        }
    }

    #[test]
    fn fade_steps_linearly() {
        let t0 = Instant::now();
        let f = Fade::start(t0);
        assert_eq!(f.alpha(t0), 0.0);
        assert_eq!(f.alpha(t0 + Duration::from_millis(49)), 0.0);
        assert!((f.alpha(t0 + Duration::from_millis(250)) - 0.5).abs() < 1e-6);
        assert_eq!(f.alpha(t0 + FADE_DURATION), 1.0);
        assert!(f.done(t0 + Duration::from_secs(1)));
    }
}
