//! The control-loop body: one call per tick, no threads, no I/O of its own.
//!
//! Per tick, in order:
//!
//! 1. inactive → nothing (and forget the previous index x);
//! 2. no fresh detection, or no hand → nothing;
//! 3. pinch (own cooldown), then swipe (own cooldown), independently;
//! 4. mode transition from the finger vector;
//! 5. the current mode's continuous action (volume / scroll / cursor).

use std::time::Instant;

use crate::actions::{Gesture, GestureAction};
use crate::classifier::{self, FingerVector, HandGeometry, SwipeDirection};
use crate::config::Config;
use crate::cooldown::{CooldownTimers, CooldownWindows, Gate};
use crate::dispatch::{ActionDispatcher, VolumeReadout};
use crate::landmarks::Detection;
use crate::mode::{EnabledModes, Mode, ModeStateMachine};
use crate::Result;

/// Thresholds and windows fixed for the session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineSettings {
    pub pinch_threshold_px: f32,
    pub swipe_threshold_px: f32,
    pub windows:            CooldownWindows,
    pub enabled:            EnabledModes,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            pinch_threshold_px: classifier::PINCH_THRESHOLD_PX,
            swipe_threshold_px: classifier::SWIPE_THRESHOLD_PX,
            windows:            CooldownWindows::default(),
            enabled:            EnabledModes::default(),
        }
    }
}

impl EngineSettings {
    pub fn from_config(cfg: &Config) -> Self {
        EngineSettings {
            pinch_threshold_px: cfg.pinch_threshold_px(),
            swipe_threshold_px: cfg.swipe_threshold_px(),
            windows:            cfg.cooldown_windows(),
            enabled:            cfg.enabled_modes(),
        }
    }
}

/// Continuous effect applied by the current mode this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ModeEffect {
    None,
    Volume(VolumeReadout),
    Scroll(i32),
    Cursor(i32, i32),
}

/// Everything the overlay may want to show about one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub mode:       Mode,
    pub geometry:   Option<HandGeometry>,
    pub pinch:      Option<GestureAction>,
    pub swipe:      Option<(SwipeDirection, Option<GestureAction>)>,
    pub transition: Option<(Mode, Mode)>,
    pub effect:     ModeEffect,
}

impl TickReport {
    fn idle(mode: Mode) -> Self {
        TickReport {
            mode,
            geometry:   None,
            pinch:      None,
            swipe:      None,
            transition: None,
            effect:     ModeEffect::None,
        }
    }

    pub fn fingers(&self) -> Option<FingerVector> {
        self.geometry.map(|g| g.fingers)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureEngine
// ════════════════════════════════════════════════════════════════════════════

/// Owns all control-context state: mode, cooldown timers, previous index x
/// and the dispatcher.  Never shared across threads.
pub struct GestureEngine {
    settings:     EngineSettings,
    machine:      ModeStateMachine,
    timers:       CooldownTimers,
    prev_index_x: Option<i32>,
    last_seq:     u64,
    dispatcher:   ActionDispatcher,
}

impl GestureEngine {
    /// Volume mode is switched off when the dispatcher has no audio endpoint.
    pub fn new(mut settings: EngineSettings, dispatcher: ActionDispatcher) -> Self {
        if !dispatcher.has_volume() && settings.enabled.volume {
            log::warn!("no audio endpoint; Volume mode disabled");
            settings.enabled.volume = false;
        }
        GestureEngine {
            machine: ModeStateMachine::new(settings.enabled),
            timers: CooldownTimers::new(settings.windows),
            settings,
            prev_index_x: None,
            last_seq: 0,
            dispatcher,
        }
    }

    pub fn from_config(cfg: &Config, dispatcher: ActionDispatcher) -> Result<Self> {
        cfg.validate()?;
        Ok(GestureEngine::new(EngineSettings::from_config(cfg), dispatcher))
    }

    pub fn mode(&self) -> Mode { self.machine.mode() }

    /// Run one tick.  `detection` is the latest published result (it may be
    /// the same one as last tick; repeats are ignored).
    pub fn tick(&mut self, now: Instant, detection: Option<&Detection>, active: bool) -> TickReport {
        if !active {
            self.prev_index_x = None;
            return TickReport::idle(self.mode());
        }

        let detection = match detection {
            Some(d) if d.frame_seq > self.last_seq => d,
            _ => return TickReport::idle(self.mode()),
        };
        self.last_seq = detection.frame_seq;

        let hand = match &detection.hand {
            Some(h) => h,
            None => return TickReport::idle(self.mode()),
        };

        let (w, h) = detection.frame_size;
        let geom = HandGeometry::from_landmarks(hand, w, h);
        let mut report = TickReport::idle(self.mode());
        report.geometry = Some(geom);

        // ── Pinch ─────────────────────────────────────────────────────────
        if self.timers.is_eligible(Gate::Pinch, now)
            && classifier::is_pinch(geom.pinch_distance(), self.settings.pinch_threshold_px)
        {
            self.timers.record(Gate::Pinch, now);
            report.pinch = self.dispatcher.trigger(Gesture::Tap);
        }

        // ── Swipe ─────────────────────────────────────────────────────────
        if self.timers.is_eligible(Gate::Swipe, now) {
            let x = geom.index_tip.x;
            if let Some(dir) = classifier::swipe_from(self.prev_index_x, x, self.settings.swipe_threshold_px) {
                self.timers.record(Gate::Swipe, now);
                let action = self.dispatcher.trigger(Gesture::from(dir));
                log::debug!("swipe {} ({:?} → {})", dir.name(), self.prev_index_x, x);
                report.swipe = Some((dir, action));
            }
        }
        self.prev_index_x = Some(geom.index_tip.x);

        // ── Mode ──────────────────────────────────────────────────────────
        report.transition = self.machine.apply(geom.fingers);
        report.mode = self.machine.mode();

        report.effect = match report.mode {
            Mode::Neutral => ModeEffect::None,
            Mode::Volume => match self.dispatcher.apply_volume(&geom) {
                Some(r) => ModeEffect::Volume(r),
                None    => ModeEffect::None,
            },
            Mode::Scroll => {
                if self.timers.try_fire(Gate::Scroll, now) {
                    ModeEffect::Scroll(self.dispatcher.apply_scroll(&geom))
                } else {
                    ModeEffect::None
                }
            }
            Mode::Cursor => {
                let (x, y) = self.dispatcher.apply_cursor(&geom);
                ModeEffect::Cursor(x, y)
            }
        };

        report
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::actions::{Key, KeyCombo};
    use crate::dispatch::fake::{dispatcher, Call, CallLog};
    use crate::landmarks::{
        synthetic_hand, LandmarkSet, Point3, INDEX_PIP, INDEX_TIP, THUMB_TIP, THUMB_MCP,
    };

    const W: usize = 640;
    const H: usize = 480;

    struct Rig {
        engine: GestureEngine,
        log:    CallLog,
        seq:    u64,
        t0:     Instant,
    }

    impl Rig {
        fn new() -> Self {
            let (d, log) = dispatcher(true);
            Rig { engine: GestureEngine::new(EngineSettings::default(), d), log, seq: 0, t0: Instant::now() }
        }

        fn feed(&mut self, ms: u64, hand: Option<LandmarkSet>, active: bool) -> TickReport {
            self.seq += 1;
            let det = Detection::new(self.seq, (W, H), hand);
            self.engine.tick(self.t0 + Duration::from_millis(ms), Some(&det), active)
        }

        fn keys(&self) -> Vec<KeyCombo> {
            self.log.borrow().iter().filter_map(|c| match c {
                Call::Key(k) => Some(*k),
                _ => None,
            }).collect()
        }

        fn calls(&self) -> usize {
            self.log.borrow().len()
        }
    }

    fn pose(bits: [u8; 5]) -> LandmarkSet {
        synthetic_hand(FingerVector::from_bits(bits).0, (0.5, 0.5), false, 0.0)
    }

    /// Hand with thumb and index tips at exact pixel positions, fingers
    /// otherwise curled.
    fn tips_at(thumb: (f32, f32), index: (f32, f32)) -> LandmarkSet {
        let mut pts = *pose([0, 0, 0, 0, 0]).points();
        pts[THUMB_TIP] = Point3::new(thumb.0 / W as f32, thumb.1 / H as f32, 0.0);
        pts[INDEX_TIP] = Point3::new(index.0 / W as f32, index.1 / H as f32, 0.0);
        // curl thumb and index whatever the tip positions, so no mode
        // pose is formed
        pts[THUMB_MCP] = Point3::new(0.0, pts[THUMB_MCP].y, 0.0);
        pts[INDEX_PIP] = Point3::new(pts[INDEX_PIP].x, 0.0, 0.0);
        LandmarkSet::new(pts)
    }

    #[test]
    fn volume_pose_enters_volume() {
        let mut rig = Rig::new();
        let r = rig.feed(0, Some(pose([1, 1, 0, 0, 0])), true);
        assert_eq!(r.transition, Some((Mode::Neutral, Mode::Volume)));
        assert_eq!(rig.engine.mode(), Mode::Volume);
        assert!(matches!(r.effect, ModeEffect::Volume(_)));
    }

    #[test]
    fn open_hand_resets_from_every_mode() {
        for bits in [[1, 1, 0, 0, 0], [0, 1, 1, 0, 0], [0, 1, 0, 0, 0]] {
            let mut rig = Rig::new();
            rig.feed(0, Some(pose(bits)), true);
            assert_ne!(rig.engine.mode(), Mode::Neutral);
            rig.feed(10, Some(pose([1, 1, 1, 1, 1])), true);
            assert_eq!(rig.engine.mode(), Mode::Neutral);
            assert!(!rig.engine.machine.is_active());
        }
    }

    #[test]
    fn same_landmarks_never_retrigger_transition() {
        let mut rig = Rig::new();
        let hand = pose([1, 1, 0, 0, 0]);
        rig.feed(0, Some(hand.clone()), true);
        for i in 1..30 {
            let r = rig.feed(i * 33, Some(hand.clone()), true);
            assert_eq!(r.transition, None);
            assert_eq!(r.mode, Mode::Volume);
        }
    }

    #[test]
    fn pinch_fires_once_within_cooldown() {
        let mut rig = Rig::new();
        let hand = tips_at((100.0, 100.0), (105.0, 105.0));
        let first = rig.feed(0, Some(hand.clone()), true);
        assert_eq!(first.pinch, Some(GestureAction::Select));
        for i in 1..30 {
            assert_eq!(rig.feed(i * 33, Some(hand.clone()), true).pinch, None);
        }
        assert_eq!(rig.keys(), vec![KeyCombo::plain(Key::Space)]);
        // after the window it fires again
        assert!(rig.feed(1100, Some(hand), true).pinch.is_some());
    }

    #[test]
    fn forty_pixel_span_never_pinches() {
        let mut rig = Rig::new();
        let hand = tips_at((100.0, 100.0), (140.0, 100.0));
        for i in 0..10 {
            assert_eq!(rig.feed(i * 2000, Some(hand.clone()), true).pinch, None);
        }
        assert!(rig.keys().is_empty());
    }

    #[test]
    fn swipe_right_sends_next() {
        let mut rig = Rig::new();
        let fist = |x: f32| tips_at((x + 200.0, 300.0), (x, 100.0));
        assert_eq!(rig.feed(0, Some(fist(100.0)), true).swipe, None);
        let r = rig.feed(33, Some(fist(160.0)), true);
        assert_eq!(r.swipe, Some((SwipeDirection::Right, Some(GestureAction::Next))));
        // within cooldown: a big move left is ignored
        assert_eq!(rig.feed(66, Some(fist(20.0)), true).swipe, None);
        assert_eq!(rig.keys(), vec![KeyCombo::ctrl(Key::Right)]);
    }

    #[test]
    fn pinch_and_swipe_can_fire_in_one_tick() {
        let mut rig = Rig::new();
        rig.feed(0, Some(tips_at((300.0, 300.0), (100.0, 100.0))), true);
        let r = rig.feed(33, Some(tips_at((402.0, 102.0), (400.0, 100.0))), true);
        assert!(r.pinch.is_some());
        assert!(r.swipe.is_some());
        assert_eq!(rig.keys(), vec![KeyCombo::plain(Key::Space), KeyCombo::ctrl(Key::Right)]);
    }

    #[test]
    fn inactive_issues_no_calls() {
        let mut rig = Rig::new();
        rig.feed(0, Some(pose([0, 1, 0, 0, 0])), true);
        let before = rig.calls();
        for i in 1..20 {
            let r = rig.feed(i * 100, Some(tips_at((100.0, 100.0), (101.0, 101.0))), false);
            assert_eq!(r.geometry, None);
        }
        assert_eq!(rig.calls(), before);
        // back on: cursor mode is still latched and resumes
        let r = rig.feed(5000, Some(pose([0, 1, 0, 0, 0])), true);
        assert!(matches!(r.effect, ModeEffect::Cursor(_, _)));
    }

    #[test]
    fn reactivation_does_not_swipe_against_stale_x() {
        let mut rig = Rig::new();
        rig.feed(0, Some(tips_at((500.0, 400.0), (50.0, 100.0))), true);
        rig.feed(100, None, false);
        let r = rig.feed(200, Some(tips_at((500.0, 400.0), (600.0, 100.0))), true);
        assert_eq!(r.swipe, None);
    }

    #[test]
    fn repeated_detection_is_processed_once() {
        let mut rig = Rig::new();
        let det = Detection::new(1, (W, H), Some(pose([0, 1, 0, 0, 0])));
        rig.engine.tick(rig.t0, Some(&det), true);
        let after_first = rig.calls();
        let r = rig.engine.tick(rig.t0 + Duration::from_millis(5), Some(&det), true);
        assert_eq!(r.geometry, None);
        assert_eq!(rig.calls(), after_first);
    }

    #[test]
    fn cursor_moves_every_tick() {
        let mut rig = Rig::new();
        for i in 0..5 {
            rig.feed(i, Some(pose([0, 1, 0, 0, 0])), true);
        }
        let moves = rig.log.borrow().iter().filter(|c| matches!(c, Call::Move(..))).count();
        assert_eq!(moves, 5);
    }

    #[test]
    fn scroll_is_rate_limited() {
        let mut rig = Rig::new();
        let hand = synthetic_hand(FingerVector::from_bits([0, 1, 1, 0, 0]).0, (0.5, 0.5), false, 0.05);
        for i in 0..10 {
            rig.feed(i * 10, Some(hand.clone()), true);
        }
        let scrolls: Vec<_> = rig.log.borrow().iter().filter_map(|c| match c {
            Call::Scroll(d) => Some(*d),
            _ => None,
        }).collect();
        // fired at 0 and 60 ms; the index is lifted so the delta is upward
        assert_eq!(scrolls.len(), 2);
        assert!(scrolls.iter().all(|d| *d > 0));
    }

    #[test]
    fn missing_hand_keeps_mode() {
        let mut rig = Rig::new();
        rig.feed(0, Some(pose([0, 1, 1, 0, 0])), true);
        let r = rig.feed(100, None, true);
        assert_eq!(r.mode, Mode::Scroll);
        assert_eq!(r.effect, ModeEffect::None);
    }

    #[test]
    fn no_audio_endpoint_disables_volume() {
        let (d, log) = dispatcher(false);
        let mut engine = GestureEngine::new(EngineSettings::default(), d);
        let det = Detection::new(1, (W, H), Some(pose([1, 1, 0, 0, 0])));
        let r = engine.tick(Instant::now(), Some(&det), true);
        assert_eq!(r.mode, Mode::Neutral);
        assert!(log.borrow().is_empty());
    }
}
