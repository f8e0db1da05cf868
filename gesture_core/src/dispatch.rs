//! Action dispatch: mode + hand geometry → actuator calls.
//!
//! The dispatcher talks to the outside world only through the two actuator
//! traits below.  Calls are fire-and-forget: a failing actuator is logged
//! (once per failure streak) and the tick carries on.

use crate::actions::{ActionMap, Gesture, GestureAction, KeyCombo};
use crate::classifier::HandGeometry;
use crate::Result;

/// Pixel distance range mapped onto the device volume range.
pub const VOLUME_DISTANCE_RANGE: (f32, f32) = (20.0, 150.0);
/// Pixel distance range mapped onto the 0–100 % bar.
pub const VOLUME_BAR_RANGE: (f32, f32) = (50.0, 200.0);
/// Divisor applied to the index/middle vertical offset in Scroll mode.
pub const SCROLL_SMOOTHING: f32 = 3.0;

// ════════════════════════════════════════════════════════════════════════════
// Actuator interfaces
// ════════════════════════════════════════════════════════════════════════════

/// System output volume.
pub trait VolumeControl {
    /// `(min, max)` in the device's native unit.
    fn range(&self) -> (f32, f32);
    fn set_level(&mut self, level: f32) -> Result<()>;
    fn name(&self) -> &str;
}

/// Synthetic pointer and keyboard input.
pub trait InputInjector {
    fn move_pointer(&mut self, x: i32, y: i32) -> Result<()>;
    /// Positive scrolls up.
    fn scroll(&mut self, delta: i32) -> Result<()>;
    fn send_key(&mut self, combo: KeyCombo) -> Result<()>;
    /// Screen size in pixels.
    fn screen_size(&self) -> (u32, u32);
    fn name(&self) -> &str;
}

// ════════════════════════════════════════════════════════════════════════════
// Interpolation
// ════════════════════════════════════════════════════════════════════════════

/// Linear map of `x` from `from` onto `to`, clamped to the ends of `to`.
/// `to` may be descending.
pub fn interp(x: f32, from: (f32, f32), to: (f32, f32)) -> f32 {
    let (x0, x1) = from;
    let (y0, y1) = to;
    if x <= x0 {
        return y0;
    }
    if x >= x1 {
        return y1;
    }
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// What Volume mode applied this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeReadout {
    pub distance: f32,
    /// Level sent to the device, in its native range.
    pub level:    f32,
    /// Bar fill, 0–100.
    pub percent:  f32,
}

/// Volume level and bar percentage for a thumb–index distance.
pub fn volume_for_distance(distance: f32, range: (f32, f32)) -> VolumeReadout {
    VolumeReadout {
        distance,
        level:   interp(distance, VOLUME_DISTANCE_RANGE, range),
        percent: interp(distance, VOLUME_BAR_RANGE, (0.0, 100.0)),
    }
}

/// Scroll delta: middle-tip y minus index-tip y, divided by the smoothing
/// factor and truncated toward zero.  Index above middle scrolls up.
pub fn scroll_delta(geom: &HandGeometry) -> i32 {
    ((geom.middle_tip.y - geom.index_tip.y) as f32 / SCROLL_SMOOTHING) as i32
}

/// Normalised index tip → screen pixels.
pub fn cursor_target(geom: &HandGeometry, screen: (u32, u32)) -> (i32, i32) {
    let (nx, ny) = geom.index_norm;
    ((nx * screen.0 as f32) as i32, (ny * screen.1 as f32) as i32)
}

// ════════════════════════════════════════════════════════════════════════════
// ActionDispatcher
// ════════════════════════════════════════════════════════════════════════════

/// Actuator call kinds, each with its own failure streak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CallKind {
    Key,
    Volume,
    Scroll,
    Pointer,
}

impl CallKind {
    fn name(self) -> &'static str {
        match self {
            CallKind::Key     => "send_key",
            CallKind::Volume  => "set_level",
            CallKind::Scroll  => "scroll",
            CallKind::Pointer => "move_pointer",
        }
    }
}

/// Issues actuator calls on behalf of the control loop.
pub struct ActionDispatcher {
    input:    Box<dyn InputInjector>,
    volume:   Option<Box<dyn VolumeControl>>,
    actions:  ActionMap,
    /// Per [`CallKind`]: set while the last call of that kind failed, so a
    /// dead actuator logs once per streak.
    failing:  [bool; 4],
}

impl ActionDispatcher {
    pub fn new(
        input:   Box<dyn InputInjector>,
        volume:  Option<Box<dyn VolumeControl>>,
        actions: ActionMap,
    ) -> Self {
        ActionDispatcher { input, volume, actions, failing: [false; 4] }
    }

    /// False when no audio endpoint was acquired at startup.
    pub fn has_volume(&self) -> bool {
        self.volume.is_some()
    }

    /// Send the key combo mapped to `gesture`.  Returns the action issued,
    /// or `None` when the gesture is unmapped.
    pub fn trigger(&mut self, gesture: Gesture) -> Option<GestureAction> {
        let action = self.actions.action_for(gesture)?;
        log::debug!("{} → {} ({})", gesture, action, action.combo());
        let res = self.input.send_key(action.combo());
        self.note(res, CallKind::Key);
        Some(action)
    }

    /// Volume mode: map the pinch span onto the device range.
    pub fn apply_volume(&mut self, geom: &HandGeometry) -> Option<VolumeReadout> {
        let volume = self.volume.as_mut()?;
        let readout = volume_for_distance(geom.pinch_distance(), volume.range());
        let res = volume.set_level(readout.level);
        self.note(res, CallKind::Volume);
        Some(readout)
    }

    /// Scroll mode: one scroll step.  Returns the delta sent.
    pub fn apply_scroll(&mut self, geom: &HandGeometry) -> i32 {
        let delta = scroll_delta(geom);
        let res = self.input.scroll(delta);
        self.note(res, CallKind::Scroll);
        delta
    }

    /// Cursor mode: move the pointer under the index tip.
    pub fn apply_cursor(&mut self, geom: &HandGeometry) -> (i32, i32) {
        let target = cursor_target(geom, self.input.screen_size());
        let res = self.input.move_pointer(target.0, target.1);
        self.note(res, CallKind::Pointer);
        target
    }

    /// Record the outcome of one call.  Returns true when a new failure
    /// streak started (and was logged).
    fn note(&mut self, res: Result<()>, call: CallKind) -> bool {
        let failing = &mut self.failing[call as usize];
        match res {
            Ok(()) => {
                *failing = false;
                false
            }
            Err(e) => {
                let fresh = !*failing;
                if fresh {
                    log::warn!("{} failed: {} (further failures suppressed)", call.name(), e);
                }
                *failing = true;
                fresh
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Recording actuators (tests)
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::Error;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Call {
        Move(i32, i32),
        Scroll(i32),
        Key(KeyCombo),
        Volume(f32),
    }

    pub type CallLog = Rc<RefCell<Vec<Call>>>;

    pub struct FakeInput {
        pub log:    CallLog,
        pub fail:   bool,
    }

    impl InputInjector for FakeInput {
        fn move_pointer(&mut self, x: i32, y: i32) -> Result<()> {
            self.log.borrow_mut().push(Call::Move(x, y));
            if self.fail { Err(Error::Actuator("unplugged".into())) } else { Ok(()) }
        }
        fn scroll(&mut self, delta: i32) -> Result<()> {
            self.log.borrow_mut().push(Call::Scroll(delta));
            Ok(())
        }
        fn send_key(&mut self, combo: KeyCombo) -> Result<()> {
            self.log.borrow_mut().push(Call::Key(combo));
            if self.fail { Err(Error::Actuator("unplugged".into())) } else { Ok(()) }
        }
        fn screen_size(&self) -> (u32, u32) { (1920, 1080) }
        fn name(&self) -> &str { "fake" }
    }

    pub struct FakeVolume {
        pub log: CallLog,
    }

    impl VolumeControl for FakeVolume {
        fn range(&self) -> (f32, f32) { (-65.25, 0.0) }
        fn set_level(&mut self, level: f32) -> Result<()> {
            self.log.borrow_mut().push(Call::Volume(level));
            Ok(())
        }
        fn name(&self) -> &str { "fake" }
    }

    pub fn dispatcher(with_volume: bool) -> (ActionDispatcher, CallLog) {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let input = Box::new(FakeInput { log: log.clone(), fail: false });
        let volume: Option<Box<dyn VolumeControl>> = if with_volume {
            Some(Box::new(FakeVolume { log: log.clone() }))
        } else {
            None
        };
        (ActionDispatcher::new(input, volume, ActionMap::default()), log)
    }
}

#[cfg(test)]
mod tests {
    use super::fake::*;
    use super::*;
    use crate::actions::Key;
    use crate::classifier::FingerVector;
    use crate::landmarks::PixelPoint;

    fn geom(thumb: (i32, i32), index: (i32, i32), middle: (i32, i32)) -> HandGeometry {
        HandGeometry {
            thumb_tip:  PixelPoint::new(thumb.0, thumb.1),
            index_tip:  PixelPoint::new(index.0, index.1),
            middle_tip: PixelPoint::new(middle.0, middle.1),
            index_norm: (index.0 as f32 / 640.0, index.1 as f32 / 480.0),
            fingers:    FingerVector::from_bits([1, 1, 0, 0, 0]),
        }
    }

    #[test]
    fn interp_clamps_and_is_linear() {
        assert_eq!(interp(0.0, (20.0, 150.0), (-65.25, 0.0)), -65.25);
        assert_eq!(interp(500.0, (20.0, 150.0), (-65.25, 0.0)), 0.0);
        assert!((interp(85.0, (20.0, 150.0), (0.0, 100.0)) - 50.0).abs() < 1e-4);
        assert_eq!(interp(125.0, (50.0, 200.0), (400.0, 150.0)), 275.0);
    }

    #[test]
    fn volume_is_monotonic_and_clamped() {
        let range = (-65.25, 0.0);
        let mut prev = f32::NEG_INFINITY;
        for d in 0..=400 {
            let r = volume_for_distance(d as f32 * 0.5, range);
            assert!(r.level >= prev);
            assert!(r.level >= range.0 && r.level <= range.1);
            assert!(r.percent >= 0.0 && r.percent <= 100.0);
            prev = r.level;
        }
        assert_eq!(volume_for_distance(10.0, range).level, range.0);
        assert_eq!(volume_for_distance(190.0, range).level, range.1);
    }

    #[test]
    fn trigger_sends_mapped_combo() {
        let (mut d, log) = dispatcher(false);
        assert_eq!(d.trigger(Gesture::Tap), Some(GestureAction::Select));
        assert_eq!(d.trigger(Gesture::SwipeLeft), Some(GestureAction::Previous));
        assert_eq!(d.trigger(Gesture::DoubleTap), None);
        assert_eq!(*log.borrow(), vec![
            Call::Key(KeyCombo::plain(Key::Space)),
            Call::Key(KeyCombo::ctrl(Key::Left)),
        ]);
    }

    #[test]
    fn volume_without_endpoint_is_a_no_op() {
        let (mut d, log) = dispatcher(false);
        assert!(d.apply_volume(&geom((0, 0), (100, 0), (0, 0))).is_none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn volume_uses_pinch_span() {
        let (mut d, log) = dispatcher(true);
        let r = d.apply_volume(&geom((100, 100), (100, 185), (0, 0))).unwrap();
        assert_eq!(r.distance, 85.0);
        assert!((r.level - (-32.625)).abs() < 1e-3);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn scroll_divides_by_smoothing() {
        let (mut d, log) = dispatcher(false);
        // index 30 px above middle → +10 (up)
        assert_eq!(d.apply_scroll(&geom((0, 0), (300, 200), (320, 230))), 10);
        // index 10 px below middle → -3 (truncated)
        assert_eq!(d.apply_scroll(&geom((0, 0), (300, 210), (320, 200))), -3);
        assert_eq!(*log.borrow(), vec![Call::Scroll(10), Call::Scroll(-3)]);
    }

    #[test]
    fn cursor_scales_to_screen() {
        let (mut d, log) = dispatcher(false);
        let target = d.apply_cursor(&geom((0, 0), (320, 240), (0, 0)));
        assert_eq!(target, (960, 540));
        assert_eq!(*log.borrow(), vec![Call::Move(960, 540)]);
    }

    #[test]
    fn failure_streaks_are_tracked_per_call_kind() {
        let (mut d, _) = dispatcher(true);
        let dead = || Err(crate::Error::Actuator("gone".into()));
        assert!(d.note(dead(), CallKind::Volume));
        // a working pointer in between must not reset the volume streak
        assert!(!d.note(Ok(()), CallKind::Pointer));
        assert!(!d.note(dead(), CallKind::Volume));
        assert!(!d.note(dead(), CallKind::Volume));
        assert!(d.note(dead(), CallKind::Pointer));
        assert!(!d.note(Ok(()), CallKind::Volume));
        assert!(d.note(dead(), CallKind::Volume));
    }

    #[test]
    fn actuator_failure_does_not_propagate() {
        let log: CallLog = Default::default();
        let input = Box::new(FakeInput { log: log.clone(), fail: true });
        let mut d = ActionDispatcher::new(input, None, ActionMap::default());
        for _ in 0..3 {
            assert_eq!(d.trigger(Gesture::Tap), Some(GestureAction::Select));
        }
        assert_eq!(log.borrow().len(), 3);
    }
}
