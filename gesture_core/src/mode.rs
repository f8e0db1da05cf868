//! Mode state machine.
//!
//! A mode is latched: once Volume, Scroll or Cursor is entered, only the
//! open-hand pose leaves it (back to Neutral).  Noisy per-frame finger
//! readings therefore cannot hop between control modes.

use std::fmt;

use crate::classifier::FingerVector;

/// The active gesture-control context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Neutral,
    Volume,
    Scroll,
    Cursor,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Neutral => "Neutral",
            Mode::Volume  => "Volume",
            Mode::Scroll  => "Scroll",
            Mode::Cursor  => "Cursor",
        }
    }

    /// Pose that enters this mode from Neutral.
    pub fn entry_pose(self) -> FingerVector {
        match self {
            Mode::Neutral => FingerVector::OPEN_HAND,
            Mode::Volume  => FingerVector::from_bits([1, 1, 0, 0, 0]),
            Mode::Scroll  => FingerVector::from_bits([0, 1, 1, 0, 0]),
            Mode::Cursor  => FingerVector::from_bits([0, 1, 0, 0, 0]),
        }
    }

    fn for_pose(fingers: FingerVector) -> Option<Mode> {
        [Mode::Volume, Mode::Scroll, Mode::Cursor]
            .into_iter()
            .find(|m| m.entry_pose() == fingers)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which non-Neutral modes may be entered this session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnabledModes {
    pub volume: bool,
    pub scroll: bool,
    pub cursor: bool,
}

impl Default for EnabledModes {
    fn default() -> Self {
        EnabledModes { volume: true, scroll: true, cursor: true }
    }
}

impl EnabledModes {
    pub fn allows(&self, mode: Mode) -> bool {
        match mode {
            Mode::Neutral => true,
            Mode::Volume  => self.volume,
            Mode::Scroll  => self.scroll,
            Mode::Cursor  => self.cursor,
        }
    }
}

/// Current mode plus the latch flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeState {
    pub mode:   Mode,
    pub active: bool,
}

/// One tick of the transition table.
///
/// | Fingers | From | To |
/// |---|---|---|
/// | `[1,1,1,1,1]` | any | Neutral, `active = false` |
/// | `[1,1,0,0,0]` | not latched | Volume, `active = true` |
/// | `[0,1,1,0,0]` | not latched | Scroll, `active = true` |
/// | `[0,1,0,0,0]` | not latched | Cursor, `active = true` |
/// | other | any | unchanged |
///
/// Poses of disabled modes count as "other".
pub fn transition(fingers: FingerVector, state: ModeState, enabled: &EnabledModes) -> ModeState {
    if fingers.is_open_hand() {
        return ModeState { mode: Mode::Neutral, active: false };
    }
    if state.active {
        return state;
    }
    match Mode::for_pose(fingers) {
        Some(mode) if enabled.allows(mode) => ModeState { mode, active: true },
        _ => state,
    }
}

/// Owns the one mutable [`ModeState`] of the control context.
#[derive(Debug, Default)]
pub struct ModeStateMachine {
    state:   ModeState,
    enabled: EnabledModes,
}

impl ModeStateMachine {
    pub fn new(enabled: EnabledModes) -> Self {
        ModeStateMachine { state: ModeState::default(), enabled }
    }

    pub fn mode(&self) -> Mode { self.state.mode }
    pub fn is_active(&self) -> bool { self.state.active }
    pub fn state(&self) -> ModeState { self.state }

    /// Apply one reading.  Returns `Some((from, to))` when the mode changed.
    pub fn apply(&mut self, fingers: FingerVector) -> Option<(Mode, Mode)> {
        let from = self.state.mode;
        self.state = transition(fingers, self.state, &self.enabled);
        let to = self.state.mode;
        if from != to {
            log::info!("mode {} → {} (fingers {})", from, to, fingers);
            Some((from, to))
        } else {
            None
        }
    }
}
