//! Simulated hand, driven from the overlay window.
//!
//! The overlay sends [`SimInput`] events over a channel; [`SimHand`] folds
//! them into a pose and renders that pose as a [`LandmarkSet`] whenever the
//! detector asks.  The window event loop never touches gesture logic.

use std::sync::mpsc::Receiver;

use gesture_core::classifier::FingerVector;
use gesture_core::landmarks::{synthetic_hand, LandmarkSet};

// ════════════════════════════════════════════════════════════════════════════
// SimInput
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the overlay window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Pointer position in normalised frame coordinates.
    Pointer(f32, f32),
    KeyDown(SimKey),
    /// Left mouse button.
    Pinch(bool),
}

/// Simulated key codes (mapped from minifb keys by the overlay).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    CursorPose,    // 1
    ScrollPose,    // 2
    VolumePose,    // 3
    Fist,          // 4
    OpenHand,      // 5
    LiftUp,        // Up
    LiftDown,      // Down
    ToggleHand,    // H
}

/// Index-tip lift per arrow press, normalised.
const LIFT_STEP: f32 = 0.01;
const LIFT_MAX:  f32 = 0.25;

// ════════════════════════════════════════════════════════════════════════════
// SimHand
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimPose {
    pub fingers: FingerVector,
    pub anchor:  (f32, f32),
    pub pinch:   bool,
    pub lift:    f32,
    pub visible: bool,
}

impl Default for SimPose {
    fn default() -> Self {
        SimPose {
            fingers: FingerVector::from_bits([0, 0, 0, 0, 0]),
            anchor:  (0.5, 0.5),
            pinch:   false,
            lift:    0.0,
            visible: true,
        }
    }
}

pub struct SimHand {
    rx:   Receiver<SimInput>,
    pose: SimPose,
}

impl SimHand {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimHand { rx, pose: SimPose::default() }
    }

    pub fn pose(&self) -> SimPose {
        self.pose
    }

    /// Fold every pending input into the pose.
    pub fn drain(&mut self) {
        while let Ok(input) = self.rx.try_recv() {
            self.apply(input);
        }
    }

    pub fn apply(&mut self, input: SimInput) {
        let p = &mut self.pose;
        match input {
            SimInput::Pointer(x, y) => p.anchor = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)),
            SimInput::Pinch(down)   => p.pinch = down,
            SimInput::KeyDown(key)  => match key {
                SimKey::CursorPose => p.fingers = FingerVector::from_bits([0, 1, 0, 0, 0]),
                SimKey::ScrollPose => p.fingers = FingerVector::from_bits([0, 1, 1, 0, 0]),
                SimKey::VolumePose => p.fingers = FingerVector::from_bits([1, 1, 0, 0, 0]),
                SimKey::Fist       => p.fingers = FingerVector::from_bits([0, 0, 0, 0, 0]),
                SimKey::OpenHand   => p.fingers = FingerVector::OPEN_HAND,
                SimKey::LiftUp     => p.lift = (p.lift + LIFT_STEP).min(LIFT_MAX),
                SimKey::LiftDown   => p.lift = (p.lift - LIFT_STEP).max(-LIFT_MAX),
                SimKey::ToggleHand => p.visible = !p.visible,
            },
        }
    }

    /// Current pose as landmarks, `None` while hidden.
    pub fn landmarks(&mut self) -> Option<LandmarkSet> {
        self.drain();
        let p = self.pose;
        if !p.visible {
            return None;
        }
        Some(synthetic_hand(p.fingers.0, p.anchor, p.pinch, p.lift))
    }
}
