//! Pure gesture classification: finger extension, pinch, swipe.
//!
//! Nothing here keeps state.  The only context a caller must carry between
//! ticks is the previous index-finger x, passed explicitly to [`swipe_from`].

use std::fmt;

use crate::landmarks::{
    LandmarkSet, PixelPoint,
    THUMB_MCP, THUMB_TIP, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP,
    RING_PIP, RING_TIP, PINKY_PIP, PINKY_TIP,
};

/// Default pinch threshold in frame pixels.
pub const PINCH_THRESHOLD_PX: f32 = 30.0;
/// Default swipe threshold in frame pixels.
pub const SWIPE_THRESHOLD_PX: f32 = 50.0;

// ════════════════════════════════════════════════════════════════════════════
// FingerVector
// ════════════════════════════════════════════════════════════════════════════

/// Which fingers are extended: `[thumb, index, middle, ring, pinky]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FingerVector(pub [bool; 5]);

impl FingerVector {
    pub const OPEN_HAND: FingerVector = FingerVector([true; 5]);

    /// Build from the `0/1` notation used in the mode table.
    pub const fn from_bits(bits: [u8; 5]) -> Self {
        FingerVector([bits[0] != 0, bits[1] != 0, bits[2] != 0, bits[3] != 0, bits[4] != 0])
    }

    pub fn is_open_hand(&self) -> bool {
        *self == Self::OPEN_HAND
    }
}

impl fmt::Display for FingerVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = |x: bool| if x { '1' } else { '0' };
        write!(f, "[{},{},{},{},{}]",
            b(self.0[0]), b(self.0[1]), b(self.0[2]), b(self.0[3]), b(self.0[4]))
    }
}

/// Classify finger extension.
///
/// Thumb: extended when its tip lies left of its mcp joint (mirrored frame,
/// right hand).  Other fingers: extended when the tip is above the pip joint.
pub fn finger_vector(hand: &LandmarkSet) -> FingerVector {
    let thumb = hand.point(THUMB_TIP).x < hand.point(THUMB_MCP).x;
    let above = |tip: usize, base: usize| hand.point(tip).y < hand.point(base).y;
    FingerVector([
        thumb,
        above(INDEX_TIP,  INDEX_PIP),
        above(MIDDLE_TIP, MIDDLE_PIP),
        above(RING_TIP,   RING_PIP),
        above(PINKY_TIP,  PINKY_PIP),
    ])
}

// ════════════════════════════════════════════════════════════════════════════
// Pinch
// ════════════════════════════════════════════════════════════════════════════

/// Euclidean distance in pixels.
pub fn pinch_distance(index_tip: PixelPoint, thumb_tip: PixelPoint) -> f32 {
    let dx = (index_tip.x - thumb_tip.x) as f32;
    let dy = (index_tip.y - thumb_tip.y) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// A pinch holds strictly below the threshold.
pub fn is_pinch(distance: f32, threshold: f32) -> bool {
    distance < threshold
}

// ════════════════════════════════════════════════════════════════════════════
// Swipe
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    pub fn name(self) -> &'static str {
        match self {
            SwipeDirection::Left  => "left",
            SwipeDirection::Right => "right",
        }
    }
}

/// Horizontal displacement beyond `threshold` in either direction.
pub fn swipe_direction(prev_x: i32, curr_x: i32, threshold: f32) -> Option<SwipeDirection> {
    let displacement = (curr_x - prev_x) as f32;
    if displacement > threshold {
        Some(SwipeDirection::Right)
    } else if displacement < -threshold {
        Some(SwipeDirection::Left)
    } else {
        None
    }
}

/// [`swipe_direction`] tolerating a missing previous position (first tick).
pub fn swipe_from(prev_x: Option<i32>, curr_x: i32, threshold: f32) -> Option<SwipeDirection> {
    prev_x.and_then(|p| swipe_direction(p, curr_x, threshold))
}

// ════════════════════════════════════════════════════════════════════════════
// HandGeometry — the pixel positions the dispatcher needs
// ════════════════════════════════════════════════════════════════════════════

/// Derived per-tick geometry of one hand in a `width × height` frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandGeometry {
    pub thumb_tip:  PixelPoint,
    pub index_tip:  PixelPoint,
    pub middle_tip: PixelPoint,
    /// Normalised index tip, for mapping onto the screen.
    pub index_norm: (f32, f32),
    pub fingers:    FingerVector,
}

impl HandGeometry {
    pub fn from_landmarks(hand: &LandmarkSet, width: usize, height: usize) -> Self {
        let idx = hand.point(INDEX_TIP);
        HandGeometry {
            thumb_tip:  hand.to_pixels(THUMB_TIP,  width, height),
            index_tip:  hand.to_pixels(INDEX_TIP,  width, height),
            middle_tip: hand.to_pixels(MIDDLE_TIP, width, height),
            index_norm: (idx.x, idx.y),
            fingers:    finger_vector(hand),
        }
    }

    pub fn pinch_distance(&self) -> f32 {
        pinch_distance(self.index_tip, self.thumb_tip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::synthetic_hand;

    #[test]
    fn fingers_follow_pose() {
        for bits in [
            [1, 1, 1, 1, 1],
            [1, 1, 0, 0, 0],
            [0, 1, 1, 0, 0],
            [0, 1, 0, 0, 0],
            [0, 0, 0, 0, 0],
            [1, 0, 0, 0, 1],
        ] {
            let fv = FingerVector::from_bits(bits);
            let hand = synthetic_hand(fv.0, (0.5, 0.5), false, 0.0);
            assert_eq!(finger_vector(&hand), fv, "pose {}", fv);
        }
    }

    #[test]
    fn display_uses_bit_notation() {
        assert_eq!(FingerVector::from_bits([0, 1, 1, 0, 0]).to_string(), "[0,1,1,0,0]");
    }

    #[test]
    fn pinch_scenario_below_threshold() {
        let d = pinch_distance(PixelPoint::new(105, 105), PixelPoint::new(100, 100));
        assert!((d - 7.071).abs() < 0.01);
        assert!(is_pinch(d, PINCH_THRESHOLD_PX));
    }

    #[test]
    fn forty_pixels_is_not_a_pinch() {
        let d = pinch_distance(PixelPoint::new(140, 100), PixelPoint::new(100, 100));
        assert_eq!(d, 40.0);
        assert!(!is_pinch(d, PINCH_THRESHOLD_PX));
        assert!(!is_pinch(PINCH_THRESHOLD_PX, PINCH_THRESHOLD_PX));
    }

    #[test]
    fn swipe_right_scenario() {
        assert_eq!(swipe_direction(100, 160, 50.0), Some(SwipeDirection::Right));
    }

    #[test]
    fn swipe_sign_and_threshold() {
        for prev in [-200, 0, 37, 320, 639] {
            for delta in -120..=120 {
                let got = swipe_direction(prev, prev + delta, SWIPE_THRESHOLD_PX);
                let want = if delta > 50 {
                    Some(SwipeDirection::Right)
                } else if delta < -50 {
                    Some(SwipeDirection::Left)
                } else {
                    None
                };
                assert_eq!(got, want, "prev={} delta={}", prev, delta);
            }
        }
    }

    #[test]
    fn missing_previous_x_skips_swipe() {
        assert_eq!(swipe_from(None, 600, 50.0), None);
        assert_eq!(swipe_from(Some(0), 600, 50.0), Some(SwipeDirection::Right));
    }

    #[test]
    fn geometry_scales_to_frame() {
        let hand = synthetic_hand([false, true, false, false, false], (0.5, 0.5), false, 0.0);
        let g = HandGeometry::from_landmarks(&hand, 640, 480);
        assert_eq!(g.fingers, FingerVector::from_bits([0, 1, 0, 0, 0]));
        assert_eq!(g.index_tip, hand.to_pixels(INDEX_TIP, 640, 480));
        assert!((g.index_norm.0 - 0.47).abs() < 1e-6);
    }
}
