//! Hand landmarks as produced by the inference service.
//!
//! 21 points per hand, normalised to the frame: `x` and `y` in `[0, 1]`
//! with the origin top-left, `z` relative depth.  Index layout follows the
//! common hand-landmark topology:
//!
//! ```text
//!         8   12  16  20        tips
//!         7   11  15  19
//!    4    6   10  14  18        pip (finger "base joint")
//!    3    5    9  13  17        mcp
//!     2
//!      1
//!          0                    wrist
//! ```

use std::time::Instant;

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP:   usize = 14;
pub const RING_TIP:   usize = 16;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_TIP:  usize = 20;

/// Bones drawn by the overlay, as landmark index pairs.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (17, 18), (18, 19), (19, 20),
    (0, 17),
];

/// One normalised landmark.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Point3 { x, y, z }
    }
}

/// A landmark converted to frame pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        PixelPoint { x, y }
    }
}

/// The 21 landmarks of one tracked hand.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    points: [Point3; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Point3; LANDMARK_COUNT]) -> Self {
        LandmarkSet { points }
    }

    /// Build from a flat slice; `None` unless exactly 21 points are given.
    pub fn from_slice(points: &[Point3]) -> Option<Self> {
        let points: [Point3; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(LandmarkSet { points })
    }

    pub fn point(&self, index: usize) -> Point3 {
        self.points[index]
    }

    pub fn points(&self) -> &[Point3; LANDMARK_COUNT] {
        &self.points
    }

    /// Landmark `index` scaled to a `width × height` frame, truncated toward
    /// zero.
    pub fn to_pixels(&self, index: usize, width: usize, height: usize) -> PixelPoint {
        let p = self.points[index];
        PixelPoint::new((p.x * width as f32) as i32, (p.y * height as f32) as i32)
    }
}

/// What the detector publishes for one processed frame.
///
/// `hand == None` is the explicit "no hand" signal: the frame was processed
/// and nothing was found.
#[derive(Clone, Debug)]
pub struct Detection {
    /// Sequence number of the frame this result was computed from.
    pub frame_seq:  u64,
    pub frame_size: (usize, usize),
    pub hand:       Option<LandmarkSet>,
    pub at:         Instant,
}

impl Detection {
    pub fn new(frame_seq: u64, frame_size: (usize, usize), hand: Option<LandmarkSet>) -> Self {
        Detection { frame_seq, frame_size, hand, at: Instant::now() }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Synthetic hands
// ════════════════════════════════════════════════════════════════════════════

/// Build a plausible right hand (as seen in a mirrored frame) with the given
/// fingers extended, centred on `anchor` (normalised pip-row position).
///
/// Used by the simulator and by tests.  `pinch` folds the thumb tip onto the
/// index tip, which also reads as a curled thumb.  `index_lift` raises the
/// index tip (and lowers nothing else), giving Scroll mode a non-zero delta.
pub fn synthetic_hand(fingers: [bool; 5], anchor: (f32, f32), pinch: bool, index_lift: f32) -> LandmarkSet {
    let (ax, ay) = anchor;
    let mut pts = [Point3::default(); LANDMARK_COUNT];

    pts[WRIST] = Point3::new(ax + 0.01, ay + 0.16, 0.0);

    // Thumb: 1..=4.  Extended means the tip sits left of the mcp.
    pts[1] = Point3::new(ax - 0.04, ay + 0.12, 0.0);
    pts[THUMB_MCP] = Point3::new(ax - 0.06, ay + 0.09, 0.0);
    if fingers[0] {
        pts[3] = Point3::new(ax - 0.09, ay + 0.07, 0.0);
        pts[THUMB_TIP] = Point3::new(ax - 0.12, ay + 0.05, 0.0);
    } else {
        pts[3] = Point3::new(ax - 0.05, ay + 0.07, 0.0);
        pts[THUMB_TIP] = Point3::new(ax - 0.03, ay + 0.07, 0.0);
    }

    // Index..pinky: mcp, pip, dip, tip at 5.., 9.., 13.., 17..
    for (f, extended) in fingers[1..].iter().enumerate() {
        let base = 5 + f * 4;
        let x = ax - 0.03 + f as f32 * 0.03;
        pts[base] = Point3::new(x, ay + 0.03, 0.0);
        pts[base + 1] = Point3::new(x, ay, 0.0);
        if *extended {
            pts[base + 2] = Point3::new(x, ay - 0.05, 0.0);
            pts[base + 3] = Point3::new(x, ay - 0.09, 0.0);
        } else {
            pts[base + 2] = Point3::new(x, ay + 0.02, 0.0);
            pts[base + 3] = Point3::new(x, ay + 0.04, 0.0);
        }
    }

    pts[INDEX_TIP].y -= index_lift;

    if pinch {
        let tip = pts[INDEX_TIP];
        pts[THUMB_TIP] = Point3::new(tip.x + 0.004, tip.y + 0.004, 0.0);
    }

    LandmarkSet::new(pts)
}
