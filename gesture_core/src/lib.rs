//! # gesture_core
//!
//! The hardware-free half of the hand-gesture controller: everything that
//! turns a tracked hand into user-interface commands, minus the camera, the
//! landmark model and the OS actuators.
//!
//! ## Pipeline
//!
//! ```text
//! FrameSource ─▶ [frame slot] ─▶ LandmarkDetector ─▶ [result slot] ─▶ GestureEngine
//!                                                                    │
//!                       classifier ─▶ mode machine / cooldown gates ─┘─▶ dispatcher ─▶ actuators
//! ```
//!
//! The two slots are [`slot::LatestSlot`]s: latest value wins, producers
//! never block.  The engine runs once per control tick and owns the mode,
//! the cooldown timers and the previous index-finger x.
//!
//! ## Poses → modes
//!
//! | Fingers (thumb..pinky) | Mode entered | Only from |
//! |---|---|---|
//! | `[1,1,1,1,1]` | Neutral | any |
//! | `[1,1,0,0,0]` | Volume  | Neutral |
//! | `[0,1,1,0,0]` | Scroll  | Neutral |
//! | `[0,1,0,0,0]` | Cursor  | Neutral |
//!
//! ## Gestures → actions (defaults)
//!
//! | Gesture | Action | Key combo |
//! |---|---|---|
//! | Pinch (`Tap`) | Select | `Space` |
//! | Swipe right | Next | `Ctrl+Right` |
//! | Swipe left | Previous | `Ctrl+Left` |

pub mod error;
pub mod frame;
pub mod landmarks;
pub mod classifier;
pub mod mode;
pub mod cooldown;
pub mod actions;
pub mod dispatch;
pub mod slot;
pub mod activation;
pub mod status;
pub mod config;
pub mod engine;

pub use error::{Error, Result};
