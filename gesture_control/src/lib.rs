//! # gesture_control
//!
//! Camera-driven hand-gesture controller for the desktop: moves the pointer,
//! scrolls, changes the system volume and sends navigation keys from one
//! tracked hand.
//!
//! ## Threads
//!
//! | Context | Module | Produces |
//! |---|---|---|
//! | Capture | [`capture`] | latest mirrored [`Frame`](gesture_core::frame::Frame) |
//! | Inference | [`detector`] | latest [`Detection`](gesture_core::landmarks::Detection) |
//! | Control (main) | [`app`] | actuator calls + overlay |
//! | Hotkey | [`hotkey`] | activation toggles |
//!
//! The two producer threads publish into latest-wins slots; nothing queues.
//!
//! ## Poses → modes
//!
//! | Fingers (T,I,M,R,P) | Mode |
//! |---|---|
//! | `[1,1,1,1,1]` | back to Neutral |
//! | `[1,1,0,0,0]` | Volume: thumb–index span sets the level |
//! | `[0,1,1,0,0]` | Scroll: index vs. middle height scrolls |
//! | `[0,1,0,0,0]` | Cursor: index tip drives the pointer |
//!
//! Pinch (thumb on index) and horizontal swipes fire mapped key actions in
//! any mode.
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: synthetic camera, hand driven by the
//!   overlay window.
//! * `camera` — real webcam through `nokhwa`.
//! * `onnx` — real hand landmarks from an ONNX model.
//!
//! ### Simulation controls
//!
//! | Input | Effect |
//! |---|---|
//! | Mouse | Move the hand |
//! | Left button (hold) | Pinch |
//! | `1` / `2` / `3` | Cursor / Scroll / Volume pose |
//! | `4` / `5` | Fist / open hand |
//! | `Up` / `Down` | Raise / lower the index tip |
//! | `H` | Hide / show the hand |
//! | `Escape` | Quit |

pub mod actuators;
pub mod capture;
pub mod detector;
pub mod hotkey;
pub mod sim;
pub mod overlay;
pub mod app;
