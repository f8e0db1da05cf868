//! LandmarkDetector — the inference context.
//!
//! Waits briefly for a frame newer than the last one it processed, runs the
//! hand detector on it and publishes a [`Detection`] (possibly "no hand").
//! A failed inference skips that frame and nothing is published for it.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gesture_core::activation::SharedState;
use gesture_core::frame::Frame;
use gesture_core::landmarks::{Detection, LandmarkSet};
use gesture_core::slot::LatestSlot;
use gesture_core::{Error, Result};

use crate::capture::FrameSlot;
use crate::sim::SimHand;

/// The latest-result slot shared by inference and control.
pub type DetectionSlot = LatestSlot<Arc<Detection>>;

/// How long the inference loop waits for a fresh frame before re-checking
/// the running flag.
const FRAME_WAIT: Duration = Duration::from_millis(100);

/// Confidence thresholds for single-hand tracking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorSettings {
    pub detection_confidence: f32,
    pub tracking_confidence:  f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        DetectorSettings {
            detection_confidence: 0.7,
            tracking_confidence:  0.7,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandDetector trait
// ════════════════════════════════════════════════════════════════════════════

pub trait HandDetector {
    /// Landmarks of at most one hand, `Ok(None)` when no hand is present.
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>>;
    fn name(&self) -> &str;
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandDetector — ignores the pixels, reports the simulated hand
// ════════════════════════════════════════════════════════════════════════════

pub struct SimHandDetector {
    hand: SimHand,
}

impl SimHandDetector {
    pub fn new(hand: SimHand) -> Self {
        SimHandDetector { hand }
    }
}

impl HandDetector for SimHandDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Option<LandmarkSet>> {
        Ok(self.hand.landmarks())
    }

    fn name(&self) -> &str { "simulated" }
}

// ════════════════════════════════════════════════════════════════════════════
// OnnxHandDetector — hand-landmark model (feature = "onnx")
// ════════════════════════════════════════════════════════════════════════════

/// Single-hand landmark model taking a `1×224×224×3` RGB float image in
/// `[0, 1]` and returning 21 `(x, y, z)` points in input pixels plus a
/// hand-presence score.
///
/// The presence score is compared against `detection_confidence` while no
/// hand is tracked and against `tracking_confidence` once one is.
#[cfg(feature = "onnx")]
pub struct OnnxHandDetector {
    session:  ort::session::Session,
    settings: DetectorSettings,
    tracking: bool,
}

#[cfg(feature = "onnx")]
impl OnnxHandDetector {
    const INPUT: usize = 224;

    pub fn new(model: &std::path::Path, settings: DetectorSettings) -> Result<Self> {
        let session = ort::session::Session::builder()
            .and_then(|b| b.commit_from_file(model))
            .map_err(|e| Error::DeviceUnavailable(format!("landmark model {:?}: {}", model, e)))?;
        log::info!("Loaded landmark model {:?}", model);
        Ok(OnnxHandDetector { session, settings, tracking: false })
    }

    /// Nearest-neighbour resize to the model input, RGB, scaled to `[0, 1]`.
    fn input_tensor(frame: &Frame) -> Vec<f32> {
        let n = Self::INPUT;
        let mut data = Vec::with_capacity(n * n * 3);
        for y in 0..n {
            let sy = y * frame.height / n;
            for x in 0..n {
                let sx = x * frame.width / n;
                let [r, g, b] = frame.rgb_at(sx, sy).unwrap_or([0, 0, 0]);
                data.extend_from_slice(&[r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]);
            }
        }
        data
    }
}

#[cfg(feature = "onnx")]
impl HandDetector for OnnxHandDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>> {
        use gesture_core::landmarks::{Point3, LANDMARK_COUNT};
        use ort::value::Tensor;

        if frame.is_empty() {
            return Ok(None);
        }
        let n = Self::INPUT;
        let infer = |e: ort::Error| Error::Inference(e.to_string());

        let input = Tensor::from_array(([1usize, n, n, 3], Self::input_tensor(frame).into_boxed_slice()))
            .map_err(infer)?;
        let outputs = self.session.run(ort::inputs![input]).map_err(infer)?;

        let (_, coords) = outputs[0].try_extract_raw_tensor::<f32>().map_err(infer)?;
        let (_, score) = outputs[1].try_extract_raw_tensor::<f32>().map_err(infer)?;
        let score = score.first().copied().unwrap_or(0.0);

        let threshold = if self.tracking {
            self.settings.tracking_confidence
        } else {
            self.settings.detection_confidence
        };
        if score < threshold || coords.len() < LANDMARK_COUNT * 3 {
            self.tracking = false;
            return Ok(None);
        }
        self.tracking = true;

        let scale = n as f32;
        let points: Vec<Point3> = coords[..LANDMARK_COUNT * 3]
            .chunks_exact(3)
            .map(|c| Point3::new(c[0] / scale, c[1] / scale, c[2] / scale))
            .collect();
        Ok(LandmarkSet::from_slice(&points))
    }

    fn name(&self) -> &str { "onnx" }
}

// ════════════════════════════════════════════════════════════════════════════
// Spawn helper
// ════════════════════════════════════════════════════════════════════════════

/// Start the inference context.  Like [`spawn_frame_source`], the detector
/// is built on the new thread and a construction error is returned here.
///
/// [`spawn_frame_source`]: crate::capture::spawn_frame_source
pub fn spawn_detector<F>(
    build:   F,
    frames:  Arc<FrameSlot>,
    results: Arc<DetectionSlot>,
    state:   Arc<SharedState>,
) -> Result<JoinHandle<()>>
where
    F: FnOnce() -> Result<Box<dyn HandDetector>> + Send + 'static,
{
    let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);

    let handle = thread::Builder::new()
        .name("inference".into())
        .spawn(move || {
            let mut detector = match build() {
                Ok(d) => {
                    let _ = ready_tx.send(Ok(()));
                    d
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            log::info!("inference started ({})", detector.name());

            let mut last_seq = 0u64;
            let mut failing = false;
            while state.is_running() {
                let Some(stamped) = frames.wait_newer(last_seq, FRAME_WAIT) else {
                    continue;
                };
                last_seq = stamped.seq;
                let frame = stamped.value;

                match detector.detect(&frame) {
                    Ok(hand) => {
                        failing = false;
                        let det = Detection::new(stamped.seq, (frame.width, frame.height), hand);
                        results.publish(Arc::new(det));
                    }
                    Err(e) => {
                        if !failing {
                            log::warn!("inference failed: {} (skipping frames)", e);
                        }
                        failing = true;
                    }
                }
            }
            log::info!("inference stopped");
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(e)
        }
        Err(_) => {
            let _ = handle.join();
            Err(Error::Inference("inference thread exited during startup".into()))
        }
    }
}
