//! FrameSource — the capture context.
//!
//! Opens the camera inside its own thread (some backends are not `Send`),
//! reports the open result back before the loop starts, then grabs, mirrors
//! and publishes frames until the running flag drops.  The producer never
//! waits for a consumer.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gesture_core::activation::SharedState;
use gesture_core::frame::{Frame, PixelOrder};
use gesture_core::slot::LatestSlot;
use gesture_core::{Error, Result};

/// The latest-frame slot shared by capture and inference.
pub type FrameSlot = LatestSlot<Arc<Frame>>;

// ════════════════════════════════════════════════════════════════════════════
// CaptureSettings
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureSettings {
    pub index:  u32,
    pub width:  u32,
    pub height: u32,
    pub fps:    u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        CaptureSettings { index: 0, width: 640, height: 480, fps: 30 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Camera trait — unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

pub trait Camera {
    /// Block until the next frame is available.
    fn grab(&mut self) -> Result<Frame>;
    fn name(&self) -> &str;
}

/// Open the camera selected at build time.
pub fn open_camera(settings: CaptureSettings) -> Result<Box<dyn Camera>> {
    #[cfg(feature = "camera")]
    {
        Ok(Box::new(NokhwaCamera::open(settings)?))
    }
    #[cfg(not(feature = "camera"))]
    {
        Ok(Box::new(SimCamera::new(settings)))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimCamera — synthetic frames (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Slowly drifting gradient at the requested resolution and rate.
pub struct SimCamera {
    width:    usize,
    height:   usize,
    period:   Duration,
    next_due: Instant,
    tick:     u32,
}

impl SimCamera {
    pub fn new(settings: CaptureSettings) -> Self {
        let fps = settings.fps.max(1);
        SimCamera {
            width:    settings.width as usize,
            height:   settings.height as usize,
            period:   Duration::from_secs(1) / fps,
            next_due: Instant::now(),
            tick:     0,
        }
    }

    fn render(&self) -> Frame {
        let (w, h) = (self.width, self.height);
        let shift = (self.tick % 256) as usize;
        let mut pixels = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            for x in 0..w {
                let r = (x * 64 / w.max(1)) as u8 + 16;
                let g = (y * 64 / h.max(1)) as u8 + 16;
                let b = ((x + shift) % 256 / 8) as u8 + 24;
                // BGR, like most capture APIs
                pixels.extend_from_slice(&[b, g, r]);
            }
        }
        Frame::new(w, h, PixelOrder::Bgr, pixels)
    }
}

impl Camera for SimCamera {
    fn grab(&mut self) -> Result<Frame> {
        let now = Instant::now();
        if self.next_due > now {
            thread::sleep(self.next_due - now);
        }
        self.next_due = self.next_due.max(now) + self.period;
        self.tick = self.tick.wrapping_add(1);
        Ok(self.render())
    }

    fn name(&self) -> &str { "synthetic" }
}

// ════════════════════════════════════════════════════════════════════════════
// NokhwaCamera — real webcam (feature = "camera")
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "camera")]
pub struct NokhwaCamera {
    camera: nokhwa::Camera,
    name:   String,
}

#[cfg(feature = "camera")]
impl NokhwaCamera {
    pub fn open(settings: CaptureSettings) -> Result<Self> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{
            CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
        };

        let wanted = CameraFormat::new(
            Resolution::new(settings.width, settings.height),
            FrameFormat::MJPEG,
            settings.fps,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(wanted));
        let mut camera = nokhwa::Camera::new(CameraIndex::Index(settings.index), requested)
            .map_err(|e| Error::DeviceUnavailable(format!("camera {}: {}", settings.index, e)))?;
        camera
            .open_stream()
            .map_err(|e| Error::DeviceUnavailable(format!("camera {}: {}", settings.index, e)))?;
        let name = camera.info().human_name();
        let res = camera.resolution();
        log::info!("Opened {} at {}x{} {} fps", name, res.width(), res.height(), camera.frame_rate());
        Ok(NokhwaCamera { camera, name })
    }
}

#[cfg(feature = "camera")]
impl Camera for NokhwaCamera {
    fn grab(&mut self) -> Result<Frame> {
        use nokhwa::pixel_format::RgbFormat;

        let buffer = self
            .camera
            .frame()
            .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;
        let image = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;
        let (w, h) = (image.width() as usize, image.height() as usize);
        Ok(Frame::new(w, h, PixelOrder::Rgb, image.into_raw()))
    }

    fn name(&self) -> &str { &self.name }
}

#[cfg(feature = "camera")]
impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("closing camera: {}", e);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Spawn helper
// ════════════════════════════════════════════════════════════════════════════

/// Start the capture context.
///
/// `open` runs on the new thread; its error is returned here and no loop is
/// started.  After that, grab failures are logged (once per streak) and
/// skipped.
pub fn spawn_frame_source<F>(
    open:  F,
    slot:  Arc<FrameSlot>,
    state: Arc<SharedState>,
) -> Result<JoinHandle<()>>
where
    F: FnOnce() -> Result<Box<dyn Camera>> + Send + 'static,
{
    let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);

    let handle = thread::Builder::new()
        .name("capture".into())
        .spawn(move || {
            let mut camera = match open() {
                Ok(c) => {
                    let _ = ready_tx.send(Ok(()));
                    c
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            log::info!("capture started ({})", camera.name());

            let mut failing = false;
            while state.is_running() {
                match camera.grab() {
                    Ok(mut frame) => {
                        failing = false;
                        frame.mirror_horizontal();
                        slot.publish(Arc::new(frame));
                    }
                    Err(e) => {
                        if !failing {
                            log::warn!("frame grab failed: {} (further failures suppressed)", e);
                        }
                        failing = true;
                        thread::sleep(Duration::from_millis(10));
                    }
                }
            }
            log::info!("capture stopped");
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(e)
        }
        Err(_) => {
            let _ = handle.join();
            Err(Error::DeviceUnavailable("capture thread exited during startup".into()))
        }
    }
}
