//! Top-level application: startup, the control loop, shutdown.
//!
//! [`ControlContext`] owns everything the control thread mutates (engine,
//! FPS meter, fade, last report) and is driven one detection at a time.
//! [`run`] wires it to the capture, inference and hotkey threads and to the
//! overlay window.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use gesture_core::activation::{Fade, SharedState};
use gesture_core::config::Config;
use gesture_core::dispatch::{ActionDispatcher, InputInjector, VolumeControl};
use gesture_core::engine::{GestureEngine, TickReport};
use gesture_core::landmarks::Detection;
use gesture_core::mode::Mode;
use gesture_core::status::{FpsMeter, StatusLine};

use crate::actuators::{CommandVolume, EnigoInjector};
use crate::capture::{self, CaptureSettings, FrameSlot};
use crate::detector::{self, DetectionSlot, DetectorSettings, HandDetector};
use crate::hotkey::ActivationHotkey;
use crate::overlay::{Overlay, OverlayView};
use crate::sim::SimInput;

/// How long the control loop waits for a new detection before redrawing.
const DETECTION_WAIT: Duration = Duration::from_millis(50);

// ════════════════════════════════════════════════════════════════════════════
// AppOptions
// ════════════════════════════════════════════════════════════════════════════

/// Runtime options that do not live in the settings file.
#[derive(Clone, Debug)]
pub struct AppOptions {
    pub capture:  CaptureSettings,
    pub detector: DetectorSettings,
    /// Hand-landmark model (only used with the `onnx` feature).
    pub model:    Option<PathBuf>,
    pub window:   bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        AppOptions {
            capture:  CaptureSettings::default(),
            detector: DetectorSettings::default(),
            model:    None,
            window:   true,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlContext
// ════════════════════════════════════════════════════════════════════════════

pub struct ControlContext {
    engine:      GestureEngine,
    fps:         FpsMeter,
    fade:        Fade,
    was_active:  bool,
    low_fps:     bool,
    last_report: Option<TickReport>,
    last_det:    Option<Arc<Detection>>,
}

impl ControlContext {
    pub fn new(engine: GestureEngine, now: Instant, active: bool) -> Self {
        ControlContext {
            engine,
            fps:         FpsMeter::default(),
            fade:        Fade::start(now),
            was_active:  active,
            low_fps:     false,
            last_report: None,
            last_det:    None,
        }
    }

    /// One control tick.  `fresh` is a detection not seen before, if any;
    /// without one only the activation edge is tracked.
    pub fn step(&mut self, now: Instant, fresh: Option<Arc<Detection>>, active: bool) {
        if active && !self.was_active {
            self.fade = Fade::start(now);
        }
        self.was_active = active;
        if !active {
            self.last_report = None;
        }

        let Some(det) = fresh else { return };
        self.fps.tick(now);
        let report = self.engine.tick(now, Some(&det), active);
        // nothing to annotate while detection is off
        self.last_report = active.then_some(report);
        self.last_det = Some(det);

        let low = self.status(active).low_fps();
        if low && !self.low_fps {
            log::warn!("frame rate {:.1} fps is below target", self.fps.fps());
        }
        self.low_fps = low;
    }

    pub fn status(&self, active: bool) -> StatusLine {
        StatusLine::new(active, self.engine.mode(), self.fps.fps())
    }

    pub fn mode(&self) -> Mode { self.engine.mode() }
    pub fn fade(&self) -> Fade { self.fade }
    pub fn last_report(&self) -> Option<&TickReport> { self.last_report.as_ref() }
    pub fn last_detection(&self) -> Option<&Detection> { self.last_det.as_deref() }
}

// ════════════════════════════════════════════════════════════════════════════
// Startup helpers
// ════════════════════════════════════════════════════════════════════════════

fn build_dispatcher(cfg: &Config) -> Result<ActionDispatcher> {
    let input: Box<dyn InputInjector> =
        Box::new(EnigoInjector::new().context("input injection unavailable")?);

    let volume: Option<Box<dyn VolumeControl>> = if cfg.modes.volume {
        match CommandVolume::acquire() {
            Ok(v) => Some(Box::new(v)),
            Err(e) => {
                log::warn!("{}; Volume mode disabled", e);
                None
            }
        }
    } else {
        None
    };

    Ok(ActionDispatcher::new(input, volume, cfg.action_map()?))
}

#[cfg(feature = "onnx")]
fn default_model_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("hand_landmark.onnx")))
        .unwrap_or_else(|| "hand_landmark.onnx".into())
}

/// Start the inference thread.  Returns the sender that drives the simulated
/// hand when no model backend is compiled in.
fn start_detector(
    opts:    &AppOptions,
    frames:  Arc<FrameSlot>,
    results: Arc<DetectionSlot>,
    state:   Arc<SharedState>,
) -> gesture_core::Result<(JoinHandle<()>, Option<mpsc::Sender<SimInput>>)> {
    #[cfg(feature = "onnx")]
    {
        use crate::detector::OnnxHandDetector;
        let model = opts.model.clone().unwrap_or_else(default_model_path);
        let settings = opts.detector;
        let handle = detector::spawn_detector(
            move || Ok(Box::new(OnnxHandDetector::new(&model, settings)?) as Box<dyn HandDetector>),
            frames, results, state,
        )?;
        Ok((handle, None))
    }
    #[cfg(not(feature = "onnx"))]
    {
        use crate::detector::SimHandDetector;
        use crate::sim::SimHand;
        if opts.model.is_some() {
            log::warn!("--model ignored: built without the `onnx` feature");
        }
        let (tx, rx) = mpsc::channel();
        let handle = detector::spawn_detector(
            move || Ok(Box::new(SimHandDetector::new(SimHand::new(rx))) as Box<dyn HandDetector>),
            frames, results, state,
        )?;
        Ok((handle, Some(tx)))
    }
}

/// Ctrl-C handler: clears the running flag so the normal shutdown path
/// joins every thread.
fn on_interrupt(state: Arc<SharedState>) -> impl FnMut() + Send + 'static {
    move || {
        log::info!("Interrupted");
        state.stop();
    }
}

/// Windows and macOS deliver hotkey events through the registering thread's
/// event loop, which only the overlay window's `update()` pumps.
fn hotkey_needs_window(window: bool) -> bool {
    !window && cfg!(any(target_os = "windows", target_os = "macos"))
}

fn join_all(handles: Vec<JoinHandle<()>>) {
    for h in handles {
        let name = h.thread().name().unwrap_or("worker").to_string();
        if h.join().is_err() {
            log::error!("{} thread panicked", name);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run until the overlay is closed or the process is interrupted (Ctrl-C).
///
/// Fatal errors (settings, camera, model, input injection) are returned
/// before the control loop starts; any thread already started is stopped and
/// joined first.
pub fn run(cfg: Config, opts: AppOptions) -> Result<()> {
    cfg.validate().context("invalid settings")?;

    let state   = SharedState::new();
    let frames  = Arc::new(FrameSlot::new());
    let results = Arc::new(DetectionSlot::new());

    if let Err(e) = ctrlc::set_handler(on_interrupt(Arc::clone(&state))) {
        log::warn!("cannot install Ctrl-C handler: {}", e);
    }

    let dispatcher = build_dispatcher(&cfg)?;
    let engine = GestureEngine::from_config(&cfg, dispatcher)?;

    // ── Producer threads ──────────────────────────────────────────────────
    let capture_settings = opts.capture;
    let capture = capture::spawn_frame_source(
        move || capture::open_camera(capture_settings),
        Arc::clone(&frames),
        Arc::clone(&state),
    )
    .context("cannot start capture")?;

    let (inference, sim_tx) =
        match start_detector(&opts, Arc::clone(&frames), Arc::clone(&results), Arc::clone(&state)) {
            Ok(started) => started,
            Err(e) => {
                state.stop();
                join_all(vec![capture]);
                return Err(e).context("cannot start landmark detection");
            }
        };
    let mut handles = vec![capture, inference];

    // ── Hotkey ────────────────────────────────────────────────────────────
    let hotkey = match ActivationHotkey::register(&cfg.hotkey) {
        Ok(hk) => Some(hk),
        Err(e) => {
            log::warn!("{:#}. Continuing without activation hotkey.", e);
            None
        }
    };
    if let Some(hk) = &hotkey {
        match hk.spawn_listener(Arc::clone(&state)) {
            Ok(h) => handles.push(h),
            Err(e) => log::warn!("{:#}", e),
        }
        if hotkey_needs_window(opts.window) {
            log::warn!("Hotkey {} will not fire without the overlay window on this platform", cfg.hotkey);
        }
    }

    // ── Overlay ───────────────────────────────────────────────────────────
    let mut overlay = if opts.window {
        let w = opts.capture.width as usize;
        let h = opts.capture.height as usize;
        match Overlay::new(w, h, sim_tx) {
            Ok(o) => Some(o),
            Err(e) => {
                state.stop();
                join_all(handles);
                return Err(e);
            }
        }
    } else {
        None
    };

    log::info!("Running. Hotkey {} toggles detection.", cfg.hotkey);

    let mut ctx = ControlContext::new(engine, Instant::now(), state.is_active());
    control_loop(
        &mut ctx,
        &state,
        &results,
        &frames,
        overlay.as_mut(),
        cfg.gesture_settings.enable_feedback,
    );

    // ── Shutdown ──────────────────────────────────────────────────────────
    log::info!("Shutting down");
    state.stop();
    join_all(handles);
    drop(hotkey);
    Ok(())
}

/// Drive `ctx` from the detection slot until the running flag drops or the
/// overlay is closed.
fn control_loop(
    ctx:         &mut ControlContext,
    state:       &SharedState,
    results:     &DetectionSlot,
    frames:      &FrameSlot,
    mut overlay: Option<&mut Overlay>,
    feedback:    bool,
) {
    let mut last_seq = 0u64;
    while state.is_running() {
        if let Some(ov) = overlay.as_mut() {
            if !ov.poll_input() {
                state.stop();
                break;
            }
        }

        let fresh = results.wait_newer(last_seq, DETECTION_WAIT).map(|s| {
            last_seq = s.seq;
            s.value
        });
        let now = Instant::now();
        let active = state.is_active();
        ctx.step(now, fresh, active);

        if let Some(ov) = overlay.as_mut() {
            let frame = frames.latest();
            ov.render(&OverlayView {
                frame:     frame.as_ref().map(|s| s.value.as_ref()),
                detection: ctx.last_detection(),
                report:    ctx.last_report(),
                status:    ctx.status(active),
                alpha:     ctx.fade().alpha(now),
                feedback,
            });
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
