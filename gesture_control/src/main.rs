//! gesture_control — entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;

use gesture_control::app::{run, AppOptions};
use gesture_control::capture::CaptureSettings;
use gesture_control::detector::DetectorSettings;
use gesture_core::config::Config;

const SETTINGS_FILE: &str = "mappings.json";

#[derive(Parser, Debug)]
#[command(name = "gesture_control", version, about = "Control the desktop with hand gestures")]
struct Args {
    /// Settings file (default: mappings.json in the user config directory)
    #[arg(long, env = "GESTURE_CONTROL_CONFIG")]
    config: Option<PathBuf>,

    /// Camera index
    #[arg(long, default_value_t = 0)]
    camera: u32,

    /// Capture width
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Capture height
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Capture frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Hand-landmark ONNX model (`onnx` builds)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Run without the overlay window
    #[arg(long)]
    no_window: bool,

    /// Write the default settings to the settings path and exit
    #[arg(long)]
    write_default_config: bool,
}

/// `--config`, else the platform config directory, else the working
/// directory.
fn settings_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| {
            ProjectDirs::from("", "", "gesture_control")
                .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
        })
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let args = Args::parse();
    let path = settings_path(args.config);

    if args.write_default_config {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        Config::default()
            .save(&path)
            .with_context(|| format!("write {}", path.display()))?;
        log::info!("Wrote default settings to {}", path.display());
        return Ok(());
    }

    let cfg = Config::load(&path).with_context(|| format!("load settings {}", path.display()))?;

    #[cfg(feature = "camera")]
    log::info!("Capture: camera {}", args.camera);
    #[cfg(not(feature = "camera"))]
    log::info!("Capture: simulation  (use --features camera for a webcam)");

    let opts = AppOptions {
        capture: CaptureSettings {
            index:  args.camera,
            width:  args.width,
            height: args.height,
            fps:    args.fps,
        },
        detector: DetectorSettings::default(),
        model:    args.model,
        window:   !args.no_window,
    };

    if let Err(e) = run(cfg, opts) {
        log::error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
