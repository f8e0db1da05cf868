//! Error types shared by the core and the runtime crate.

use thiserror::Error;

/// Result alias for gesture-controller operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong, split by how the caller must react.
///
/// `DeviceUnavailable`, `AudioUnavailable` and `Config` are startup
/// failures.  `Inference` and `Actuator` are per-tick and never escape the
/// tick that produced them.
#[derive(Debug, Error)]
pub enum Error {
    /// Capture device could not be opened (fatal).
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Audio endpoint could not be acquired (disables Volume mode).
    #[error("audio endpoint unavailable: {0}")]
    AudioUnavailable(String),

    /// Landmark inference failed for one frame.
    #[error("inference error: {0}")]
    Inference(String),

    /// An actuator call (pointer, scroll, key, volume) failed.
    #[error("actuator error: {0}")]
    Actuator(String),

    /// Settings failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file error: {0}")]
    Json(#[from] serde_json::Error),
}
