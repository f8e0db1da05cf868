//! Settings file: the same JSON the settings editor writes
//! (`mappings.json`), read once at startup and immutable afterwards.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::actions::{ActionMap, Gesture};
use crate::cooldown::{CooldownWindows, SCROLL_INTERVAL};
use crate::mode::EnabledModes;
use crate::{Error, Result};

/// Swipe threshold in px is this divided by `swipe_sensitivity`.
const SWIPE_SCALE_PX: f32 = 25.0;
/// Pinch threshold in px is this times `pinch_threshold`.
const PINCH_SCALE_PX: f32 = 60.0;

// ── Sections ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureSettings {
    /// 0.1–1.0; higher means a shorter swipe is enough.
    #[serde(default = "default_sensitivity")]
    pub swipe_sensitivity: f32,
    /// 0.1–1.0; scales the pinch distance threshold.
    #[serde(default = "default_pinch_threshold")]
    pub pinch_threshold: f32,
    /// Seconds between two pinches or two swipes (0.5–3.0).
    #[serde(default = "default_gesture_timeout")]
    pub gesture_timeout: f32,
    /// Draw detection feedback on the overlay.
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub enable_feedback: bool,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            swipe_sensitivity: default_sensitivity(),
            pinch_threshold: default_pinch_threshold(),
            gesture_timeout: default_gesture_timeout(),
            enable_feedback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModesConfig {
    #[serde(rename = "Volume Control", default = "default_true", deserialize_with = "flag")]
    pub volume: bool,
    #[serde(rename = "Scroll Page", default = "default_true", deserialize_with = "flag")]
    pub scroll: bool,
    #[serde(rename = "Cursor Mode", default = "default_true", deserialize_with = "flag")]
    pub cursor: bool,
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self { volume: true, scroll: true, cursor: true }
    }
}

// ── Top-level config ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Action names offered by the settings editor.
    #[serde(default = "default_actions")]
    pub actions: Vec<String>,
    #[serde(default)]
    pub mappings: BTreeMap<Gesture, String>,
    #[serde(default)]
    pub modes: ModesConfig,
    #[serde(default)]
    pub gesture_settings: GestureSettings,
    /// Global shortcut that toggles detection, e.g. `ctrl+shift+g`.
    #[serde(default = "default_hotkey")]
    pub hotkey: String,
    /// Let `mappings` rebind Tap and the swipes.  Off by default: the
    /// editor fills unset gestures with its first action.
    #[serde(default, deserialize_with = "flag")]
    pub remap_gestures: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            actions: default_actions(),
            mappings: BTreeMap::new(),
            modes: ModesConfig::default(),
            gesture_settings: GestureSettings::default(),
            hotkey: default_hotkey(),
            remap_gestures: false,
        }
    }
}

// ── Defaults ───────────────────────────────────────────────────────────────

fn default_true() -> bool { true }
fn default_sensitivity() -> f32 { 0.5 }
fn default_pinch_threshold() -> f32 { 0.5 }
fn default_gesture_timeout() -> f32 { 1.0 }
fn default_hotkey() -> String { "ctrl+shift+g".into() }
fn default_actions() -> Vec<String> {
    ["Open Menu", "Close Menu", "Next", "Previous"].map(String::from).to_vec()
}

/// Switches are saved as `1`/`0` by the editor and as `true`/`false` by
/// [`Config::save`]; accept both.
fn flag<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    match Flag::deserialize(de)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(0)  => Ok(false),
        Flag::Int(1)  => Ok(true),
        Flag::Int(n)  => Err(serde::de::Error::custom(format!("expected a switch value (0/1), got {n}"))),
    }
}

// ── Derived values ─────────────────────────────────────────────────────────

impl Config {
    pub fn swipe_threshold_px(&self) -> f32 {
        SWIPE_SCALE_PX / self.gesture_settings.swipe_sensitivity
    }

    pub fn pinch_threshold_px(&self) -> f32 {
        PINCH_SCALE_PX * self.gesture_settings.pinch_threshold
    }

    pub fn cooldown_windows(&self) -> CooldownWindows {
        let timeout = Duration::from_secs_f32(self.gesture_settings.gesture_timeout);
        CooldownWindows { pinch: timeout, swipe: timeout, scroll: SCROLL_INTERVAL }
    }

    pub fn enabled_modes(&self) -> EnabledModes {
        EnabledModes {
            volume: self.modes.volume,
            scroll: self.modes.scroll,
            cursor: self.modes.cursor,
        }
    }

    /// Built-in bindings, or the `mappings` table when `remap_gestures` is
    /// set.  `mappings` is validated either way.
    pub fn action_map(&self) -> Result<ActionMap> {
        let remapped = ActionMap::from_mappings(&self.mappings)?;
        Ok(if self.remap_gestures { remapped } else { ActionMap::default() })
    }

    /// Range-check every setting.  Called once by [`Config::load`].
    pub fn validate(&self) -> Result<()> {
        let g = &self.gesture_settings;
        check_range("swipe_sensitivity", g.swipe_sensitivity, 0.1, 1.0)?;
        check_range("pinch_threshold", g.pinch_threshold, 0.1, 1.0)?;
        check_range("gesture_timeout", g.gesture_timeout, 0.5, 3.0)?;
        if self.hotkey.trim().is_empty() {
            return Err(Error::Config("hotkey is empty".into()));
        }
        self.action_map()?;
        Ok(())
    }
}

fn check_range(name: &str, value: f32, lo: f32, hi: f32) -> Result<()> {
    // Sliders step in tenths; allow float noise at the ends.
    const SLACK: f32 = 1e-4;
    if value.is_finite() && value >= lo - SLACK && value <= hi + SLACK {
        Ok(())
    } else {
        Err(Error::Config(format!("{} = {} is outside {}–{}", name, value, lo, hi)))
    }
}

// ── Load / save ────────────────────────────────────────────────────────────

impl Config {
    /// Load and validate `path`.  A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Config> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {:?}, using defaults", path);
                return Ok(Config::default());
            }
            Err(e) => return Err(e.into()),
        };
        let cfg = Config::from_json(&contents)?;
        log::info!("Loaded settings from {:?}", path);
        Ok(cfg)
    }

    pub fn from_json(contents: &str) -> Result<Config> {
        let cfg: Config = serde_json::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{GestureAction, Key, KeyCombo};

    #[test]
    fn defaults_reproduce_builtin_thresholds() {
        let cfg = Config::default();
        assert_eq!(cfg.swipe_threshold_px(), 50.0);
        assert_eq!(cfg.pinch_threshold_px(), 30.0);
        let w = cfg.cooldown_windows();
        assert_eq!(w.pinch, Duration::from_secs(1));
        assert_eq!(w.swipe, Duration::from_secs(1));
        assert_eq!(w.scroll, Duration::from_millis(50));
        assert_eq!(cfg.hotkey, "ctrl+shift+g");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn editor_file_parses() {
        let json = r#"{
            "actions": ["Open Menu", "Close Menu", "Next", "Previous"],
            "mappings": {
                "Swipe Left": "Previous",
                "Swipe Right": "Next",
                "Tap": "Open Menu",
                "Double Tap": "Close Menu"
            },
            "modes": {"Volume Control": 0, "Scroll Page": 1, "Cursor Mode": 1},
            "gesture_settings": {
                "swipe_sensitivity": 1.0,
                "pinch_threshold": 0.30000000000000004,
                "gesture_timeout": 2.0,
                "enable_feedback": 0
            },
            "hotkey": "ctrl+alt+h"
        }"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.swipe_threshold_px(), 25.0);
        assert!((cfg.pinch_threshold_px() - 18.0).abs() < 1e-3);
        assert_eq!(cfg.cooldown_windows().pinch, Duration::from_secs(2));
        assert!(!cfg.enabled_modes().volume);
        assert!(cfg.enabled_modes().scroll);
        assert!(!cfg.gesture_settings.enable_feedback);
        assert!(!cfg.remap_gestures);
    }

    #[test]
    fn bool_switches_still_parse() {
        let cfg = Config::from_json(
            r#"{"modes": {"Cursor Mode": false}, "gesture_settings": {"enable_feedback": true}}"#,
        ).unwrap();
        assert!(!cfg.modes.cursor);
        assert!(cfg.gesture_settings.enable_feedback);
    }

    #[test]
    fn switch_out_of_range_is_rejected() {
        let err = Config::from_json(r#"{"modes": {"Scroll Page": 2}}"#);
        assert!(matches!(err, Err(Error::Json(_))));
    }

    #[test]
    fn editor_default_mappings_keep_builtin_bindings() {
        // the editor fills every unset gesture with its first action
        let json = r#"{
            "actions": ["Open Menu", "Close Menu", "Next", "Previous"],
            "mappings": {
                "Swipe Left": "Open Menu",
                "Swipe Right": "Open Menu",
                "Tap": "Open Menu",
                "Double Tap": "Open Menu"
            },
            "modes": {"Volume Control": 1, "Scroll Page": 1, "Cursor Mode": 1},
            "hotkey": "ctrl+shift+g"
        }"#;
        let map = Config::from_json(json).unwrap().action_map().unwrap();
        assert_eq!(map.action_for(Gesture::Tap), Some(GestureAction::Select));
        assert_eq!(map.action_for(Gesture::Tap).map(|a| a.combo()), Some(KeyCombo::plain(Key::Space)));
        assert_eq!(map.action_for(Gesture::SwipeRight), Some(GestureAction::Next));
        assert_eq!(map.action_for(Gesture::SwipeLeft), Some(GestureAction::Previous));
        assert_eq!(map.action_for(Gesture::DoubleTap), None);
    }

    #[test]
    fn remap_opt_in_applies_mappings() {
        let json = r#"{"mappings": {"Tap": "Open Menu"}, "remap_gestures": 1}"#;
        let map = Config::from_json(json).unwrap().action_map().unwrap();
        assert_eq!(map.action_for(Gesture::Tap), Some(GestureAction::OpenMenu));
        assert_eq!(map.action_for(Gesture::SwipeRight), Some(GestureAction::Next));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg = Config::from_json(r#"{"gesture_settings": {"gesture_timeout": 0.5}}"#).unwrap();
        assert_eq!(cfg.gesture_settings.swipe_sensitivity, 0.5);
        assert_eq!(cfg.cooldown_windows().swipe, Duration::from_millis(500));
        assert!(cfg.modes.cursor);
        assert_eq!(cfg.actions.len(), 4);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let err = Config::from_json(r#"{"gesture_settings": {"swipe_sensitivity": 0.0}}"#);
        assert!(matches!(err, Err(Error::Config(_))));
        let err = Config::from_json(r#"{"gesture_settings": {"gesture_timeout": 10}}"#);
        assert!(matches!(err, Err(Error::Config(_))));
        let err = Config::from_json(r#"{"hotkey": "  "}"#);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = Config::from_json(r#"{"mappings": {"Tap": "Self Destruct"}}"#);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("gesture_core_no_such_settings.json");
        let _ = std::fs::remove_file(&path);
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("gesture_core_cfg_{}.json", std::process::id()));
        let mut cfg = Config::default();
        cfg.hotkey = "ctrl+f9".into();
        cfg.mappings.insert(Gesture::SwipeRight, "Close Menu".into());
        cfg.remap_gestures = true;
        cfg.save(&path).unwrap();
        let back = Config::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back, cfg);
    }
}
