//! Discrete gestures, the named actions they map to, and the key combos
//! those actions send.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classifier::SwipeDirection;
use crate::{Error, Result};

/// One-shot gestures that can be remapped in the settings file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gesture {
    /// Pinch: thumb tip meets index tip.
    #[serde(rename = "Tap")]
    Tap,
    /// Accepted in settings; no detector produces it yet.
    #[serde(rename = "Double Tap")]
    DoubleTap,
    #[serde(rename = "Swipe Left")]
    SwipeLeft,
    #[serde(rename = "Swipe Right")]
    SwipeRight,
}

impl Gesture {
    pub fn name(self) -> &'static str {
        match self {
            Gesture::Tap        => "Tap",
            Gesture::DoubleTap  => "Double Tap",
            Gesture::SwipeLeft  => "Swipe Left",
            Gesture::SwipeRight => "Swipe Right",
        }
    }
}

impl From<SwipeDirection> for Gesture {
    fn from(dir: SwipeDirection) -> Self {
        match dir {
            SwipeDirection::Left  => Gesture::SwipeLeft,
            SwipeDirection::Right => Gesture::SwipeRight,
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureAction
// ════════════════════════════════════════════════════════════════════════════

/// What a gesture does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureAction {
    Select,
    Next,
    Previous,
    OpenMenu,
    CloseMenu,
}

impl GestureAction {
    pub fn name(self) -> &'static str {
        match self {
            GestureAction::Select    => "Select",
            GestureAction::Next      => "Next",
            GestureAction::Previous  => "Previous",
            GestureAction::OpenMenu  => "Open Menu",
            GestureAction::CloseMenu => "Close Menu",
        }
    }

    pub fn combo(self) -> KeyCombo {
        match self {
            GestureAction::Select    => KeyCombo::plain(Key::Space),
            GestureAction::Next      => KeyCombo::ctrl(Key::Right),
            GestureAction::Previous  => KeyCombo::ctrl(Key::Left),
            GestureAction::OpenMenu  => KeyCombo::plain(Key::Alt),
            GestureAction::CloseMenu => KeyCombo::plain(Key::Escape),
        }
    }
}

impl FromStr for GestureAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let norm: String = s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
        match norm.as_str() {
            "select" | "activate" => Ok(GestureAction::Select),
            "next"                => Ok(GestureAction::Next),
            "previous" | "prev"   => Ok(GestureAction::Previous),
            "openmenu"            => Ok(GestureAction::OpenMenu),
            "closemenu"           => Ok(GestureAction::CloseMenu),
            _ => Err(Error::Config(format!("unknown action {:?}", s))),
        }
    }
}

impl fmt::Display for GestureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Keys
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    Left,
    Right,
    Escape,
    Alt,
}

/// A key, optionally chorded with Ctrl.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub ctrl: bool,
    pub key:  Key,
}

impl KeyCombo {
    pub const fn plain(key: Key) -> Self { KeyCombo { ctrl: false, key } }
    pub const fn ctrl(key: Key) -> Self { KeyCombo { ctrl: true, key } }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        write!(f, "{:?}", self.key)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ActionMap
// ════════════════════════════════════════════════════════════════════════════

/// Resolved gesture → action table.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionMap {
    map: BTreeMap<Gesture, GestureAction>,
}

impl Default for ActionMap {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert(Gesture::Tap,        GestureAction::Select);
        map.insert(Gesture::SwipeRight, GestureAction::Next);
        map.insert(Gesture::SwipeLeft,  GestureAction::Previous);
        ActionMap { map }
    }
}

impl ActionMap {
    /// Defaults overlaid with the settings file's `mappings` table.
    pub fn from_mappings(mappings: &BTreeMap<Gesture, String>) -> Result<Self> {
        let mut out = ActionMap::default();
        for (gesture, action) in mappings {
            out.map.insert(*gesture, action.parse()?);
        }
        Ok(out)
    }

    pub fn action_for(&self, gesture: Gesture) -> Option<GestureAction> {
        self.map.get(&gesture).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builtin_bindings() {
        let m = ActionMap::default();
        assert_eq!(m.action_for(Gesture::Tap).map(|a| a.combo()), Some(KeyCombo::plain(Key::Space)));
        assert_eq!(m.action_for(Gesture::SwipeRight).map(|a| a.combo()), Some(KeyCombo::ctrl(Key::Right)));
        assert_eq!(m.action_for(Gesture::SwipeLeft).map(|a| a.combo()), Some(KeyCombo::ctrl(Key::Left)));
        assert_eq!(m.action_for(Gesture::DoubleTap), None);
    }

    #[test]
    fn action_names_parse_loosely() {
        assert_eq!("Open Menu".parse::<GestureAction>().unwrap(), GestureAction::OpenMenu);
        assert_eq!("close menu".parse::<GestureAction>().unwrap(), GestureAction::CloseMenu);
        assert_eq!("NEXT".parse::<GestureAction>().unwrap(), GestureAction::Next);
        assert!("Launch Rocket".parse::<GestureAction>().is_err());
    }

    #[test]
    fn mappings_override_defaults() {
        let mut raw = BTreeMap::new();
        raw.insert(Gesture::SwipeLeft, "Close Menu".to_string());
        raw.insert(Gesture::DoubleTap, "Open Menu".to_string());
        let m = ActionMap::from_mappings(&raw).unwrap();
        assert_eq!(m.action_for(Gesture::SwipeLeft), Some(GestureAction::CloseMenu));
        assert_eq!(m.action_for(Gesture::SwipeRight), Some(GestureAction::Next));
        assert_eq!(m.action_for(Gesture::DoubleTap), Some(GestureAction::OpenMenu));
    }

    #[test]
    fn gesture_names_round_trip_through_json() {
        let json = serde_json::to_string(&Gesture::SwipeRight).unwrap();
        assert_eq!(json, "\"Swipe Right\"");
        let g: Gesture = serde_json::from_str("\"Double Tap\"").unwrap();
        assert_eq!(g, Gesture::DoubleTap);
    }

    #[test]
    fn combo_display() {
        assert_eq!(KeyCombo::ctrl(Key::Left).to_string(), "ctrl+Left");
        assert_eq!(KeyCombo::plain(Key::Space).to_string(), "Space");
    }
}
