//! Global activation hotkey — the hotkey-listener context.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

use gesture_core::activation::{ActivationToggle, SharedState};

/// How often the listener re-checks the running flag while idle.
const POLL: Duration = Duration::from_millis(100);

/// Parse a shortcut string like `ctrl+shift+g` into a [`HotKey`].
pub fn parse_shortcut(s: &str) -> Result<HotKey> {
    let mut modifiers = Modifiers::empty();
    let mut key_code: Option<Code> = None;

    for token in s.split('+') {
        let token = token.trim();
        match token.to_lowercase().as_str() {
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "alt" | "option" => modifiers |= Modifiers::ALT,
            "shift" => modifiers |= Modifiers::SHIFT,
            "super" | "win" | "meta" | "cmd" => modifiers |= Modifiers::SUPER,
            _ => {
                if key_code.is_some() {
                    anyhow::bail!("multiple key codes in shortcut: {s:?}");
                }
                key_code = Some(parse_key_code(token)?);
            }
        }
    }

    let code = key_code.with_context(|| format!("no key code found in shortcut: {s:?}"))?;
    let mods = if modifiers.is_empty() { None } else { Some(modifiers) };
    Ok(HotKey::new(mods, code))
}

const LETTERS: [Code; 26] = [
    Code::KeyA, Code::KeyB, Code::KeyC, Code::KeyD, Code::KeyE, Code::KeyF, Code::KeyG,
    Code::KeyH, Code::KeyI, Code::KeyJ, Code::KeyK, Code::KeyL, Code::KeyM, Code::KeyN,
    Code::KeyO, Code::KeyP, Code::KeyQ, Code::KeyR, Code::KeyS, Code::KeyT, Code::KeyU,
    Code::KeyV, Code::KeyW, Code::KeyX, Code::KeyY, Code::KeyZ,
];

const DIGITS: [Code; 10] = [
    Code::Digit0, Code::Digit1, Code::Digit2, Code::Digit3, Code::Digit4,
    Code::Digit5, Code::Digit6, Code::Digit7, Code::Digit8, Code::Digit9,
];

const FUNCTION_KEYS: [Code; 12] = [
    Code::F1, Code::F2, Code::F3, Code::F4, Code::F5, Code::F6,
    Code::F7, Code::F8, Code::F9, Code::F10, Code::F11, Code::F12,
];

/// Map a key name to a `Code` variant.
fn parse_key_code(token: &str) -> Result<Code> {
    let lower = token.to_lowercase();
    let mut chars = lower.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_lowercase() {
            return Ok(LETTERS[(ch as u8 - b'a') as usize]);
        }
        if ch.is_ascii_digit() {
            return Ok(DIGITS[(ch as u8 - b'0') as usize]);
        }
    }

    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<usize>().ok()) {
        if (1..=12).contains(&n) {
            return Ok(FUNCTION_KEYS[n - 1]);
        }
    }

    match lower.as_str() {
        "space" => Ok(Code::Space),
        "enter" | "return" => Ok(Code::Enter),
        "tab" => Ok(Code::Tab),
        "escape" | "esc" => Ok(Code::Escape),
        "backspace" => Ok(Code::Backspace),
        "home" => Ok(Code::Home),
        "end" => Ok(Code::End),
        "pageup" => Ok(Code::PageUp),
        "pagedown" => Ok(Code::PageDown),
        "up" => Ok(Code::ArrowUp),
        "down" => Ok(Code::ArrowDown),
        "left" => Ok(Code::ArrowLeft),
        "right" => Ok(Code::ArrowRight),
        _ => anyhow::bail!("unknown key: {token:?}"),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Registration + listener
// ════════════════════════════════════════════════════════════════════════════

/// A registered shortcut.  Unregisters on drop.
pub struct ActivationHotkey {
    manager:  GlobalHotKeyManager,
    hotkey:   HotKey,
    shortcut: String,
}

impl ActivationHotkey {
    pub fn register(shortcut: &str) -> Result<Self> {
        let hotkey = parse_shortcut(shortcut)?;
        let manager = GlobalHotKeyManager::new().context("create hotkey manager")?;
        manager
            .register(hotkey)
            .with_context(|| format!("register hotkey {shortcut:?}"))?;
        log::info!("Global hotkey registered: {}", shortcut);
        Ok(ActivationHotkey { manager, hotkey, shortcut: shortcut.to_string() })
    }

    pub fn id(&self) -> u32 {
        self.hotkey.id()
    }

    /// Start the listener context: every press of this hotkey flips the
    /// activation flag.  Exits when the running flag drops.
    ///
    /// On Windows and macOS events only arrive while the registering thread
    /// pumps its event loop (the overlay window does); headless, the hotkey
    /// never fires there.
    pub fn spawn_listener(&self, state: Arc<SharedState>) -> Result<JoinHandle<()>> {
        let id = self.id();
        let toggle = ActivationToggle::new(Arc::clone(&state));
        let handle = thread::Builder::new()
            .name("hotkey".into())
            .spawn(move || {
                let events = GlobalHotKeyEvent::receiver();
                while state.is_running() {
                    if let Ok(event) = events.recv_timeout(POLL) {
                        if event.id() == id && event.state() == HotKeyState::Pressed {
                            toggle.fire();
                        }
                    }
                }
                log::debug!("hotkey listener stopped");
            })
            .context("spawn hotkey listener")?;
        Ok(handle)
    }
}

impl Drop for ActivationHotkey {
    fn drop(&mut self) {
        if let Err(e) = self.manager.unregister(self.hotkey) {
            log::warn!("unregister hotkey {:?}: {}", self.shortcut, e);
        }
    }
}
