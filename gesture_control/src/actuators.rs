//! Actuator backends: synthetic input through `enigo`, system volume through
//! the platform mixer command.

use std::process::Command;

use enigo::{Axis, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};

use gesture_core::actions::{Key, KeyCombo};
use gesture_core::dispatch::{InputInjector, VolumeControl};
use gesture_core::{Error, Result};

// ════════════════════════════════════════════════════════════════════════════
// EnigoInjector
// ════════════════════════════════════════════════════════════════════════════

pub struct EnigoInjector {
    enigo:  Enigo,
    screen: (u32, u32),
}

impl EnigoInjector {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| Error::Actuator(format!("failed to init enigo: {e}")))?;
        let (w, h) = enigo
            .main_display()
            .map_err(|e| Error::Actuator(format!("failed to query display: {e}")))?;
        log::info!("Input injection ready, screen {}x{}", w, h);
        Ok(EnigoInjector { enigo, screen: (w.max(1) as u32, h.max(1) as u32) })
    }

    fn key(&mut self, key: enigo::Key, dir: Direction) -> Result<()> {
        self.enigo
            .key(key, dir)
            .map_err(|e| Error::Actuator(format!("key {key:?}: {e}")))
    }
}

fn enigo_key(key: Key) -> enigo::Key {
    match key {
        Key::Space  => enigo::Key::Space,
        Key::Left   => enigo::Key::LeftArrow,
        Key::Right  => enigo::Key::RightArrow,
        Key::Escape => enigo::Key::Escape,
        Key::Alt    => enigo::Key::Alt,
    }
}

impl InputInjector for EnigoInjector {
    fn move_pointer(&mut self, x: i32, y: i32) -> Result<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| Error::Actuator(format!("move pointer: {e}")))
    }

    fn scroll(&mut self, delta: i32) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        // enigo scrolls down for positive lengths
        self.enigo
            .scroll(-delta, Axis::Vertical)
            .map_err(|e| Error::Actuator(format!("scroll: {e}")))
    }

    fn send_key(&mut self, combo: KeyCombo) -> Result<()> {
        if combo.ctrl {
            self.key(enigo::Key::Control, Direction::Press)?;
            let res = self.key(enigo_key(combo.key), Direction::Click);
            // always release the modifier, even if the click failed
            self.key(enigo::Key::Control, Direction::Release)?;
            res
        } else {
            self.key(enigo_key(combo.key), Direction::Click)
        }
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn name(&self) -> &str { "enigo" }
}

// ════════════════════════════════════════════════════════════════════════════
// CommandVolume — master volume via pactl (Linux) / osascript (macOS)
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mixer {
    Pactl,
    Osascript,
}

/// Master output volume in percent (native range `0..=100`).
pub struct CommandVolume {
    mixer: Mixer,
    /// Last level actually sent, rounded; repeats are skipped.
    last:  Option<u32>,
}

impl CommandVolume {
    /// Probe the platform mixer.  Fails with `AudioUnavailable` when there is
    /// none or it does not answer.
    pub fn acquire() -> Result<Self> {
        let mixer = if cfg!(target_os = "macos") {
            Mixer::Osascript
        } else if cfg!(target_os = "linux") {
            Mixer::Pactl
        } else {
            return Err(Error::AudioUnavailable("no mixer backend for this platform".into()));
        };

        let probe = match mixer {
            Mixer::Pactl     => Command::new("pactl").args(["get-sink-volume", "@DEFAULT_SINK@"]).output(),
            Mixer::Osascript => Command::new("osascript").args(["-e", "output volume of (get volume settings)"]).output(),
        };
        match probe {
            Ok(out) if out.status.success() => {
                log::info!("Audio endpoint acquired ({:?})", mixer);
                Ok(CommandVolume { mixer, last: None })
            }
            Ok(out) => Err(Error::AudioUnavailable(
                String::from_utf8_lossy(&out.stderr).trim().to_string(),
            )),
            Err(e) => Err(Error::AudioUnavailable(e.to_string())),
        }
    }

    fn command(&self, percent: u32) -> Command {
        match self.mixer {
            Mixer::Pactl => {
                let mut c = Command::new("pactl");
                c.args(["set-sink-volume", "@DEFAULT_SINK@", &format!("{percent}%")]);
                c
            }
            Mixer::Osascript => {
                let mut c = Command::new("osascript");
                c.args(["-e", &format!("set volume output volume {percent}")]);
                c
            }
        }
    }
}

impl VolumeControl for CommandVolume {
    fn range(&self) -> (f32, f32) {
        (0.0, 100.0)
    }

    fn set_level(&mut self, level: f32) -> Result<()> {
        let percent = level.round().clamp(0.0, 100.0) as u32;
        if self.last == Some(percent) {
            return Ok(());
        }
        let status = self
            .command(percent)
            .status()
            .map_err(|e| Error::Actuator(format!("volume: {e}")))?;
        if !status.success() {
            return Err(Error::Actuator(format!("volume command exited with {status}")));
        }
        self.last = Some(percent);
        Ok(())
    }

    fn name(&self) -> &str {
        match self.mixer {
            Mixer::Pactl     => "pactl",
            Mixer::Osascript => "osascript",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_mapping_covers_action_keys() {
        assert_eq!(enigo_key(Key::Space), enigo::Key::Space);
        assert_eq!(enigo_key(Key::Left), enigo::Key::LeftArrow);
        assert_eq!(enigo_key(Key::Right), enigo::Key::RightArrow);
        assert_eq!(enigo_key(Key::Escape), enigo::Key::Escape);
        assert_eq!(enigo_key(Key::Alt), enigo::Key::Alt);
    }

    #[test]
    fn pactl_command_uses_percent() {
        let v = CommandVolume { mixer: Mixer::Pactl, last: None };
        let c = v.command(42);
        let args: Vec<_> = c.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(c.get_program(), "pactl");
        assert_eq!(args, ["set-sink-volume", "@DEFAULT_SINK@", "42%"]);
    }

    #[test]
    fn unchanged_level_is_not_resent() {
        // `last` already matches, so no process is spawned
        let mut v = CommandVolume { mixer: Mixer::Pactl, last: Some(30) };
        assert!(v.set_level(30.2).is_ok());
        assert_eq!(v.range(), (0.0, 100.0));
    }
}
