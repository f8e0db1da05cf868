//! Debounce gates for pinch, swipe and scroll.

use std::time::{Duration, Instant};

pub const PINCH_COOLDOWN:  Duration = Duration::from_secs(1);
pub const SWIPE_COOLDOWN:  Duration = Duration::from_secs(1);
/// Scroll is continuous; this only caps the repeat rate.
pub const SCROLL_INTERVAL: Duration = Duration::from_millis(50);

/// True when strictly more than `window` has passed since `last`.
/// A gate that never fired is always eligible.
pub fn eligible(now: Instant, last: Option<Instant>, window: Duration) -> bool {
    match last {
        None       => true,
        Some(last) => now.saturating_duration_since(last) > window,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Pinch,
    Swipe,
    Scroll,
}

/// Cooldown window per gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CooldownWindows {
    pub pinch:  Duration,
    pub swipe:  Duration,
    pub scroll: Duration,
}

impl Default for CooldownWindows {
    fn default() -> Self {
        CooldownWindows {
            pinch:  PINCH_COOLDOWN,
            swipe:  SWIPE_COOLDOWN,
            scroll: SCROLL_INTERVAL,
        }
    }
}

impl CooldownWindows {
    pub fn window(&self, gate: Gate) -> Duration {
        match gate {
            Gate::Pinch  => self.pinch,
            Gate::Swipe  => self.swipe,
            Gate::Scroll => self.scroll,
        }
    }
}

/// Last firing time of each gate.  Owned by the control context only.
#[derive(Clone, Debug, Default)]
pub struct CooldownTimers {
    windows:     CooldownWindows,
    last_pinch:  Option<Instant>,
    last_swipe:  Option<Instant>,
    last_scroll: Option<Instant>,
}

impl CooldownTimers {
    pub fn new(windows: CooldownWindows) -> Self {
        CooldownTimers { windows, ..Default::default() }
    }

    pub fn windows(&self) -> &CooldownWindows { &self.windows }

    pub fn last(&self, gate: Gate) -> Option<Instant> {
        match gate {
            Gate::Pinch  => self.last_pinch,
            Gate::Swipe  => self.last_swipe,
            Gate::Scroll => self.last_scroll,
        }
    }

    pub fn is_eligible(&self, gate: Gate, now: Instant) -> bool {
        eligible(now, self.last(gate), self.windows.window(gate))
    }

    /// Record that `gate` fired at `now`.  Timestamps never move backwards.
    pub fn record(&mut self, gate: Gate, now: Instant) {
        let slot = match gate {
            Gate::Pinch  => &mut self.last_pinch,
            Gate::Swipe  => &mut self.last_swipe,
            Gate::Scroll => &mut self.last_scroll,
        };
        *slot = Some(slot.map_or(now, |prev| prev.max(now)));
    }

    /// Check and record in one step.  Returns whether the gate opened.
    pub fn try_fire(&mut self, gate: Gate, now: Instant) -> bool {
        if self.is_eligible(gate, now) {
            self.record(gate, now);
            true
        } else {
            false
        }
    }
}
