//! Turns a captured key press into action slots.

use app_core::{ActionSlot, ActionSlots, ACTION_SLOTS};
use serde::{Deserialize, Serialize};

use crate::keycodes::{self, ALT, CTRL, ESCAPE, LEFT_WINDOWS, NONE, SHIFT};

/// At most this many modifiers go into a chord; the last slot is kept for the main key.
const MAX_CHORD_MODIFIERS: usize = ACTION_SLOTS - 1;

const TOO_MANY_MODIFIERS: &str =
    "Only up to 3 simultaneous keys supported. Capturing first 2 modifiers and main key.";

/// A key press as reported by the host, independent of any UI toolkit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key_code: u32,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key_code: u32) -> Self {
        Self {
            key_code,
            ..Self::default()
        }
    }

    fn any_modifier(&self) -> bool {
        self.ctrl || self.shift || self.alt || self.meta
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedKeyEvent {
    pub key_code: u32,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    pub name: &'static str,
}

/// Folds Cmd into Ctrl: a meta press counts as Ctrl, and only stays Meta
/// when Ctrl isn't also down.
pub fn normalize(event: &KeyEvent) -> NormalizedKeyEvent {
    NormalizedKeyEvent {
        key_code: event.key_code,
        ctrl: event.ctrl || event.meta,
        shift: event.shift,
        alt: event.alt,
        meta: event.meta && !event.ctrl,
        name: keycodes::name(event.key_code).unwrap_or("Unknown"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChordCapture {
    pub actions: ActionSlots,
    pub warning: Option<String>,
}

/// Modifiers first (Ctrl, Shift, Alt, Meta; at most two), then the main key.
pub fn build_chord_actions(event: &KeyEvent) -> ChordCapture {
    let normalized = normalize(event);

    let modifiers: Vec<u32> = [
        (normalized.ctrl, CTRL),
        (normalized.shift, SHIFT),
        (normalized.alt, ALT),
        (normalized.meta, LEFT_WINDOWS),
    ]
    .into_iter()
    .filter_map(|(down, code)| down.then_some(code))
    .collect();

    let mut actions: ActionSlots = [None; ACTION_SLOTS];
    let mut slot = 0;

    for code in modifiers.iter().take(MAX_CHORD_MODIFIERS) {
        actions[slot] = Some(ActionSlot::new(0, *code));
        slot += 1;
    }

    if !keycodes::is_modifier(normalized.key_code) && normalized.key_code != NONE {
        actions[slot] = Some(ActionSlot::new(0, normalized.key_code));
    }

    let warning = (modifiers.len() > MAX_CHORD_MODIFIERS).then(|| TOO_MANY_MODIFIERS.to_string());

    ChordCapture { actions, warning }
}

/// Whether a press should end capture mode and be recorded.
///
/// Bare modifier presses are ignored, and Escape is reserved for cancelling.
pub fn is_valid_capture_key(event: &KeyEvent) -> bool {
    if keycodes::is_modifier(event.key_code) && !event.any_modifier() {
        return false;
    }
    if event.key_code == ESCAPE {
        return false;
    }
    event.key_code > NONE
}
