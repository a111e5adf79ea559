//! Profile / key / action model for the six-key macropad.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ids::ProfileId;

/// Physical keys per profile.
pub const KEY_COUNT: usize = 6;

/// Action steps per key.
pub const ACTION_SLOTS: usize = 3;

pub const DEFAULT_PROFILE_NAME: &str = "Profile 1";

const DEFAULT_ICONS: [&str; KEY_COUNT] = ["⬆", "⬇", "📋", "⌨", "🖱", "⚙"];
const FALLBACK_ICON: &str = "⚙";

/// Display glyph for a key position.
pub fn default_icon(index: usize) -> &'static str {
    DEFAULT_ICONS.get(index).copied().unwrap_or(FALLBACK_ICON)
}

/// One timed key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionSlot {
    pub delay_ms: u32,
    pub keycode: u32,
}

impl ActionSlot {
    pub fn new(delay_ms: u32, keycode: u32) -> Self {
        Self { delay_ms, keycode }
    }

    /// `0,0` is what the device writes for an unused slot.
    pub fn is_blank(&self) -> bool {
        self.delay_ms == 0 && self.keycode == 0
    }
}

impl fmt::Display for ActionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.delay_ms, self.keycode)
    }
}

pub type ActionSlots = [Option<ActionSlot>; ACTION_SLOTS];

/// Rotary wheel behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WheelMode {
    #[default]
    Clicky,
    Twist,
    Momentum,
}

impl WheelMode {
    pub const ALL: [WheelMode; 3] = [WheelMode::Clicky, WheelMode::Twist, WheelMode::Momentum];

    pub fn as_str(&self) -> &'static str {
        match self {
            WheelMode::Clicky => "Clicky",
            WheelMode::Twist => "Twist",
            WheelMode::Momentum => "Momentum",
        }
    }
}

impl fmt::Display for WheelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown wheel mode: {0:?}")]
pub struct UnknownWheelMode(pub String);

impl FromStr for WheelMode {
    type Err = UnknownWheelMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WheelMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownWheelMode(s.to_string()))
    }
}

/// A structured value that may also carry the XML it was read from.
///
/// The raw fragment is only a fallback: setting a new value drops it, so
/// edits made through the model always win over what was imported.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preserved<T> {
    pub value: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl<T> Preserved<T> {
    pub fn new(value: T) -> Self {
        Self { value, raw: None }
    }

    pub fn with_raw(value: T, raw: Option<String>) -> Self {
        Self { value, raw }
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.raw = None;
    }
}

/// Bitmap bytes attached to a key, in any of the forms the editor hands over.
///
/// Payloads are kept undecoded; decoding happens only when a preview is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitmapPayload {
    Bytes(Vec<u8>),
    Shared(Arc<[u8]>),
    /// Read lazily when the archive is written.
    File(PathBuf),
}

impl BitmapPayload {
    pub fn load(&self) -> std::io::Result<Cow<'_, [u8]>> {
        match self {
            BitmapPayload::Bytes(b) => Ok(Cow::Borrowed(b)),
            BitmapPayload::Shared(b) => Ok(Cow::Borrowed(b)),
            BitmapPayload::File(path) => Ok(Cow::Owned(std::fs::read(path)?)),
        }
    }
}

impl From<Vec<u8>> for BitmapPayload {
    fn from(bytes: Vec<u8>) -> Self {
        BitmapPayload::Bytes(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyConfig {
    pub label: String,
    pub icon: String,
    #[serde(skip)]
    pub bmp: Option<BitmapPayload>,
    pub actions: Preserved<ActionSlots>,
}

impl KeyConfig {
    pub fn for_index(index: usize) -> Self {
        Self {
            label: String::new(),
            icon: default_icon(index).to_string(),
            bmp: None,
            actions: Preserved::new([None; ACTION_SLOTS]),
        }
    }

    /// Blank `0,0` slots are stored as empty.
    pub fn set_actions(&mut self, actions: ActionSlots) {
        self.actions.set(actions.map(|slot| slot.filter(|a| !a.is_blank())));
    }

    /// Filled slots in execution order. A blank `0,0` slot never counts.
    pub fn assigned_actions(&self) -> impl Iterator<Item = &ActionSlot> {
        self.actions.value.iter().flatten().filter(|a| !a.is_blank())
    }

    pub fn has_actions(&self) -> bool {
        self.assigned_actions().next().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub wheel_mode: Preserved<WheelMode>,
    pub wheel_key: Preserved<u32>,
    pub keys: [KeyConfig; KEY_COUNT],
}

impl Profile {
    /// Empty profile: six blank keys, Clicky wheel on key code 0.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProfileId::generate(),
            name: name.into(),
            wheel_mode: Preserved::default(),
            wheel_key: Preserved::default(),
            keys: empty_keys(),
        }
    }

    pub fn set_wheel_mode(&mut self, mode: WheelMode) {
        self.wheel_mode.set(mode);
    }

    pub fn set_wheel_key(&mut self, keycode: u32) {
        self.wheel_key.set(keycode);
    }

    pub fn key(&self, index: usize) -> Option<&KeyConfig> {
        self.keys.get(index)
    }

    pub fn key_mut(&mut self, index: usize) -> Option<&mut KeyConfig> {
        self.keys.get_mut(index)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE_NAME)
    }
}

pub fn empty_keys() -> [KeyConfig; KEY_COUNT] {
    std::array::from_fn(KeyConfig::for_index)
}
