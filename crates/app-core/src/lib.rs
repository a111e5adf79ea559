//! Domain model for the macropad configuration editor.

pub mod ids;
pub mod model;
pub mod names;
pub mod state;

pub use ids::ProfileId;
pub use model::{
    default_icon, empty_keys, ActionSlot, ActionSlots, BitmapPayload, KeyConfig, Preserved, Profile,
    WheelMode, ACTION_SLOTS, KEY_COUNT,
};
pub use names::{create_unique_folder_names, sanitize_profile_name};
pub use state::{AppState, ModelError, SelectedTarget};
