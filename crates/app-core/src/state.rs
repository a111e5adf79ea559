use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ids::ProfileId;
use crate::model::{Profile, KEY_COUNT};
use crate::names::next_profile_name;

/// What the editor panel is currently pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectedTarget {
    Wheel,
    Key { index: usize },
}

impl Default for SelectedTarget {
    fn default() -> Self {
        SelectedTarget::Key { index: 0 }
    }
}

impl SelectedTarget {
    pub fn is_wheel(&self) -> bool {
        matches!(self, SelectedTarget::Wheel)
    }

    pub fn key_index(&self) -> Option<usize> {
        match self {
            SelectedTarget::Key { index } => Some(*index),
            SelectedTarget::Wheel => None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("profile not found: {0}")]
    UnknownProfile(ProfileId),
    #[error("at least one profile must remain")]
    LastProfile,
    #[error("profile name must not be empty")]
    EmptyName,
    #[error("key index out of range: {0}")]
    KeyOutOfRange(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppState {
    profiles: Vec<Profile>,
    selected_profile: Option<ProfileId>,
    pub selected_target: SelectedTarget,
    /// Device settings block as read from the last import, kept verbatim.
    pub settings_xml: Option<String>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Fresh session with a single default profile.
    pub fn new() -> Self {
        Self::from_profiles(Vec::new(), None)
    }

    /// Commits an imported profile list. An empty list still yields one
    /// default profile.
    pub fn from_profiles(mut profiles: Vec<Profile>, settings_xml: Option<String>) -> Self {
        if profiles.is_empty() {
            profiles.push(Profile::default());
        }
        let selected_profile = profiles.first().map(|p| p.id);
        Self {
            profiles,
            selected_profile,
            selected_target: SelectedTarget::default(),
            settings_xml,
            dirty: false,
        }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn profile(&self, id: ProfileId) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Mutable access marks the state dirty.
    pub fn profile_mut(&mut self, id: ProfileId) -> Option<&mut Profile> {
        let profile = self.profiles.iter_mut().find(|p| p.id == id)?;
        self.dirty = true;
        Some(profile)
    }

    /// Selected profile, falling back to the first one if the selection is stale.
    pub fn selected_profile(&self) -> &Profile {
        self.selected_profile
            .and_then(|id| self.profile(id))
            .unwrap_or(&self.profiles[0])
    }

    /// Unknown ids are ignored.
    pub fn select_profile(&mut self, id: ProfileId) -> bool {
        if self.profile(id).is_none() {
            return false;
        }
        self.selected_profile = Some(id);
        true
    }

    pub fn select_target(&mut self, target: SelectedTarget) -> Result<(), ModelError> {
        if let SelectedTarget::Key { index } = target {
            if index >= KEY_COUNT {
                return Err(ModelError::KeyOutOfRange(index));
            }
        }
        self.selected_target = target;
        Ok(())
    }

    /// Appends an empty profile with the next free `Profile N` name and selects it.
    pub fn add_profile(&mut self) -> ProfileId {
        let names: Vec<&str> = self.profiles.iter().map(|p| p.name.as_str()).collect();
        let profile = Profile::new(next_profile_name(&names));
        let id = profile.id;
        debug!(%id, name = %profile.name, "profile added");
        self.profiles.push(profile);
        self.selected_profile = Some(id);
        self.dirty = true;
        id
    }

    pub fn remove_profile(&mut self, id: ProfileId) -> Result<Profile, ModelError> {
        let pos = self
            .profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or(ModelError::UnknownProfile(id))?;
        if self.profiles.len() == 1 {
            return Err(ModelError::LastProfile);
        }

        let removed = self.profiles.remove(pos);
        debug!(%id, name = %removed.name, "profile removed");
        if self.selected_profile == Some(id) {
            let next = pos.min(self.profiles.len() - 1);
            self.selected_profile = Some(self.profiles[next].id);
        }
        self.dirty = true;
        Ok(removed)
    }

    pub fn rename_profile(&mut self, id: ProfileId, name: &str) -> Result<(), ModelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        let profile = self.profile_mut(id).ok_or(ModelError::UnknownProfile(id))?;
        profile.name = name.to_string();
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}
