//! `config.xml` reader/writer.
//!
//! Document shape:
//!
//! ```xml
//! <Configuration>
//!   <Settings>...opaque key/value leaves...</Settings>
//!   <Profiles>
//!     <Profile name="...">
//!       <WheelMode>Clicky|Twist|Momentum</WheelMode>
//!       <WheelKey>0</WheelKey>
//!       <MacroButtons>
//!         <MacroButton>            (exactly six)
//!           <Action>delayMs,keycode</Action>   (up to three)
//!           <Label>...</Label>
//!         </MacroButton>
//!       </MacroButtons>
//!     </Profile>
//!   </Profiles>
//! </Configuration>
//! ```
//!
//! Parsing never fails on a single bad field: it records a warning and
//! substitutes a default. Only an unreadable document or a missing
//! `Configuration` element is an error.

use app_core::{
    empty_keys, ActionSlot, ActionSlots, AppState, KeyConfig, Preserved, Profile, ProfileId,
    WheelMode, ACTION_SLOTS, KEY_COUNT,
};
use serde::Serialize;
use tracing::debug;

use crate::error::CodecError;
use crate::push_warning;
use crate::xml::{self, Element};

const CONFIGURATION: &str = "Configuration";
const SETTINGS: &str = "Settings";
const PROFILES: &str = "Profiles";
const PROFILE: &str = "Profile";
const NAME_ATTR: &str = "name";
const WHEEL_MODE: &str = "WheelMode";
const WHEEL_KEY: &str = "WheelKey";
const MACRO_BUTTONS: &str = "MacroButtons";
const MACRO_BUTTON: &str = "MacroButton";
const ACTIONS: &str = "Actions";
const ACTION: &str = "Action";
const LABEL: &str = "Label";

/// Written when the state carries no usable settings block.
pub const DEFAULT_SETTINGS: [(&str, &str); 9] = [
    ("LED_Mode", "Bands"),
    ("LED_Primary", "255,0,0"),
    ("LED_Secondary", "0,0,255"),
    ("Clicky_P", "0.5"),
    ("Clicky_I", "0"),
    ("Twist_P", "0.65"),
    ("Twist_I", "0.2"),
    ("Momentum_P", "0.3"),
    ("Momentum_I", "0"),
];

#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub profiles: Vec<Profile>,
    pub settings_xml: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub xml_text: String,
    pub warnings: Vec<String>,
}

pub fn parse_config_xml(text: &str) -> Result<ParseResult, CodecError> {
    let doc = xml::parse(text)?;
    let config = if doc.name == CONFIGURATION {
        &doc
    } else {
        doc.find(CONFIGURATION).ok_or(CodecError::MissingRoot)?
    };

    let mut warnings = Vec::new();

    let settings_xml = config.child(SETTINGS).map(Element::to_xml).transpose()?;

    let mut profiles = Vec::new();
    match config.child(PROFILES) {
        None => push_warning(&mut warnings, "No <Profiles> section found".to_string()),
        Some(section) => {
            for (i, node) in section.children_named(PROFILE).enumerate() {
                if let Some(profile) = parse_profile(node, i, &mut warnings)? {
                    profiles.push(profile);
                }
            }
        }
    }

    if profiles.is_empty() {
        push_warning(
            &mut warnings,
            "No profiles found, creating default profile".to_string(),
        );
        profiles.push(Profile::default());
    }

    debug!(
        profiles = profiles.len(),
        warnings = warnings.len(),
        settings = settings_xml.is_some(),
        "parsed config.xml"
    );

    Ok(ParseResult {
        profiles,
        settings_xml,
        warnings,
    })
}

fn parse_profile(
    node: &Element,
    index: usize,
    warnings: &mut Vec<String>,
) -> Result<Option<Profile>, CodecError> {
    let Some(name) = node.attr(NAME_ATTR).filter(|n| !n.is_empty()) else {
        push_warning(
            warnings,
            format!("Profile {} missing name attribute, skipping", index + 1),
        );
        return Ok(None);
    };

    let wheel_mode = parse_wheel_mode(node, name, warnings)?;
    let wheel_key = parse_wheel_key(node, name, warnings)?;

    let mut keys = empty_keys();
    match node.child(MACRO_BUTTONS) {
        None => push_warning(
            warnings,
            format!("Profile \"{name}\" has no MacroButtons section"),
        ),
        Some(section) => {
            let buttons: Vec<&Element> = section.children_named(MACRO_BUTTON).collect();
            if buttons.len() > KEY_COUNT {
                push_warning(
                    warnings,
                    format!(
                        "Profile \"{name}\" has {} MacroButton entries; only the first {KEY_COUNT} are used",
                        buttons.len()
                    ),
                );
            }
            for (i, (key, button)) in keys.iter_mut().zip(&buttons).enumerate() {
                parse_button(button, key, name, i, warnings)?;
            }
        }
    }

    Ok(Some(Profile {
        id: ProfileId::generate(),
        name: name.to_string(),
        wheel_mode,
        wheel_key,
        keys,
    }))
}

fn parse_wheel_mode(
    node: &Element,
    profile: &str,
    warnings: &mut Vec<String>,
) -> Result<Preserved<WheelMode>, CodecError> {
    let Some(el) = node.child(WHEEL_MODE) else {
        push_warning(
            warnings,
            format!("Profile \"{profile}\" has no WheelMode, using {}", WheelMode::default()),
        );
        return Ok(Preserved::default());
    };

    let text = el.text();
    let value = text.trim().parse::<WheelMode>().unwrap_or_else(|_| {
        push_warning(
            warnings,
            format!(
                "Profile \"{profile}\" has invalid WheelMode \"{}\", using {}",
                text.trim(),
                WheelMode::default()
            ),
        );
        WheelMode::default()
    });
    Ok(Preserved::with_raw(value, Some(el.to_xml()?)))
}

fn parse_wheel_key(
    node: &Element,
    profile: &str,
    warnings: &mut Vec<String>,
) -> Result<Preserved<u32>, CodecError> {
    let Some(el) = node.child(WHEEL_KEY) else {
        push_warning(warnings, format!("Profile \"{profile}\" has no WheelKey, using 0"));
        return Ok(Preserved::default());
    };

    let text = el.text();
    let value = parse_non_negative(&text).unwrap_or_else(|reason| {
        push_warning(
            warnings,
            format!(
                "Profile \"{profile}\" has invalid WheelKey \"{}\" ({reason}), using 0",
                text.trim()
            ),
        );
        0
    });
    Ok(Preserved::with_raw(value, Some(el.to_xml()?)))
}

fn parse_button(
    button: &Element,
    key: &mut KeyConfig,
    profile: &str,
    index: usize,
    warnings: &mut Vec<String>,
) -> Result<(), CodecError> {
    key.label = button.child(LABEL).map(Element::text).unwrap_or_default();

    let entries = button.find_all(ACTION);
    if entries.len() != ACTION_SLOTS {
        let detail = if entries.len() > ACTION_SLOTS {
            "extra entries ignored"
        } else {
            "remaining slots left empty"
        };
        push_warning(
            warnings,
            format!(
                "Profile \"{profile}\" key {} has {} action(s), expected {ACTION_SLOTS}; {detail}",
                index + 1,
                entries.len()
            ),
        );
    }
    if entries.is_empty() {
        return Ok(());
    }

    let mut preserved = Element::new(ACTIONS);
    for entry in &entries {
        preserved.push((*entry).clone());
    }

    let mut slots: ActionSlots = [None; ACTION_SLOTS];
    for (n, (slot, entry)) in slots.iter_mut().zip(&entries).enumerate() {
        let text = entry.text();
        match parse_action(&text) {
            Ok(action) if action.is_blank() => {}
            Ok(action) => *slot = Some(action),
            Err(reason) => push_warning(
                warnings,
                format!(
                    "Profile \"{profile}\" key {} action {}: invalid entry \"{}\" ({reason}), left empty",
                    index + 1,
                    n + 1,
                    text.trim()
                ),
            ),
        }
    }

    key.actions = Preserved::with_raw(slots, Some(preserved.to_xml()?));
    Ok(())
}

/// `"<delayMs>,<keycode>"`, both non-negative integers.
pub fn parse_action(text: &str) -> Result<ActionSlot, String> {
    let parts: Vec<&str> = text.trim().split(',').collect();
    let [delay, keycode] = parts.as_slice() else {
        return Err(format!("expected \"delayMs,keycode\", got {} field(s)", parts.len()));
    };
    let delay_ms = parse_non_negative(delay).map_err(|r| format!("delay {r}"))?;
    let keycode = parse_non_negative(keycode).map_err(|r| format!("keycode {r}"))?;
    Ok(ActionSlot::new(delay_ms, keycode))
}

fn parse_non_negative(text: &str) -> Result<u32, String> {
    let n: i64 = text
        .trim()
        .parse()
        .map_err(|_| "is not a number".to_string())?;
    if n < 0 {
        return Err("is negative".to_string());
    }
    u32::try_from(n).map_err(|_| "is out of range".to_string())
}

pub fn build_config_xml(state: &AppState) -> Result<BuildResult, CodecError> {
    let mut warnings = Vec::new();

    let mut root = Element::new(CONFIGURATION);
    root.push(settings_element(state.settings_xml.as_deref(), &mut warnings));

    let mut profiles = Element::new(PROFILES);
    for profile in state.profiles() {
        profiles.push(profile_element(profile, &mut warnings));
    }
    root.push(profiles);

    let xml_text = xml::write_document(&root)?;
    debug!(
        profiles = state.profiles().len(),
        bytes = xml_text.len(),
        "built config.xml"
    );
    Ok(BuildResult { xml_text, warnings })
}

pub fn default_settings_element() -> Element {
    let mut settings = Element::new(SETTINGS);
    for (name, value) in DEFAULT_SETTINGS {
        settings.push(Element::with_text(name, value));
    }
    settings
}

fn settings_element(preserved: Option<&str>, warnings: &mut Vec<String>) -> Element {
    let Some(raw) = preserved else {
        return default_settings_element();
    };
    match xml::parse(raw) {
        Ok(el) if el.name == SETTINGS => el,
        Ok(el) => {
            push_warning(
                warnings,
                format!("Preserved settings have unexpected root <{}>, using default", el.name),
            );
            default_settings_element()
        }
        Err(e) => {
            push_warning(
                warnings,
                format!("Failed to restore settings XML ({e}), using default"),
            );
            default_settings_element()
        }
    }
}

fn profile_element(profile: &Profile, warnings: &mut Vec<String>) -> Element {
    let mut el = Element::new(PROFILE);
    el.set_attr(NAME_ATTR, profile.name.as_str());
    el.push(Element::with_text(WHEEL_MODE, profile.wheel_mode.value.as_str()));
    el.push(Element::with_text(WHEEL_KEY, profile.wheel_key.value.to_string()));

    let mut buttons = Element::new(MACRO_BUTTONS);
    for (i, key) in profile.keys.iter().enumerate() {
        buttons.push(button_element(key, &profile.name, i, warnings));
    }
    el.push(buttons);
    el
}

fn button_element(key: &KeyConfig, profile: &str, index: usize, warnings: &mut Vec<String>) -> Element {
    let mut el = Element::new(MACRO_BUTTON);

    if key.has_actions() {
        for action in key.assigned_actions() {
            el.push(Element::with_text(ACTION, action.to_string()));
        }
    } else if let Some(raw) = &key.actions.raw {
        // Nothing structured survived parsing; hand back what the device wrote.
        match xml::parse(raw) {
            Ok(preserved) => {
                for action in preserved.find_all(ACTION) {
                    el.push(action.clone());
                }
            }
            Err(e) => push_warning(
                warnings,
                format!(
                    "Failed to restore actions for key {} in profile \"{profile}\" ({e})",
                    index + 1
                ),
            ),
        }
    }

    el.push(Element::with_text(LABEL, key.label.as_str()));
    el
}
