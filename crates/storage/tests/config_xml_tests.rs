use app_core::{ActionSlot, AppState, Preserved, Profile, WheelMode, KEY_COUNT};
use proptest::prelude::*;
use rstest::rstest;
use storage::config_xml::DEFAULT_SETTINGS;
use storage::{build_config_xml, parse_config_xml, CodecError};

fn button(actions: &[&str], label: &str) -> String {
    let mut out = String::from("<MacroButton>");
    for a in actions {
        out.push_str(&format!("<Action>{a}</Action>"));
    }
    out.push_str(&format!("<Label>{label}</Label></MacroButton>"));
    out
}

fn full_buttons() -> String {
    (0..KEY_COUNT)
        .map(|i| button(&["0,0", "0,0", "0,0"], &format!("K{}", i + 1)))
        .collect()
}

fn document(profiles: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Configuration>
  <Settings><LED_Mode>Solid</LED_Mode><Custom_Thing>7</Custom_Thing></Settings>
  <Profiles>{profiles}</Profiles>
</Configuration>"#
    )
}

fn profile(name: &str, wheel_mode: &str, wheel_key: &str, buttons: &str) -> String {
    format!(
        r#"<Profile name="{name}"><WheelMode>{wheel_mode}</WheelMode><WheelKey>{wheel_key}</WheelKey><MacroButtons>{buttons}</MacroButtons></Profile>"#
    )
}

#[test]
fn clean_document_parses_without_warnings() {
    let buttons = [
        button(&["0,17", "0,67", "0,0"], "Copy"),
        button(&["0,17", "0,86", "0,0"], "Paste"),
    ]
    .concat()
        + &(2..KEY_COUNT)
            .map(|_| button(&["0,0", "0,0", "0,0"], ""))
            .collect::<String>();
    let text = document(&profile("Editing", "Twist", "38", &buttons));

    let parsed = parse_config_xml(&text).unwrap();
    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
    assert_eq!(parsed.profiles.len(), 1);

    let p = &parsed.profiles[0];
    assert_eq!(p.name, "Editing");
    assert_eq!(p.wheel_mode.value, WheelMode::Twist);
    assert_eq!(p.wheel_key.value, 38);
    assert_eq!(p.keys[0].label, "Copy");
    assert_eq!(
        p.keys[0].actions.value,
        [Some(ActionSlot::new(0, 17)), Some(ActionSlot::new(0, 67)), None]
    );
    assert!(p.keys[0].actions.raw.is_some());
    assert!(!p.keys[3].has_actions());

    let settings = parsed.settings_xml.unwrap();
    assert!(settings.contains("<Custom_Thing>7</Custom_Thing>"));
}

#[test]
fn invalid_wheel_mode_warns_once_and_defaults() {
    let text = document(&profile("Gaming", "Spinny", "0", &full_buttons()));
    let parsed = parse_config_xml(&text).unwrap();

    assert_eq!(parsed.profiles[0].wheel_mode.value, WheelMode::Clicky);
    assert_eq!(parsed.warnings.len(), 1, "{:?}", parsed.warnings);
    assert!(parsed.warnings[0].contains("Gaming"));
    assert!(parsed.warnings[0].contains("Spinny"));
}

#[rstest]
#[case("-3")]
#[case("abc")]
#[case("")]
fn invalid_wheel_key_defaults_to_zero(#[case] value: &str) {
    let text = document(&profile("P", "Clicky", value, &full_buttons()));
    let parsed = parse_config_xml(&text).unwrap();

    assert_eq!(parsed.profiles[0].wheel_key.value, 0);
    assert_eq!(parsed.warnings.len(), 1, "{:?}", parsed.warnings);
    assert!(parsed.warnings[0].contains("WheelKey"));
}

#[test]
fn nameless_profiles_are_skipped() {
    let profiles = format!(
        r#"<Profile><WheelMode>Clicky</WheelMode></Profile>{}"#,
        profile("Kept", "Clicky", "0", &full_buttons())
    );
    let parsed = parse_config_xml(&document(&profiles)).unwrap();

    assert_eq!(parsed.profiles.len(), 1);
    assert_eq!(parsed.profiles[0].name, "Kept");
    assert_eq!(parsed.warnings, vec!["Profile 1 missing name attribute, skipping"]);
}

#[test]
fn empty_profiles_section_synthesizes_default() {
    let parsed = parse_config_xml("<Configuration><Profiles/></Configuration>").unwrap();

    assert_eq!(parsed.profiles.len(), 1);
    assert_eq!(parsed.profiles[0].name, "Profile 1");
    assert!(parsed.settings_xml.is_none());
    assert!(parsed
        .warnings
        .iter()
        .any(|w| w == "No profiles found, creating default profile"));
}

#[test]
fn missing_profiles_section_warns_twice() {
    let parsed = parse_config_xml("<Configuration><Settings/></Configuration>").unwrap();
    assert_eq!(
        parsed.warnings,
        vec![
            "No <Profiles> section found",
            "No profiles found, creating default profile"
        ]
    );
}

#[test]
fn malformed_action_entries_leave_slot_empty() {
    let mut buttons = button(&["0,65", "oops", "-1,3"], "Mixed");
    buttons += &(1..KEY_COUNT)
        .map(|_| button(&["0,0", "0,0", "0,0"], ""))
        .collect::<String>();
    let parsed = parse_config_xml(&document(&profile("P", "Clicky", "0", &buttons))).unwrap();

    let key = &parsed.profiles[0].keys[0];
    assert_eq!(key.actions.value, [Some(ActionSlot::new(0, 65)), None, None]);
    assert_eq!(parsed.warnings.len(), 2, "{:?}", parsed.warnings);
    assert!(parsed.warnings.iter().all(|w| w.contains("key 1")));
}

#[test]
fn short_action_list_triggers_count_warning() {
    let mut buttons = button(&["0,65"], "One");
    buttons += &(1..KEY_COUNT)
        .map(|_| button(&["0,0", "0,0", "0,0"], ""))
        .collect::<String>();
    let parsed = parse_config_xml(&document(&profile("P", "Clicky", "0", &buttons))).unwrap();

    assert_eq!(parsed.warnings.len(), 1);
    assert!(parsed.warnings[0].contains("1 action(s), expected 3"));
    assert_eq!(
        parsed.profiles[0].keys[0].actions.value,
        [Some(ActionSlot::new(0, 65)), None, None]
    );
}

#[test]
fn button_without_actions_triggers_count_warning() {
    let mut buttons = button(&[], "Bare");
    buttons += &(1..KEY_COUNT)
        .map(|_| button(&["0,0", "0,0", "0,0"], ""))
        .collect::<String>();
    let parsed = parse_config_xml(&document(&profile("P", "Clicky", "0", &buttons))).unwrap();

    assert_eq!(parsed.warnings.len(), 1, "{:?}", parsed.warnings);
    assert!(parsed.warnings[0].contains("key 1 has 0 action(s), expected 3"));
    let key = &parsed.profiles[0].keys[0];
    assert_eq!(key.label, "Bare");
    assert_eq!(key.actions.value, [None, None, None]);
}

#[test]
fn missing_buttons_become_empty_keys() {
    let buttons = button(&["0,0", "0,0", "0,0"], "Only");
    let parsed = parse_config_xml(&document(&profile("P", "Momentum", "5", &buttons))).unwrap();

    let p = &parsed.profiles[0];
    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
    assert_eq!(p.keys[0].label, "Only");
    assert!(p.keys[1..].iter().all(|k| k.label.is_empty() && !k.has_actions()));
}

#[rstest]
#[case("<Config/>")]
#[case("<Root><Profiles/></Root>")]
fn missing_configuration_root_is_fatal(#[case] text: &str) {
    assert_eq!(parse_config_xml(text).unwrap_err(), CodecError::MissingRoot);
}

#[test]
fn nested_configuration_is_found() {
    let parsed = parse_config_xml(
        r#"<Export><Configuration><Profiles><Profile name="Deep"/></Profiles></Configuration></Export>"#,
    )
    .unwrap();
    assert_eq!(parsed.profiles[0].name, "Deep");
}

#[test]
fn unparseable_xml_is_fatal() {
    assert!(matches!(
        parse_config_xml("<Configuration><Profiles></Configuration>"),
        Err(CodecError::Malformed { .. })
    ));
}

#[test]
fn build_without_settings_writes_default_table() {
    let state = AppState::new();
    let built = build_config_xml(&state).unwrap();

    assert!(built.warnings.is_empty());
    assert!(built
        .xml_text
        .starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    for (name, value) in DEFAULT_SETTINGS {
        assert!(
            built.xml_text.contains(&format!("<{name}>{value}</{name}>")),
            "missing {name}"
        );
    }
}

#[test]
fn build_restores_preserved_settings() {
    let text = document(&profile("P", "Clicky", "0", &full_buttons()));
    let parsed = parse_config_xml(&text).unwrap();
    let state = AppState::from_profiles(parsed.profiles, parsed.settings_xml);

    let built = build_config_xml(&state).unwrap();
    assert!(built.warnings.is_empty());
    assert!(built.xml_text.contains("<LED_Mode>Solid</LED_Mode>"));
    assert!(built.xml_text.contains("<Custom_Thing>7</Custom_Thing>"));
    assert!(!built.xml_text.contains("Twist_P"));
}

#[test]
fn broken_preserved_settings_fall_back_with_warning() {
    let mut state = AppState::new();
    state.settings_xml = Some("<Settings><Unclosed></Settings>".to_string());

    let built = build_config_xml(&state).unwrap();
    assert_eq!(built.warnings.len(), 1);
    assert!(built.xml_text.contains("<LED_Mode>Bands</LED_Mode>"));
}

#[test]
fn structured_wheel_edits_win_over_imported_fragment() {
    let text = document(&profile("P", "Twist", "9", &full_buttons()));
    let parsed = parse_config_xml(&text).unwrap();
    let mut state = AppState::from_profiles(parsed.profiles, parsed.settings_xml);

    let id = state.profiles()[0].id;
    let p = state.profile_mut(id).unwrap();
    p.set_wheel_mode(WheelMode::Momentum);
    p.set_wheel_key(40);

    let built = build_config_xml(&state).unwrap();
    assert!(built.xml_text.contains("<WheelMode>Momentum</WheelMode>"));
    assert!(built.xml_text.contains("<WheelKey>40</WheelKey>"));
    assert!(!built.xml_text.contains("Twist"));
}

#[test]
fn raw_actions_are_reemitted_when_nothing_structured_survived() {
    let mut state = AppState::new();
    let id = state.profiles()[0].id;
    let key = &mut state.profile_mut(id).unwrap().keys[4];
    key.actions = Preserved::with_raw(
        [None; 3],
        Some("<Actions><Action>0,0</Action><Action>0,0</Action></Actions>".to_string()),
    );

    let built = build_config_xml(&state).unwrap();
    assert!(built.warnings.is_empty());
    assert_eq!(built.xml_text.matches("<Action>0,0</Action>").count(), 2);
}

#[test]
fn build_skips_empty_slots_and_keeps_order() {
    let mut state = AppState::new();
    let id = state.profiles()[0].id;
    state.profile_mut(id).unwrap().keys[0].set_actions([
        None,
        Some(ActionSlot::new(10, 17)),
        Some(ActionSlot::new(0, 67)),
    ]);

    let built = build_config_xml(&state).unwrap();
    let first = built.xml_text.find("<Action>10,17</Action>").unwrap();
    let second = built.xml_text.find("<Action>0,67</Action>").unwrap();
    assert!(first < second);
    assert_eq!(built.xml_text.matches("<Action>").count(), 2);
    assert_eq!(built.xml_text.matches("<MacroButton>").count(), KEY_COUNT);
}

#[test]
fn blank_slot_set_through_model_survives_round_trip() {
    let mut state = AppState::new();
    let id = state.profiles()[0].id;
    state.profile_mut(id).unwrap().keys[0].actions.value =
        [Some(ActionSlot::new(0, 0)), Some(ActionSlot::new(5, 65)), None];

    let built = build_config_xml(&state).unwrap();
    assert!(!built.xml_text.contains("<Action>0,0</Action>"));

    let parsed = parse_config_xml(&built.xml_text).unwrap();
    let before: Vec<_> = state.profiles()[0].keys[0].assigned_actions().collect();
    let after: Vec<_> = parsed.profiles[0].keys[0].assigned_actions().collect();
    assert_eq!(before, after);
    assert_eq!(after, vec![&ActionSlot::new(5, 65)]);
}

fn arb_slot() -> impl Strategy<Value = Option<ActionSlot>> {
    prop_oneof![
        Just(None),
        (prop_oneof![Just(0u32), 0u32..5000], 0u32..256).prop_map(|(d, k)| Some(ActionSlot::new(d, k))),
    ]
}

fn arb_profile() -> impl Strategy<Value = Profile> {
    (
        "[A-Za-z0-9 &<>\"'_-]{0,12}[A-Za-z0-9&<>]",
        prop::sample::select(WheelMode::ALL.to_vec()),
        0u32..256,
        prop::collection::vec(
            ("[A-Za-z0-9 &<>'.]{0,10}", prop::array::uniform3(arb_slot())),
            KEY_COUNT,
        ),
    )
        .prop_map(|(name, mode, wheel_key, keys)| {
            let mut p = Profile::new(name);
            p.set_wheel_mode(mode);
            p.set_wheel_key(wheel_key);
            for (key, (label, slots)) in p.keys.iter_mut().zip(keys) {
                key.label = label;
                key.set_actions(slots);
            }
            p
        })
}

proptest! {
    #[test]
    fn build_then_parse_keeps_user_content(profiles in prop::collection::vec(arb_profile(), 1..4)) {
        let state = AppState::from_profiles(profiles.clone(), None);
        let built = build_config_xml(&state).unwrap();
        let parsed = parse_config_xml(&built.xml_text).unwrap();

        prop_assert_eq!(parsed.profiles.len(), profiles.len());
        for (before, after) in profiles.iter().zip(&parsed.profiles) {
            prop_assert_eq!(&after.name, &before.name);
            prop_assert_eq!(after.wheel_mode.value, before.wheel_mode.value);
            prop_assert_eq!(after.wheel_key.value, before.wheel_key.value);
            for (k0, k1) in before.keys.iter().zip(&after.keys) {
                prop_assert_eq!(&k1.label, &k0.label);
                let a: Vec<_> = k0.assigned_actions().collect();
                let b: Vec<_> = k1.assigned_actions().collect();
                prop_assert_eq!(a, b);
            }
        }
    }
}
