//! Numeric key codes (browser `keyCode` numbering, as stored by the device) and their names.

/// Sorted by code.
pub const KEYCODES: &[(u32, &str)] = &[
    (0, "None"),
    (8, "Backspace"),
    (9, "Tab"),
    (13, "Enter"),
    (16, "Shift"),
    (17, "Ctrl"),
    (18, "Alt"),
    (19, "Pause"),
    (20, "Caps Lock"),
    (27, "Escape"),
    (32, "Space"),
    (33, "Page Up"),
    (34, "Page Down"),
    (35, "End"),
    (36, "Home"),
    (37, "Left Arrow"),
    (38, "Up Arrow"),
    (39, "Right Arrow"),
    (40, "Down Arrow"),
    (45, "Insert"),
    (46, "Delete"),
    (48, "0"),
    (49, "1"),
    (50, "2"),
    (51, "3"),
    (52, "4"),
    (53, "5"),
    (54, "6"),
    (55, "7"),
    (56, "8"),
    (57, "9"),
    (65, "A"),
    (66, "B"),
    (67, "C"),
    (68, "D"),
    (69, "E"),
    (70, "F"),
    (71, "G"),
    (72, "H"),
    (73, "I"),
    (74, "J"),
    (75, "K"),
    (76, "L"),
    (77, "M"),
    (78, "N"),
    (79, "O"),
    (80, "P"),
    (81, "Q"),
    (82, "R"),
    (83, "S"),
    (84, "T"),
    (85, "U"),
    (86, "V"),
    (87, "W"),
    (88, "X"),
    (89, "Y"),
    (90, "Z"),
    (91, "Left Windows"),
    (92, "Right Windows"),
    (93, "Menu"),
    (96, "Numpad 0"),
    (97, "Numpad 1"),
    (98, "Numpad 2"),
    (99, "Numpad 3"),
    (100, "Numpad 4"),
    (101, "Numpad 5"),
    (102, "Numpad 6"),
    (103, "Numpad 7"),
    (104, "Numpad 8"),
    (105, "Numpad 9"),
    (106, "Numpad *"),
    (107, "Numpad +"),
    (109, "Numpad -"),
    (110, "Numpad ."),
    (111, "Numpad /"),
    (112, "F1"),
    (113, "F2"),
    (114, "F3"),
    (115, "F4"),
    (116, "F5"),
    (117, "F6"),
    (118, "F7"),
    (119, "F8"),
    (120, "F9"),
    (121, "F10"),
    (122, "F11"),
    (123, "F12"),
    (131, "Left Shift"),
    (132, "Right Shift"),
    (133, "Left Ctrl"),
    (134, "Right Ctrl"),
    (135, "Left Alt"),
    (136, "Right Alt"),
    (144, "Num Lock"),
    (145, "Scroll Lock"),
    (186, ";"),
    (187, "="),
    (188, ","),
    (189, "-"),
    (190, "."),
    (191, "/"),
    (192, "`"),
    (219, "["),
    (220, "\\"),
    (221, "]"),
    (222, "'"),
];

pub const NONE: u32 = 0;
pub const SHIFT: u32 = 16;
pub const CTRL: u32 = 17;
pub const ALT: u32 = 18;
pub const ESCAPE: u32 = 27;
pub const LEFT_WINDOWS: u32 = 91;
pub const RIGHT_WINDOWS: u32 = 92;
pub const MENU: u32 = 93;

pub fn name(code: u32) -> Option<&'static str> {
    KEYCODES
        .binary_search_by_key(&code, |(c, _)| *c)
        .ok()
        .map(|i| KEYCODES[i].1)
}

/// Reverse lookup, ignoring ASCII case.
pub fn code_for_name(name: &str) -> Option<u32> {
    let name = name.trim();
    KEYCODES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(c, _)| *c)
}

/// Parenthesised label shown next to a raw code in the editor.
pub fn display_name(code: u32) -> String {
    if code == NONE {
        return "(None)".to_string();
    }
    match name(code) {
        Some(n) => format!("({n})"),
        None => "(Unknown)".to_string(),
    }
}

pub fn is_valid_keycode(code: u32) -> bool {
    name(code).is_some()
}

pub fn is_modifier(code: u32) -> bool {
    matches!(code, SHIFT | CTRL | ALT | LEFT_WINDOWS | RIGHT_WINDOWS | MENU)
}
