//! Profile naming rules: filesystem-safe folder names and fresh display names.

use std::collections::HashSet;

pub const UNNAMED: &str = "Unnamed";

const UNSAFE_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Turns a profile name into something usable as a folder name on any OS.
pub fn sanitize_profile_name(name: &str) -> String {
    if name.trim().is_empty() {
        return UNNAMED.to_string();
    }

    let replaced: String = name
        .chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect();

    let stripped = replaced.trim_end_matches(|c: char| c == '.' || c.is_whitespace());
    if stripped.trim().is_empty() {
        return UNNAMED.to_string();
    }
    stripped.to_string()
}

/// Sanitizes each name and makes the results pairwise distinct.
///
/// The output is positional: entry `i` is the folder for profile `i`. The
/// first holder of a name keeps it; later collisions get ` (2)`, ` (3)`, ...
/// A suffix is never chosen if another profile's own sanitized name already
/// spells it, so `["A", "A", "A (2)"]` maps to `["A", "A (3)", "A (2)"]`.
pub fn create_unique_folder_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let sanitized: Vec<String> = names
        .iter()
        .map(|n| sanitize_profile_name(n.as_ref()))
        .collect();
    let spelled: HashSet<&str> = sanitized.iter().map(String::as_str).collect();

    let mut assigned: HashSet<String> = HashSet::with_capacity(sanitized.len());
    let mut out = Vec::with_capacity(sanitized.len());

    for base in &sanitized {
        let name = if assigned.contains(base) {
            let mut counter = 2u32;
            loop {
                let candidate = format!("{base} ({counter})");
                if !assigned.contains(&candidate) && !spelled.contains(candidate.as_str()) {
                    break candidate;
                }
                counter += 1;
            }
        } else {
            base.clone()
        };
        assigned.insert(name.clone());
        out.push(name);
    }

    out
}

/// First `Profile N` (N >= 1) not already taken.
pub fn next_profile_name<S: AsRef<str>>(existing: &[S]) -> String {
    let taken: HashSet<&str> = existing.iter().map(|s| s.as_ref()).collect();
    (1u32..)
        .map(|n| format!("Profile {n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| UNNAMED.to_string())
}
