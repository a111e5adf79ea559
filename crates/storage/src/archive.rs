//! ZIP bundle import/export.
//!
//! Layout written by the device tooling:
//! - `config.xml` at the archive root (or inside one top-level folder)
//! - `<ProfileFolder>/<1..6>.bmp`, one bitmap per key
//!
//! Import never fails because a bitmap is missing or unreadable; those are
//! counted and reported as warnings. Only a missing or unreadable config
//! document is an error.

use std::collections::HashSet;
use std::io::{Cursor, Read, Seek, Write};

use app_core::{
    create_unique_folder_names, sanitize_profile_name, AppState, BitmapPayload, Profile, KEY_COUNT,
};
use serde::Serialize;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config_xml::{build_config_xml, parse_config_xml, BuildResult, ParseResult};
use crate::error::ArchiveError;
use crate::push_warning;

pub const CONFIG_FILE_NAME: &str = "config.xml";

const METADATA_FILES: [&str; 3] = [".DS_Store", "Thumbs.db", "Desktop.ini"];
const METADATA_DIRS: [&str; 1] = ["__MACOSX"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl Compression {
    fn method(self) -> CompressionMethod {
        match self {
            Compression::Deflated => CompressionMethod::Deflated,
            Compression::Stored => CompressionMethod::Stored,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    pub compression: Compression,
}

/// Result of reading a bundle, before it replaces the editor state.
#[derive(Debug, Clone, Serialize)]
pub struct ImportPreview {
    pub profiles: Vec<Profile>,
    pub settings_xml: Option<String>,
    /// Folder the config document was found in (`""` or `"<dir>/"`).
    pub path_prefix: String,
    pub bitmaps_found: usize,
    pub bitmaps_total: usize,
    pub warnings: Vec<String>,
}

impl ImportPreview {
    fn from_parse(parsed: ParseResult, path_prefix: String) -> Self {
        let bitmaps_total = parsed.profiles.len() * KEY_COUNT;
        Self {
            profiles: parsed.profiles,
            settings_xml: parsed.settings_xml,
            path_prefix,
            bitmaps_found: 0,
            bitmaps_total,
            warnings: parsed.warnings,
        }
    }

    pub fn into_state(self) -> AppState {
        AppState::from_profiles(self.profiles, self.settings_xml)
    }
}

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub bytes: Vec<u8>,
    pub warnings: Vec<String>,
}

/// OS junk that archivers add: dotfiles, Finder/Explorer droppings, resource forks.
pub fn is_metadata_path(path: &str) -> bool {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.iter().any(|s| s.starts_with('.')) {
        return true;
    }
    if segments.iter().any(|s| METADATA_DIRS.contains(s)) {
        return true;
    }
    segments.last().is_some_and(|file| {
        METADATA_FILES
            .iter()
            .any(|m| m.eq_ignore_ascii_case(file))
    })
}

struct EntryInfo {
    name: String,
    is_dir: bool,
}

/// Root `config.xml` first, then the first `<dir>/config.xml` in archive order.
fn locate_config(entries: &[EntryInfo]) -> Option<(&EntryInfo, String)> {
    if let Some(root) = entries
        .iter()
        .find(|e| e.name.trim_end_matches('/') == CONFIG_FILE_NAME)
    {
        return Some((root, String::new()));
    }

    entries.iter().find_map(|e| {
        let trimmed = e.name.trim_end_matches('/');
        match trimmed.split('/').collect::<Vec<_>>().as_slice() {
            [dir, file] if *file == CONFIG_FILE_NAME && !dir.is_empty() => {
                Some((e, format!("{dir}/")))
            }
            _ => None,
        }
    })
}

/// Reads a bundle without touching editor state.
pub fn preview_import(bytes: &[u8]) -> Result<ImportPreview, ArchiveError> {
    let archive_len = bytes.len() as u64;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index_raw(i)?;
        entries.push(EntryInfo {
            name: file.name().to_string(),
            is_dir: file.is_dir(),
        });
    }
    let total_entries = entries.len();
    entries.retain(|e| !is_metadata_path(&e.name));
    debug!(
        total = total_entries,
        kept = entries.len(),
        "scanned archive entries"
    );

    let (config_entry, prefix) = locate_config(&entries).ok_or(ArchiveError::ConfigNotFound)?;
    if config_entry.is_dir || config_entry.name.ends_with('/') {
        return Err(ArchiveError::ConfigIsDirectory);
    }
    let config_name = config_entry.name.clone();

    let mut warnings = Vec::new();
    let raw = read_entry(&mut archive, &config_name, archive_len)?;
    let text = match String::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => {
            push_warning(
                &mut warnings,
                format!("{config_name} is not valid UTF-8; invalid bytes were replaced"),
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    let parsed = parse_config_xml(&text)?;
    let mut preview = ImportPreview::from_parse(parsed, prefix);
    warnings.append(&mut preview.warnings);

    let files: HashSet<&str> = entries
        .iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.name.as_str())
        .collect();
    let names: Vec<&str> = preview.profiles.iter().map(|p| p.name.as_str()).collect();
    let folders = create_unique_folder_names(&names);

    let mut found = 0;
    for (profile, folder) in preview.profiles.iter_mut().zip(&folders) {
        let mut missing = 0;
        for (i, key) in profile.keys.iter_mut().enumerate() {
            let file = format!("{}.bmp", i + 1);
            let candidates = [
                format!("{}{folder}/{file}", preview.path_prefix),
                format!("{}{}/{file}", preview.path_prefix, profile.name),
            ];
            let Some(path) = candidates.iter().find(|c| files.contains(c.as_str())) else {
                missing += 1;
                continue;
            };

            match read_entry(&mut archive, path, archive_len) {
                Ok(bytes) => {
                    key.bmp = Some(BitmapPayload::Bytes(bytes));
                    found += 1;
                }
                Err(e) => {
                    push_warning(&mut warnings, format!("Failed to load {path}: {e}"));
                    missing += 1;
                }
            }
        }
        if missing > 0 {
            push_warning(
                &mut warnings,
                format!("Profile \"{}\" missing {missing} BMP file(s)", profile.name),
            );
        }
    }

    preview.bitmaps_found = found;
    preview.warnings = warnings;
    debug!(
        profiles = preview.profiles.len(),
        bitmaps_found = preview.bitmaps_found,
        bitmaps_total = preview.bitmaps_total,
        "archive import preview ready"
    );
    Ok(preview)
}

/// Same preview shape for a bare `config.xml` (no bitmaps to find).
pub fn preview_xml(text: &str) -> Result<ImportPreview, ArchiveError> {
    let parsed = parse_config_xml(text)?;
    Ok(ImportPreview::from_parse(parsed, String::new()))
}

/// The declared entry size comes from the archive and may be forged, so the
/// up-front reservation never exceeds the archive itself.
fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    archive_len: u64,
) -> Result<Vec<u8>, ArchiveError> {
    let mut file = archive.by_name(name)?;
    let reserve = file.size().min(archive_len);
    let mut buf = Vec::with_capacity(usize::try_from(reserve).unwrap_or(0));
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

fn file_options(compression: Compression) -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(compression.method())
}

/// Writes `config.xml` plus one folder of bitmaps per profile.
pub fn export_archive(state: &AppState, options: ExportOptions) -> Result<ExportResult, ArchiveError> {
    let BuildResult { xml_text, mut warnings } = build_config_xml(state)?;

    let names: Vec<&str> = state.profiles().iter().map(|p| p.name.as_str()).collect();
    let sanitized: Vec<String> = names.iter().map(|n| sanitize_profile_name(n)).collect();
    let folders = create_unique_folder_names(&names);

    if sanitized.iter().zip(&names).any(|(s, n)| s.as_str() != *n) {
        push_warning(
            &mut warnings,
            "Some profile names are not valid folder names and were sanitized for export".to_string(),
        );
    }
    if folders.iter().zip(&sanitized).any(|(f, s)| f != s) {
        push_warning(
            &mut warnings,
            "Some profile folder names collided and were numbered to keep them distinct".to_string(),
        );
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file(CONFIG_FILE_NAME, file_options(options.compression))?;
    zip.write_all(xml_text.as_bytes())?;

    let mut written = 0;
    for (profile, folder) in state.profiles().iter().zip(&folders) {
        zip.add_directory(format!("{folder}/"), file_options(options.compression))?;

        let mut missing = 0;
        for (i, key) in profile.keys.iter().enumerate() {
            let Some(payload) = &key.bmp else {
                missing += 1;
                continue;
            };
            let path = format!("{folder}/{}.bmp", i + 1);
            match write_bitmap(&mut zip, &path, payload, options.compression) {
                Ok(()) => written += 1,
                Err(e) => {
                    push_warning(
                        &mut warnings,
                        format!(
                            "Failed to add BMP for key {} in profile \"{}\": {e}",
                            i + 1,
                            profile.name
                        ),
                    );
                    missing += 1;
                }
            }
        }
        if missing > 0 {
            push_warning(
                &mut warnings,
                format!(
                    "Profile \"{}\" missing {missing} BMP file(s); exported without them",
                    profile.name
                ),
            );
        }
    }

    let bytes = zip.finish()?.into_inner();
    debug!(
        profiles = folders.len(),
        bitmaps = written,
        bytes = bytes.len(),
        "archive exported"
    );
    Ok(ExportResult { bytes, warnings })
}

/// The payload is loaded before the entry is opened, so a failed read leaves
/// no partial file behind.
fn write_bitmap<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    path: &str,
    payload: &BitmapPayload,
    compression: Compression,
) -> Result<(), ArchiveError> {
    let bytes = payload.load()?;
    zip.start_file(path, file_options(compression))?;
    zip.write_all(&bytes)?;
    Ok(())
}

/// Only the config document, for users who manage bitmaps separately.
pub fn export_xml(state: &AppState) -> Result<BuildResult, ArchiveError> {
    Ok(build_config_xml(state)?)
}
