//! Proteus 8 container extraction
//!
//! A `.pdsprj` saved by Proteus 8 is a ZIP archive. The schematic lives in one
//! of its XML-bearing entries; `PROJECT.XML` is tried first, then design
//! (`.dsn`) entries, then any other candidate in archive order.

use std::io::{Cursor, Read, Seek};

use crate::parser::schema::Component;
use crate::parser::warnings::{ParseWarning, Warnings};
use crate::parser::xml;

const CANDIDATE_EXTENSIONS: &[&str] = &[".pdsprj", ".xml", ".dsn", ".pwi"];
const PRIMARY_ENTRY: &str = "PROJECT.XML";
/// Largest entry body read into memory
const MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Lower rank is tried first
fn entry_rank(name: &str) -> Option<u8> {
    let lower = name.to_ascii_lowercase();
    if !CANDIDATE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return None;
    }
    let file_name = name.rsplit('/').next().unwrap_or(name);
    if file_name.eq_ignore_ascii_case(PRIMARY_ENTRY) {
        Some(0)
    } else if lower.ends_with(".dsn") {
        Some(1)
    } else {
        Some(2)
    }
}

/// Schematic-bearing entries in the order they should be tried
pub fn candidate_entries<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut ranked: Vec<(u8, usize, String)> = names
        .enumerate()
        .filter_map(|(pos, name)| entry_rank(name).map(|rank| (rank, pos, name.to_string())))
        .collect();
    ranked.sort();
    ranked.into_iter().map(|(_, _, name)| name).collect()
}

/// Extract components from a ZIP container
pub fn extract(bytes: &[u8], warnings: &mut Warnings) -> Vec<Component> {
    let mut archive = match zip::ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(e) => {
            warnings.push(ParseWarning::CorruptContainer(e.to_string()));
            return Vec::new();
        }
    };

    let candidates = candidate_entries(archive.file_names());
    if candidates.is_empty() {
        warnings.push(ParseWarning::MissingSchematicEntry);
        return Vec::new();
    }

    for entry in candidates {
        let content = match read_entry(&mut archive, &entry) {
            Ok(content) => content,
            Err(reason) => {
                tracing::warn!("Failed to read archive entry {}: {}", entry, reason);
                warnings.push(ParseWarning::UnreadableEntry { entry, reason });
                continue;
            }
        };

        if !(content.contains('<') && content.contains('>')) {
            tracing::debug!("Skipping non-XML archive entry {}", entry);
            warnings.push(ParseWarning::MalformedContent {
                source_name: entry,
                reason: "not structured text".to_string(),
            });
            continue;
        }

        let components = xml::extract_components(&content, &entry, warnings);
        if !components.is_empty() {
            tracing::info!("Extracted {} components from {}", components.len(), entry);
            return components;
        }
    }

    Vec::new()
}

fn read_entry<R: Read + Seek>(archive: &mut zip::ZipArchive<R>, name: &str) -> Result<String, String> {
    read_entry_limited(archive, name, MAX_ENTRY_BYTES)
}

/// Read at most `limit` bytes; a larger body is an error, not a truncation
fn read_entry_limited<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
    limit: u64,
) -> Result<String, String> {
    let file = archive.by_name(name).map_err(|e| e.to_string())?;
    let mut raw = Vec::new();
    file.take(limit + 1)
        .read_to_end(&mut raw)
        .map_err(|e| e.to_string())?;
    if raw.len() as u64 > limit {
        return Err(format!("entry exceeds {} bytes", limit));
    }
    Ok(String::from_utf8_lossy(&raw).into_owned())
}
