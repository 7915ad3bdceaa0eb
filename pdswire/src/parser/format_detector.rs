//! Proteus Format Detection
//!
//! This module classifies raw project bytes into one of the known Proteus
//! storage formats so extraction can be routed to the matching strategy.
//! Probing order: ZIP container (Proteus 8+), XML text (Proteus 7),
//! ISIS/ARES binary (Proteus 6/7). Detection never fails; anything that
//! matches no probe is `Unknown`.

use std::io::Cursor;

use crate::parser::schema::ProjectFormat;
use crate::parser::warnings::{ParseWarning, Warnings};

/// ZIP local file header
const ZIP_LOCAL_MAGIC: &[u8] = b"PK\x03\x04";
/// ZIP end of central directory (empty archive)
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
/// Number of leading bytes scanned for legacy markers
const PROBE_WINDOW: usize = 1000;
/// Root tokens of the XML-based project format, matched case-insensitively
const LEGACY_TEXT_MARKERS: &[&str] = &["<?xml", "<project", "<design", "<schematic", "<isis"];
const LEGACY_BINARY_MARKERS: &[&[u8]] = &[b"ISIS", b"ARES"];

/// Result of probing a byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub format: ProjectFormat,
    pub version_hint: Option<String>,
    pub warnings: Warnings,
}

/// Detect the storage format of a project file
pub fn detect(bytes: &[u8]) -> Detection {
    let mut warnings = Warnings::new();

    if has_zip_magic(bytes) {
        match zip::ZipArchive::new(Cursor::new(bytes)) {
            Ok(archive) => {
                let names: Vec<&str> = archive.file_names().collect();
                let version_hint = container_version_hint(&names);
                tracing::debug!("Detected ZIP container with {} entries", names.len());
                return Detection {
                    format: ProjectFormat::Container,
                    version_hint,
                    warnings,
                };
            }
            Err(e) => {
                // A corrupt container is handled exactly like an unrecognized file
                tracing::warn!("ZIP magic present but archive could not be opened: {}", e);
                warnings.push(ParseWarning::CorruptContainer(e.to_string()));
                return Detection {
                    format: ProjectFormat::Unknown,
                    version_hint: None,
                    warnings,
                };
            }
        }
    }

    let window = &bytes[..bytes.len().min(PROBE_WINDOW)];

    if has_legacy_text_marker(window) {
        return Detection {
            format: ProjectFormat::LegacyText,
            version_hint: Some("Proteus 7.x".to_string()),
            warnings,
        };
    }

    if LEGACY_BINARY_MARKERS
        .iter()
        .any(|marker| contains_bytes(window, marker))
    {
        return Detection {
            format: ProjectFormat::LegacyBinary,
            version_hint: Some("Proteus 6.x/7.x".to_string()),
            warnings,
        };
    }

    warnings.push(ParseWarning::FormatUnrecognized {
        signature: signature(bytes),
    });
    Detection {
        format: ProjectFormat::Unknown,
        version_hint: None,
        warnings,
    }
}

/// Hex dump of the first 16 bytes, e.g. `50 4B 03 04`
pub fn signature(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take(16)
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_zip_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_LOCAL_MAGIC) || bytes.starts_with(ZIP_EMPTY_MAGIC)
}

/// Infer the Proteus release from archive entry names
fn container_version_hint(names: &[&str]) -> Option<String> {
    if names.iter().any(|n| *n == "PROJECT.XML") {
        Some("Proteus 8.x".to_string())
    } else if names.iter().any(|n| n.to_ascii_lowercase().contains(".dsn")) {
        Some("Proteus 7.x/8.x".to_string())
    } else {
        None
    }
}

fn has_legacy_text_marker(window: &[u8]) -> bool {
    let text = String::from_utf8_lossy(window).to_ascii_lowercase();
    LEGACY_TEXT_MARKERS.iter().any(|marker| text.contains(marker))
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
