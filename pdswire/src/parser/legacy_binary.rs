//! Legacy ISIS binary recovery
//!
//! Pre-XML Proteus designs are an undocumented binary format. Component
//! records still carry their reference designator and device name as plain
//! ASCII, so this scanner walks printable runs and keeps the ones shaped like
//! reference designators. The result is always lossy.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::fallback::templated_component;
use crate::parser::schema::Component;
use crate::parser::warnings::{ParseWarning, Warnings};

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(IC|U|R|C|D|LED|SW|S|Q|J|L)[0-9]{1,3}$").expect("valid regex"));

/// Shortest printable run considered a token
const MIN_RUN: usize = 2;
/// Shortest run accepted as a device name
const MIN_DEVICE_LEN: usize = 3;
/// How far past a designator a device name may sit, in bytes
const RECORD_SPAN: usize = 64;
const MAX_COMPONENTS: usize = 256;

/// A printable ASCII run and its byte offset
#[derive(Debug)]
struct Run<'a> {
    offset: usize,
    text: &'a str,
}

fn printable_runs(bytes: &[u8]) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut start = None;

    for (i, b) in bytes.iter().enumerate() {
        let printable = b.is_ascii_graphic();
        match (printable, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                push_run(bytes, s, i, &mut runs);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        push_run(bytes, s, bytes.len(), &mut runs);
    }
    runs
}

fn push_run<'a>(bytes: &'a [u8], start: usize, end: usize, runs: &mut Vec<Run<'a>>) {
    if end - start < MIN_RUN {
        return;
    }
    // Graphic ASCII is valid UTF-8
    if let Ok(text) = std::str::from_utf8(&bytes[start..end]) {
        runs.push(Run { offset: start, text });
    }
}

fn is_reference(token: &str) -> bool {
    REFERENCE_PATTERN.is_match(token)
}

/// Recover plausible component records from a binary design
pub fn extract(bytes: &[u8], warnings: &mut Warnings) -> Vec<Component> {
    let runs = printable_runs(bytes);
    let mut seen = HashSet::new();
    let mut components = Vec::new();

    for (i, run) in runs.iter().enumerate() {
        if !is_reference(run.text) || !seen.insert(run.text) {
            continue;
        }
        if components.len() >= MAX_COMPONENTS {
            tracing::warn!("Legacy binary scan stopped at {} components", MAX_COMPONENTS);
            warnings.push(ParseWarning::ScanTruncated(MAX_COMPONENTS));
            break;
        }

        let device = runs[i + 1..]
            .iter()
            .take_while(|next| next.offset - run.offset <= RECORD_SPAN)
            .find(|next| next.text.len() >= MIN_DEVICE_LEN && !is_reference(next.text))
            .map(|next| next.text)
            .unwrap_or("Unknown");

        components.push(templated_component(run.text, device));
    }

    warnings.push(ParseWarning::LowConfidence(components.len()));
    tracing::info!(
        "Recovered {} components from legacy binary design",
        components.len()
    );
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::ComponentKind;

    fn record(reference: &str, device: &str) -> Vec<u8> {
        let mut bytes = vec![0x00, 0x10, 0x02];
        bytes.extend_from_slice(reference.as_bytes());
        bytes.extend_from_slice(&[0x00, 0x04]);
        bytes.extend_from_slice(device.as_bytes());
        bytes.extend_from_slice(&[0x00, 0xFF, 0x00]);
        bytes
    }

    #[test]
    fn test_recovers_records() {
        let mut bytes = b"ISIS\x00\x01".to_vec();
        bytes.extend(record("U1", "NE555"));
        bytes.extend(record("R1", "RES"));
        bytes.extend(record("D2", "LED-GREEN"));

        let mut warnings = Warnings::new();
        let components = extract(&bytes, &mut warnings);

        let ids: Vec<_> = components.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["U1", "R1", "D2"]);
        assert_eq!(components[0].device, "NE555");
        assert_eq!(components[2].kind, ComponentKind::Led);
        assert_eq!(components[2].pins.len(), 2);
        assert_eq!(warnings.iter().next(), Some(&ParseWarning::LowConfidence(3)));
    }

    #[test]
    fn test_duplicates_and_noise_ignored() {
        let mut bytes = b"ARES\x00".to_vec();
        bytes.extend(record("R1", "RES"));
        bytes.extend(record("R1", "RES"));
        bytes.extend_from_slice(b"\x00RESISTANCE\x00R1000\x00");

        let mut warnings = Warnings::new();
        let components = extract(&bytes, &mut warnings);
        assert_eq!(components.len(), 1);
    }

    #[test]
    fn test_component_cap_reported() {
        let mut bytes = b"ISIS\x00".to_vec();
        for n in 1..=300 {
            bytes.extend(record(&format!("R{}", n), "RES"));
        }

        let mut warnings = Warnings::new();
        let components = extract(&bytes, &mut warnings);

        assert_eq!(components.len(), 256);
        assert_eq!(components[255].id, "R256");
        assert!(warnings
            .iter()
            .any(|w| *w == ParseWarning::ScanTruncated(256)));
        assert!(warnings
            .iter()
            .any(|w| *w == ParseWarning::LowConfidence(256)));
    }

    #[test]
    fn test_exactly_at_cap_not_truncated() {
        let mut bytes = b"ISIS\x00".to_vec();
        for n in 1..=256 {
            bytes.extend(record(&format!("C{}", n), "CAP"));
        }

        let mut warnings = Warnings::new();
        let components = extract(&bytes, &mut warnings);

        assert_eq!(components.len(), 256);
        assert!(!warnings
            .iter()
            .any(|w| matches!(w, ParseWarning::ScanTruncated(_))));
    }

    #[test]
    fn test_always_warns() {
        let mut warnings = Warnings::new();
        let components = extract(b"ISIS only", &mut warnings);
        assert!(components.is_empty());
        assert_eq!(warnings.len(), 1);
    }
}
