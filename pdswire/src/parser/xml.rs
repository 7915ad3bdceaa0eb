//! Proteus XML Component Extraction
//!
//! Streams an XML project document and collects component declarations and
//! power rails. Used for the schematic entries of ZIP containers and for
//! legacy XML project files alike.
//!
//! Recognized structure (tag and attribute names are case-insensitive):
//! - Declarations: `COMPONENT`, `PART`, `DEVICE`, `SYMBOL`, `INSTANCE`,
//!   `COMPINST`, `ELEMENT`
//! - Pins: `PIN` / `CONNECT` nested inside a declaration
//! - Power rails: `POWER`, `RAIL`, `NET`, `WIRE` named after a supply net
//!
//! Anything else is skipped.

use std::collections::HashSet;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::parser::fallback::{default_pins, infer_kind, power_value};
use crate::parser::schema::{Component, ComponentKind};
use crate::parser::warnings::{ParseWarning, Warnings};

const DECLARATION_TAGS: &[&str] = &["component", "part", "device", "symbol", "instance", "compinst", "element"];
const PIN_TAGS: &[&str] = &["pin", "connect"];
const RAIL_TAGS: &[&str] = &["power", "rail", "net", "wire"];

const REFERENCE_ATTRS: &[&str] = &["refdes", "name", "id", "ref", "designator"];
const DEVICE_ATTRS: &[&str] = &["device", "type", "library", "part"];
const VALUE_ATTRS: &[&str] = &["value", "val", "model", "package"];
const PIN_NAME_ATTRS: &[&str] = &["name", "pinname", "pinnum", "number", "id"];
const RAIL_NAME_ATTRS: &[&str] = &["name", "id"];

const POWER_KEYWORDS: &[&str] = &["VCC", "5V", "GND", "GROUND", "VDD", "VSS", "3V3", "12V"];

const MAX_REFERENCE_LEN: usize = 50;
const MAX_PIN_NAME_LEN: usize = 25;

/// Declaration whose closing tag has not been seen yet
#[derive(Debug)]
struct OpenDeclaration {
    reference: Option<String>,
    device: String,
    value: Option<String>,
    pins: Vec<String>,
}

/// Id to assign once the whole document has been seen
#[derive(Debug)]
struct PendingId {
    prefix: &'static str,
    ordinal: usize,
    missing_pins: bool,
}

#[derive(Debug)]
struct Entry {
    component: Component,
    pending: Option<PendingId>,
}

/// Collected output plus bookkeeping for id uniqueness
///
/// Explicit reference designators are claimed as they are read. Generated
/// ids (`U<n>`, `PWR<n>`) are handed out in `finish`, skipping every
/// explicit designator, so a real component is never displaced.
#[derive(Debug, Default)]
struct Collector {
    entries: Vec<Entry>,
    ids: HashSet<String>,
    rail_names: HashSet<String>,
    counter: usize,
}

impl Collector {
    fn finish_declaration(&mut self, decl: OpenDeclaration, warnings: &mut Warnings) {
        self.counter += 1;

        let Some(id) = decl.reference else {
            // Kind and pin template depend only on the `U` prefix
            let missing_pins = decl.pins.is_empty();
            let kind = infer_kind("U", &decl.device);
            let mut component = if missing_pins {
                Component::new("", kind, &decl.device, default_pins("U", &decl.device).iter().copied())
            } else {
                Component::new("", kind, &decl.device, decl.pins)
            };
            component.value = decl.value;
            self.entries.push(Entry {
                component,
                pending: Some(PendingId {
                    prefix: "U",
                    ordinal: self.counter,
                    missing_pins,
                }),
            });
            return;
        };

        if !self.ids.insert(id.clone()) {
            warnings.push(ParseWarning::DuplicateReference(id));
            return;
        }

        let kind = infer_kind(&id, &decl.device);
        let mut component = if decl.pins.is_empty() {
            warnings.push(ParseWarning::MissingPins(id.clone()));
            Component::new(&id, kind, &decl.device, default_pins(&id, &decl.device).iter().copied())
        } else {
            Component::new(&id, kind, &decl.device, decl.pins)
        };
        component.value = decl.value;
        self.entries.push(Entry {
            component,
            pending: None,
        });
    }

    fn add_rail(&mut self, raw_name: &str) {
        let name = clean_text(raw_name, MAX_REFERENCE_LEN);
        if name.is_empty() {
            return;
        }
        let upper = name.to_ascii_uppercase();
        if !POWER_KEYWORDS.iter().any(|k| upper.contains(k)) {
            return;
        }
        if !self.rail_names.insert(upper) {
            return;
        }

        self.counter += 1;
        let rail = Component::new("", ComponentKind::PowerRail, &name, ["OUT"])
            .with_value(power_value(&name));
        self.entries.push(Entry {
            component: rail,
            pending: Some(PendingId {
                prefix: "PWR",
                ordinal: self.counter,
                missing_pins: false,
            }),
        });
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Assign generated ids and return components in document order
    fn finish(self, warnings: &mut Warnings) -> Vec<Component> {
        let Collector {
            entries, mut ids, ..
        } = self;

        entries
            .into_iter()
            .map(|entry| {
                let mut component = entry.component;
                if let Some(pending) = entry.pending {
                    let mut n = pending.ordinal;
                    let id = loop {
                        let candidate = format!("{}{}", pending.prefix, n);
                        if ids.insert(candidate.clone()) {
                            break candidate;
                        }
                        n += 1;
                    };
                    if pending.missing_pins {
                        warnings.push(ParseWarning::MissingPins(id.clone()));
                    }
                    component.id = id;
                }
                component
            })
            .collect()
    }
}

/// Extract components from an XML document
///
/// `source_name` only labels warnings. Malformed XML stops the scan but keeps
/// every declaration completed before the error.
pub fn extract_components(content: &str, source_name: &str, warnings: &mut Warnings) -> Vec<Component> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut collector = Collector::default();
    let mut open: Vec<OpenDeclaration> = Vec::new();
    let mut awaiting_rail_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = tag_name(e);
                if is_one_of(&tag, DECLARATION_TAGS) {
                    open.push(open_declaration(e));
                } else if is_one_of(&tag, PIN_TAGS) {
                    add_pin(&mut open, e);
                } else if is_one_of(&tag, RAIL_TAGS) {
                    match find_attr(e, RAIL_NAME_ATTRS) {
                        Some(name) => collector.add_rail(&name),
                        None => awaiting_rail_text = true,
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                let tag = tag_name(e);
                if is_one_of(&tag, DECLARATION_TAGS) {
                    let decl = open_declaration(e);
                    collector.finish_declaration(decl, warnings);
                } else if is_one_of(&tag, PIN_TAGS) {
                    add_pin(&mut open, e);
                } else if is_one_of(&tag, RAIL_TAGS) {
                    if let Some(name) = find_attr(e, RAIL_NAME_ATTRS) {
                        collector.add_rail(&name);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
                if is_one_of(&tag, DECLARATION_TAGS) {
                    if let Some(decl) = open.pop() {
                        collector.finish_declaration(decl, warnings);
                    }
                } else if is_one_of(&tag, RAIL_TAGS) {
                    awaiting_rail_text = false;
                }
            }
            Ok(Event::Text(ref t)) => {
                if awaiting_rail_text {
                    let text = String::from_utf8_lossy(t);
                    collector.add_rail(&text);
                    awaiting_rail_text = false;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                let reason = format!("{} at byte {}", e, reader.buffer_position());
                tracing::warn!("XML error in {}: {}", source_name, reason);
                warnings.push(ParseWarning::MalformedContent {
                    source_name: source_name.to_string(),
                    reason,
                });
                if collector.len() > 0 {
                    warnings.push(ParseWarning::PartialExtraction {
                        source_name: source_name.to_string(),
                        recovered: collector.len(),
                    });
                }
                return collector.finish(warnings);
            }
        }
    }

    // Unclosed declarations at end of input still count
    while let Some(decl) = open.pop() {
        collector.finish_declaration(decl, warnings);
    }

    tracing::debug!(
        "Extracted {} components from {}",
        collector.len(),
        source_name
    );
    collector.finish(warnings)
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase()
}

fn is_one_of(tag: &str, names: &[&str]) -> bool {
    names.iter().any(|n| *n == tag)
}

/// First non-empty attribute among `keys`, in key order
fn find_attr(e: &BytesStart<'_>, keys: &[&str]) -> Option<String> {
    let attrs: Vec<(String, String)> = e
        .attributes()
        .flatten()
        .map(|a| {
            let key = String::from_utf8_lossy(a.key.local_name().as_ref()).to_ascii_lowercase();
            let value = match a.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
            };
            (key, value)
        })
        .collect();

    keys.iter().find_map(|key| {
        attrs
            .iter()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.clone())
    })
}

fn open_declaration(e: &BytesStart<'_>) -> OpenDeclaration {
    let reference = find_attr(e, REFERENCE_ATTRS)
        .map(|r| clean_identifier(&r, MAX_REFERENCE_LEN))
        .filter(|r| !r.is_empty() && r != "Unknown");
    let device = find_attr(e, DEVICE_ATTRS)
        .map(|d| clean_text(&d, MAX_REFERENCE_LEN))
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let value = find_attr(e, VALUE_ATTRS)
        .map(|v| clean_text(&v, MAX_REFERENCE_LEN))
        .filter(|v| !v.is_empty());

    OpenDeclaration {
        reference,
        device,
        value,
        pins: Vec::new(),
    }
}

fn add_pin(open: &mut [OpenDeclaration], e: &BytesStart<'_>) {
    // Pins outside any declaration carry no owner
    let Some(decl) = open.last_mut() else {
        return;
    };
    let name = match find_attr(e, PIN_NAME_ATTRS) {
        Some(raw) => clean_pin_name(&raw),
        None => format!("Pin{}", decl.pins.len() + 1),
    };
    decl.pins.push(name);
}

/// Strip control characters and surrounding whitespace, cap the length
pub fn clean_text(raw: &str, max_len: usize) -> String {
    raw.chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .chars()
        .take(max_len)
        .collect()
}

/// Like `clean_text`, with inner whitespace runs replaced by `_` so the
/// result is a single token
pub fn clean_identifier(raw: &str, max_len: usize) -> String {
    clean_text(raw, usize::MAX)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(max_len)
        .collect()
}

pub fn clean_pin_name(raw: &str) -> String {
    let cleaned = clean_identifier(raw, MAX_PIN_NAME_LEN);
    if cleaned.is_empty() {
        "Pin".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_declarations_with_pins() {
        let xml = r#"<?xml version="1.0"?>
<PROJECT>
  <COMPONENT REFDES="IC1" DEVICE="ARDUINO_UNO_R3">
    <PIN NAME="D13"/>
    <PIN NAME="GND"/>
  </COMPONENT>
  <COMPONENT REFDES="D1" DEVICE="LED-RED" VALUE="Red">
    <PIN NAME="A"/>
    <PIN NAME="K"/>
  </COMPONENT>
</PROJECT>"#;
        let mut warnings = Warnings::new();
        let components = extract_components(xml, "PROJECT.XML", &mut warnings);

        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].id, "IC1");
        assert_eq!(components[0].kind, ComponentKind::Ic);
        assert_eq!(components[0].pins[0].name, "D13");
        assert_eq!(components[0].pins[1].index, 1);
        assert_eq!(components[1].value.as_deref(), Some("Red"));
        assert_eq!(components[1].kind, ComponentKind::Led);
    }

    #[test]
    fn test_case_insensitive_tags_and_attrs() {
        let xml = r#"<design><part ref="R7" type="RES"><connect pinnum="1"/><connect pinnum="2"/></part></design>"#;
        let mut warnings = Warnings::new();
        let components = extract_components(xml, "doc", &mut warnings);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].id, "R7");
        assert_eq!(components[0].device, "RES");
        let names: Vec<_> = components[0].pins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["1", "2"]);
    }

    #[test]
    fn test_missing_pins_use_template_and_warn() {
        let xml = r#"<PROJECT><COMPONENT REFDES="SW2" DEVICE="BUTTON"/></PROJECT>"#;
        let mut warnings = Warnings::new();
        let components = extract_components(xml, "doc", &mut warnings);
        assert_eq!(components[0].pins.len(), 4);
        assert_eq!(
            warnings.iter().next(),
            Some(&ParseWarning::MissingPins("SW2".to_string()))
        );
    }

    #[test]
    fn test_unnamed_pins_and_declarations() {
        let xml = r#"<PROJECT><INSTANCE><PIN/><PIN/></INSTANCE></PROJECT>"#;
        let mut warnings = Warnings::new();
        let components = extract_components(xml, "doc", &mut warnings);
        assert_eq!(components[0].id, "U1");
        assert_eq!(components[0].pins[0].name, "Pin1");
        assert_eq!(components[0].pins[1].name, "Pin2");
    }

    #[test]
    fn test_explicit_reference_wins_over_generated_id() {
        let xml = r#"<PROJECT>
  <INSTANCE><PIN NAME="X"/></INSTANCE>
  <COMPONENT REFDES="U1" DEVICE="NE555">
    <PIN NAME="TRIG"/>
    <PIN NAME="OUT"/>
  </COMPONENT>
</PROJECT>"#;
        let mut warnings = Warnings::new();
        let components = extract_components(xml, "doc", &mut warnings);

        assert_eq!(components.len(), 2);
        assert!(warnings
            .iter()
            .all(|w| !matches!(w, ParseWarning::DuplicateReference(_))));

        let named = components.iter().find(|c| c.id == "U1").unwrap();
        assert_eq!(named.device, "NE555");
        assert_eq!(named.pins[0].name, "TRIG");

        let anonymous = components.iter().find(|c| c.id != "U1").unwrap();
        assert_eq!(anonymous.id, "U2");
        assert_eq!(anonymous.pins[0].name, "X");
    }

    #[test]
    fn test_generated_rail_id_skips_explicit_reference() {
        let xml = r#"<P><NET NAME="VCC"/><COMPONENT REFDES="PWR1" DEVICE="BAT"><PIN NAME="+"/></COMPONENT></P>"#;
        let mut warnings = Warnings::new();
        let components = extract_components(xml, "doc", &mut warnings);

        assert_eq!(components.len(), 2);
        assert_eq!(components[0].device, "VCC");
        assert_eq!(components[0].id, "PWR2");
        assert_eq!(components[1].id, "PWR1");
        assert_eq!(components[1].device, "BAT");
    }

    #[test]
    fn test_long_reference_truncated() {
        let reference = "R".repeat(60);
        let xml = format!(r#"<P><COMPONENT REFDES="{}"><PIN NAME="1"/></COMPONENT></P>"#, reference);
        let mut warnings = Warnings::new();
        let components = extract_components(&xml, "doc", &mut warnings);

        assert_eq!(components.len(), 1);
        assert_eq!(components[0].id.len(), 50);
        assert_eq!(components[0].id, "R".repeat(50));
    }

    #[test]
    fn test_power_rails_deduplicated() {
        let xml = r#"<PROJECT>
  <NET NAME="GND"/>
  <WIRE NAME="GND"/>
  <NET NAME="SIG_A"/>
  <POWER>VCC</POWER>
</PROJECT>"#;
        let mut warnings = Warnings::new();
        let components = extract_components(xml, "doc", &mut warnings);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].kind, ComponentKind::PowerRail);
        assert_eq!(components[0].device, "GND");
        assert_eq!(components[0].value.as_deref(), Some("0V (Ground)"));
        assert_eq!(components[1].device, "VCC");
        assert_ne!(components[0].id, components[1].id);
        assert_eq!(components[1].pins[0].name, "OUT");
    }

    #[test]
    fn test_duplicate_reference_dropped() {
        let xml = r#"<P><COMPONENT REFDES="R1"><PIN NAME="1"/></COMPONENT><COMPONENT REFDES="R1"><PIN NAME="2"/></COMPONENT></P>"#;
        let mut warnings = Warnings::new();
        let components = extract_components(xml, "doc", &mut warnings);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].pins[0].name, "1");
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ParseWarning::DuplicateReference(r) if r == "R1")));
    }

    #[test]
    fn test_malformed_keeps_completed_declarations() {
        let xml = r#"<P><COMPONENT REFDES="R1"><PIN NAME="1"/></COMPONENT><COMPONENT REFDES="R2"></WRONG></P>"#;
        let mut warnings = Warnings::new();
        let components = extract_components(xml, "broken.xml", &mut warnings);
        assert_eq!(components.len(), 1);
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ParseWarning::MalformedContent { .. })));
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ParseWarning::PartialExtraction { recovered: 1, .. })));
    }

    #[test]
    fn test_clean_identifier() {
        assert_eq!(clean_identifier("  U 1\t", 50), "U_1");
        assert_eq!(clean_identifier("IC\u{0007}1", 50), "IC1");
        assert_eq!(clean_pin_name("   "), "Pin");
        assert_eq!(clean_pin_name(&"X".repeat(40)).len(), 25);
    }
}
