//! Parser tests against fixture files and in-test containers

use std::io::{Cursor, Write};
use std::path::PathBuf;

use pdswire::parser::fallback::demo_components;
use pdswire::{parse_project, ComponentKind, ProjectFormat};
use zip::write::FileOptions;
use zip::ZipWriter;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).expect("fixture should exist")
}

fn container(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        zip.start_file(*name, FileOptions::<()>::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn demo_ids() -> Vec<String> {
    demo_components().into_iter().map(|c| c.id).collect()
}

#[test]
fn test_container_fixture() {
    let project = parse_project(&fixture("blinky_container.pdsprj"));

    assert_eq!(project.info.format, ProjectFormat::Container);
    assert_eq!(project.info.version_hint.as_deref(), Some("Proteus 8.x"));
    assert!(
        project.info.parse_warnings.is_empty(),
        "unexpected warnings: {:?}",
        project.info.parse_warnings
    );
    assert!(!project.info.synthetic);

    let ic1 = project.component("IC1").expect("IC1 should be extracted");
    assert_eq!(ic1.kind, ComponentKind::Ic);
    assert!(ic1.has_pin("D13"));
    let d1 = project.component("D1").expect("D1 should be extracted");
    let pins: Vec<_> = d1.pins.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(pins, ["A", "K"]);
}

#[test]
fn test_n_declarations_give_n_components() {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<PROJECT>\n");
    for i in 1..=7 {
        xml.push_str(&format!(
            "  <COMPONENT REFDES=\"R{i}\" DEVICE=\"RES\">\n    <PIN NAME=\"1\"/>\n    <PIN NAME=\"2\"/>\n  </COMPONENT>\n"
        ));
    }
    xml.push_str("</PROJECT>\n");

    let project = parse_project(&container(&[("PROJECT.XML", &xml)]));

    assert_eq!(project.components.len(), 7);
    assert_eq!(project.info.component_count, 7);
    assert!(project.info.parse_warnings.is_empty());
    for (i, component) in project.components.iter().enumerate() {
        assert_eq!(component.id, format!("R{}", i + 1));
        let pins: Vec<_> = component.pins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(pins, ["1", "2"]);
    }
}

#[test]
fn test_container_prefers_project_xml() {
    let bytes = container(&[
        ("sheet.dsn", "<DESIGN><COMPONENT REFDES=\"U9\"><PIN NAME=\"1\"/></COMPONENT></DESIGN>"),
        ("PROJECT.XML", "<PROJECT><COMPONENT REFDES=\"U1\"><PIN NAME=\"1\"/></COMPONENT></PROJECT>"),
    ]);
    let project = parse_project(&bytes);
    assert_eq!(project.components.len(), 1);
    assert_eq!(project.components[0].id, "U1");
}

#[test]
fn test_anonymous_declaration_keeps_explicit_u1() {
    let bytes = container(&[(
        "PROJECT.XML",
        "<PROJECT><INSTANCE><PIN NAME=\"X\"/></INSTANCE><COMPONENT REFDES=\"U1\" DEVICE=\"NE555\"><PIN NAME=\"TRIG\"/></COMPONENT></PROJECT>",
    )]);
    let project = parse_project(&bytes);

    assert_eq!(project.components.len(), 2);
    assert_eq!(project.component("U1").unwrap().device, "NE555");
    assert!(project.component("U2").unwrap().pin("X").is_some());
    assert!(project.info.parse_warnings.iter().all(|w| !w.contains("Duplicate")));
}

#[test]
fn test_container_without_schematic_falls_back() {
    let bytes = container(&[("readme.txt", "hello")]);
    let project = parse_project(&bytes);

    assert_eq!(project.info.format, ProjectFormat::Container);
    assert!(project.info.synthetic);
    assert!(project
        .info
        .parse_warnings
        .iter()
        .any(|w| w.contains("No schematic entry")));
}

#[test]
fn test_legacy_text_fixture() {
    let project = parse_project(&fixture("legacy_blinky.pdsprj"));

    assert_eq!(project.info.format, ProjectFormat::LegacyText);
    assert_eq!(project.info.version_hint.as_deref(), Some("Proteus 7.x"));
    assert!(!project.info.synthetic);

    let u1 = project.component("U1").unwrap();
    assert!(u1.has_pin("PB5"));
    assert_eq!(project.component("R1").unwrap().value.as_deref(), Some("220R"));

    // LED1 declares no pins and gets the diode template
    let led = project.component("LED1").unwrap();
    assert_eq!(led.kind, ComponentKind::Led);
    assert!(led.has_pin("A") && led.has_pin("K"));
    assert!(project.info.parse_warnings.iter().any(|w| w.contains("LED1")));

    let rails = project
        .components
        .iter()
        .filter(|c| c.kind == ComponentKind::PowerRail)
        .count();
    assert_eq!(rails, 2);
}

#[test]
fn test_legacy_binary_fixture() {
    let project = parse_project(&fixture("legacy_binary.pdsprj"));

    assert_eq!(project.info.format, ProjectFormat::LegacyBinary);
    let ids: Vec<_> = project.components.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["U1", "R1", "D1"]);
    assert_eq!(project.component("R1").unwrap().device, "RES");
    assert!(
        !project.info.parse_warnings.is_empty(),
        "binary recovery must always be flagged"
    );
}

#[test]
fn test_empty_and_corrupt_inputs_fall_back_identically() {
    let truncated_zip = b"PK\x03\x04\x14\x00\x00\x00garbage".to_vec();
    let inputs = [
        Vec::new(),
        fixture("garbage.pdsprj"),
        truncated_zip,
    ];

    for bytes in &inputs {
        let project = parse_project(bytes);
        assert_eq!(project.info.format, ProjectFormat::Unknown);
        assert!(project.info.synthetic);
        assert!(!project.info.parse_warnings.is_empty());
        let ids: Vec<_> = project.components.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, demo_ids());
        assert_eq!(project.components, demo_components());
    }
}

#[test]
fn test_parse_is_deterministic() {
    let bytes = fixture("legacy_blinky.pdsprj");
    let a = parse_project(&bytes);
    let b = parse_project(&bytes);
    assert_eq!(a.components, b.components);
    assert_eq!(a.info, b.info);
}
