//! Synthetic component data
//!
//! Default pin sets for components whose pins could not be recovered, kind
//! inference from reference designators, and the fixed demo component set
//! substituted when a project file cannot be parsed at all.

use crate::parser::schema::{Component, ComponentKind};

const ARDUINO_UNO_PINS: &[&str] = &[
    "VIN", "GND", "5V", "3V3", "RESET", "D0", "D1", "D2", "D3", "D4", "D5", "D6", "D7", "D8",
    "D9", "D10", "D11", "D12", "D13", "A0", "A1", "A2", "A3", "A4", "A5",
];

const ARDUINO_TEMPLATE_PINS: &[&str] = &["VIN", "GND", "5V", "3V3", "D0", "D1", "D2", "D13", "A0", "A1"];
const IC_PINS: &[&str] = &["VCC", "GND", "1", "2"];
const TWO_TERMINAL_PINS: &[&str] = &["1", "2"];
const DIODE_PINS: &[&str] = &["A", "K"];
const CAPACITOR_PINS: &[&str] = &["+", "-"];
const SWITCH_PINS: &[&str] = &["1", "2", "3", "4"];
const RAIL_PINS: &[&str] = &["OUT"];

/// Infer a component kind from its reference designator and device token
pub fn infer_kind(reference: &str, device: &str) -> ComponentKind {
    let reference = reference.to_ascii_uppercase();
    let device = device.to_ascii_uppercase();

    let by_prefix = if reference.starts_with("PWR") {
        ComponentKind::PowerRail
    } else if reference.starts_with("IC") || reference.starts_with('U') {
        ComponentKind::Ic
    } else if reference.starts_with("LED") || reference.starts_with('D') {
        ComponentKind::Led
    } else if reference.starts_with("SW") || reference.starts_with('S') {
        ComponentKind::Switch
    } else if reference.starts_with('R') {
        ComponentKind::Resistor
    } else {
        ComponentKind::Other
    };

    if by_prefix != ComponentKind::Other {
        return by_prefix;
    }

    if device.contains("LED") {
        ComponentKind::Led
    } else if device.contains("RES") {
        ComponentKind::Resistor
    } else if device.contains("SWITCH") || device.contains("BUTTON") {
        ComponentKind::Switch
    } else {
        ComponentKind::Other
    }
}

/// Default pin names for a component, keyed by reference prefix
pub fn default_pins(reference: &str, device: &str) -> &'static [&'static str] {
    let reference = reference.to_ascii_uppercase();

    if reference.starts_with("PWR") {
        RAIL_PINS
    } else if reference.starts_with("IC") || reference.starts_with('U') {
        if device.to_ascii_lowercase().contains("arduino") {
            ARDUINO_TEMPLATE_PINS
        } else {
            IC_PINS
        }
    } else if reference.starts_with('R') {
        TWO_TERMINAL_PINS
    } else if reference.starts_with("LED") || reference.starts_with('D') {
        DIODE_PINS
    } else if reference.starts_with('C') {
        CAPACITOR_PINS
    } else if reference.starts_with("SW") || reference.starts_with('S') {
        SWITCH_PINS
    } else {
        TWO_TERMINAL_PINS
    }
}

/// Build a component whose pins come from the default template
pub fn templated_component(reference: &str, device: &str) -> Component {
    Component::new(
        reference,
        infer_kind(reference, device),
        device,
        default_pins(reference, device).iter().copied(),
    )
}

/// Voltage label for a power net name
pub fn power_value(net_name: &str) -> &'static str {
    let upper = net_name.to_ascii_uppercase();
    if upper.contains("5V") || upper.contains("VCC") {
        "5V"
    } else if upper.contains("3V3") || upper.contains("3.3V") {
        "3.3V"
    } else if upper.contains("12V") {
        "12V"
    } else if upper.contains("GND") || upper.contains("GROUND") || upper.contains("VSS") {
        "0V (Ground)"
    } else {
        "Power"
    }
}

/// The fixed demo set shown when a file cannot be parsed
///
/// Always the same ids, order and pins so the editor has a stable model.
pub fn demo_components() -> Vec<Component> {
    vec![
        Component::new("IC1", ComponentKind::Ic, "ARDUINO_UNO_R3", ARDUINO_UNO_PINS.iter().copied())
            .with_value("Arduino Uno R3"),
        Component::new("D1", ComponentKind::Led, "LED-RED", DIODE_PINS.iter().copied())
            .with_value("5mm Red LED"),
        Component::new("R1", ComponentKind::Resistor, "RES", TWO_TERMINAL_PINS.iter().copied())
            .with_value("220Ω"),
        Component::new("SW1", ComponentKind::Switch, "BUTTON", SWITCH_PINS.iter().copied())
            .with_value("Tactile Switch"),
        Component::new("PWR1", ComponentKind::PowerRail, "5V", RAIL_PINS.iter().copied())
            .with_value("5V"),
        Component::new("PWR2", ComponentKind::PowerRail, "GND", RAIL_PINS.iter().copied())
            .with_value("0V (Ground)"),
    ]
}
