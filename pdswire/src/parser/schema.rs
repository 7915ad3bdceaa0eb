use std::fmt;
use serde::{Deserialize, Serialize};

/// On-disk encoding of a Proteus project file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectFormat {
    /// ZIP container (Proteus 8+)
    Container,
    /// Structured-text (XML) project
    LegacyText,
    /// Binary ISIS/ARES design
    LegacyBinary,
    Unknown,
}

impl ProjectFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectFormat::Container => "container",
            ProjectFormat::LegacyText => "legacy_text",
            ProjectFormat::LegacyBinary => "legacy_binary",
            ProjectFormat::Unknown => "unknown",
        }
    }

    /// Human readable description for display
    pub fn description(&self) -> &'static str {
        match self {
            ProjectFormat::Container => "ZIP Archive (Proteus 8+)",
            ProjectFormat::LegacyText => "Proteus XML (Legacy)",
            ProjectFormat::LegacyBinary => "Proteus Binary (Legacy)",
            ProjectFormat::Unknown => "Unknown Proteus Format",
        }
    }
}

impl fmt::Display for ProjectFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Ic,
    Resistor,
    Led,
    Switch,
    PowerRail,
    Other,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Ic => "IC",
            ComponentKind::Resistor => "Resistor",
            ComponentKind::Led => "LED",
            ComponentKind::Switch => "Switch",
            ComponentKind::PowerRail => "Power Rail",
            ComponentKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,          // IC1, R1, PWR2
    pub kind: ComponentKind,
    pub device: String,      // ARDUINO_UNO_R3, RES, LED-RED
    pub value: Option<String>,
    pub pins: Vec<Pin>,
}

impl Component {
    /// Build a component from pin names, assigning indices in order
    pub fn new<I, S>(id: impl Into<String>, kind: ComponentKind, device: impl Into<String>, pins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            kind,
            device: device.into(),
            value: None,
            pins: pins
                .into_iter()
                .enumerate()
                .map(|(index, name)| Pin { name: name.into(), index })
                .collect(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn pin(&self, name: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.name == name)
    }

    pub fn has_pin(&self, name: &str) -> bool {
        self.pin(name).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub name: String,
    pub index: usize,
}

/// Summary of one uploaded project file, produced once per parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFileInfo {
    pub format: ProjectFormat,
    pub version_hint: Option<String>,
    pub component_count: usize,
    pub parse_warnings: Vec<String>,
    pub size: usize,
    /// First 16 bytes as uppercase hex, space separated
    pub signature: String,
    /// True when the demo component set replaced the file's contents
    pub synthetic: bool,
}

/// Components plus file info returned by `parse_project`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedProject {
    pub components: Vec<Component>,
    pub info: ParsedFileInfo,
}

impl ParsedProject {
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }
}
