//! Non-fatal parse diagnostics.
//!
//! Detection and extraction never fail; every strategy pushes into a
//! `Warnings` accumulator instead and the caller decides what to surface.

use thiserror::Error;

use super::schema::ProjectFormat;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("File format not recognized (signature: {signature})")]
    FormatUnrecognized { signature: String },

    #[error("Archive container is corrupt and could not be opened: {0}")]
    CorruptContainer(String),

    #[error("No schematic entry found in archive")]
    MissingSchematicEntry,

    #[error("Archive entry {entry} could not be read: {reason}")]
    UnreadableEntry { entry: String, reason: String },

    #[error("Malformed structured content in {source_name}: {reason}")]
    MalformedContent { source_name: String, reason: String },

    #[error("Partial extraction from {source_name}: kept {recovered} component(s) before error")]
    PartialExtraction { source_name: String, recovered: usize },

    #[error("Component {0} declares no pins; using default pin set")]
    MissingPins(String),

    #[error("Duplicate reference designator {0} ignored")]
    DuplicateReference(String),

    #[error("Legacy binary file: {0} component(s) recovered heuristically, reduced confidence")]
    LowConfidence(usize),

    #[error("Legacy binary scan stopped at {0} components; later records ignored")]
    ScanTruncated(usize),

    #[error("Could not parse {format} project file; showing synthetic demo components")]
    SyntheticFallback { format: ProjectFormat },
}

/// Ordered warning accumulator threaded through detection and extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Warnings(Vec<ParseWarning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: ParseWarning) {
        tracing::debug!("parse warning: {}", warning);
        self.0.push(warning);
    }

    pub fn extend(&mut self, other: Warnings) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseWarning> {
        self.0.iter()
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0.into_iter().map(|w| w.to_string()).collect()
    }
}

impl IntoIterator for Warnings {
    type Item = ParseWarning;
    type IntoIter = std::vec::IntoIter<ParseWarning>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
