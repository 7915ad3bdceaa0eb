//! Export Writers Module
//!
//! This module turns a session's components and connections into the files
//! handed back to the user. Each output format is an `ArtifactWriter`; the
//! `ExportRegistry` dispatches by `ExportTarget`.
//!
//! Supported targets:
//! - Annotated project copy (`.zip`): original upload plus connection manifest
//! - Netlist (`.net`)
//! - Autoroute script (`.scr`)
//! - Wiring guide (`.txt`)
//!
//! Writers are pure: the same inputs always produce the same bytes, and one
//! writer failing never affects another.

pub mod guide;
pub mod netlist;
pub mod nets;
pub mod project_copy;
pub mod script;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connections::Connection;
use crate::parser::schema::Component;
use crate::session::SourceFile;

/// Errors that can occur while rendering one artifact
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{target}: token {token:?} cannot be written: {reason}")]
    MalformedToken {
        target: ExportTarget,
        token: String,
        reason: &'static str,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest serialization failed: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Formatting failed")]
    Format(#[from] fmt::Error),

    #[error("No writer registered for {0}")]
    NoWriter(ExportTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportTarget {
    ProjectCopy,
    Netlist,
    Script,
    Guide,
}

impl ExportTarget {
    pub const ALL: [ExportTarget; 4] = [
        ExportTarget::ProjectCopy,
        ExportTarget::Netlist,
        ExportTarget::Script,
        ExportTarget::Guide,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportTarget::ProjectCopy => "project_copy",
            ExportTarget::Netlist => "netlist",
            ExportTarget::Script => "script",
            ExportTarget::Guide => "guide",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportTarget::ProjectCopy => "zip",
            ExportTarget::Netlist => "net",
            ExportTarget::Script => "scr",
            ExportTarget::Guide => "txt",
        }
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "project_copy" => Ok(ExportTarget::ProjectCopy),
            "netlist" => Ok(ExportTarget::Netlist),
            "script" => Ok(ExportTarget::Script),
            "guide" => Ok(ExportTarget::Guide),
            other => Err(format!(
                "Invalid export target: {}. Valid options: project_copy, netlist, script, guide",
                other
            )),
        }
    }
}

/// Options for export runs
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Archive entry name of the connection manifest in the project copy
    pub manifest_name: String,
    /// Include derived nets in the manifest
    pub include_nets: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            manifest_name: "connections.json".to_string(),
            include_nets: true,
        }
    }
}

/// Everything a writer may read
#[derive(Debug, Clone, Copy)]
pub struct ExportContext<'a> {
    pub components: &'a [Component],
    pub connections: &'a [Connection],
    pub source: &'a SourceFile,
    pub options: &'a ExportOptions,
}

/// Trait for rendering one artifact
pub trait ArtifactWriter {
    /// The target this writer produces
    fn target(&self) -> ExportTarget;

    /// Render the artifact bytes
    fn render(&self, ctx: &ExportContext<'_>) -> Result<Vec<u8>, ExportError>;
}

/// Outcome of one target in a multi-target export
#[derive(Debug)]
pub struct ArtifactResult {
    pub target: ExportTarget,
    pub result: Result<Vec<u8>, ExportError>,
}

impl ArtifactResult {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Registry of available writers
pub struct ExportRegistry {
    writers: Vec<Box<dyn ArtifactWriter + Send + Sync>>,
}

impl ExportRegistry {
    /// Create a new registry with the default writers
    pub fn new() -> Self {
        let mut registry = Self {
            writers: Vec::new(),
        };

        registry.register(Box::new(project_copy::ProjectCopyWriter));
        registry.register(Box::new(netlist::NetlistWriter));
        registry.register(Box::new(script::ScriptWriter));
        registry.register(Box::new(guide::GuideWriter));

        registry
    }

    /// Register a writer; it replaces any earlier writer for the same target
    pub fn register(&mut self, writer: Box<dyn ArtifactWriter + Send + Sync>) {
        let target = writer.target();
        self.writers.retain(|w| w.target() != target);
        self.writers.push(writer);
    }

    pub fn find_writer(&self, target: ExportTarget) -> Option<&(dyn ArtifactWriter + Send + Sync)> {
        self.writers
            .iter()
            .find(|w| w.target() == target)
            .map(|w| w.as_ref())
    }

    /// Render a single target
    pub fn generate(&self, ctx: &ExportContext<'_>, target: ExportTarget) -> Result<Vec<u8>, ExportError> {
        let writer = self.find_writer(target).ok_or(ExportError::NoWriter(target))?;
        let bytes = writer.render(ctx)?;
        tracing::debug!("Rendered {} ({} bytes)", target, bytes.len());
        Ok(bytes)
    }

    /// Render every target independently; failures stay with their target
    pub fn generate_all(&self, ctx: &ExportContext<'_>) -> Vec<ArtifactResult> {
        ExportTarget::ALL
            .iter()
            .map(|&target| {
                let result = self.generate(ctx, target);
                if let Err(e) = &result {
                    tracing::warn!("Export of {} failed: {}", target, e);
                }
                ArtifactResult { target, result }
            })
            .collect()
    }
}

impl Default for ExportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a single target with the default writers
pub fn generate(ctx: &ExportContext<'_>, target: ExportTarget) -> Result<Vec<u8>, ExportError> {
    ExportRegistry::new().generate(ctx, target)
}

/// Render all targets with the default writers
pub fn generate_all(ctx: &ExportContext<'_>) -> Vec<ArtifactResult> {
    ExportRegistry::new().generate_all(ctx)
}

/// Remove characters that would split a line-oriented token
pub(crate) fn strip_breaking_chars(token: &str) -> String {
    token
        .chars()
        .filter(|c| !c.is_control() && !c.is_whitespace())
        .collect()
}
