//! Annotated project copy
//!
//! Proteus project files are never rewritten. The copy is a ZIP bundle whose
//! entries are stored uncompressed: the upload byte-for-byte under its own
//! file name, and a JSON manifest of the connections next to it.

use std::io::{Cursor, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::nets::derive_nets;
use super::{ArtifactWriter, ExportContext, ExportError, ExportTarget};
use crate::parser::schema::ProjectFormat;

const DEFAULT_PROJECT_NAME: &str = "project.pdsprj";

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    generator: String,
    source: SourceSummary<'a>,
    component_count: usize,
    connections: Vec<ManifestConnection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nets: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Serialize)]
struct SourceSummary<'a> {
    file_name: &'a str,
    format: ProjectFormat,
    version_hint: Option<&'a str>,
    size: usize,
    synthetic: bool,
}

#[derive(Debug, Serialize)]
struct ManifestConnection {
    id: u64,
    from: String,
    to: String,
    created_at: DateTime<Utc>,
}

pub struct ProjectCopyWriter;

impl ArtifactWriter for ProjectCopyWriter {
    fn target(&self) -> ExportTarget {
        ExportTarget::ProjectCopy
    }

    fn render(&self, ctx: &ExportContext<'_>) -> Result<Vec<u8>, ExportError> {
        let manifest_name = ctx.options.manifest_name.as_str();
        let project_name = archive_name(&ctx.source.file_name, manifest_name);

        let manifest = Manifest {
            generator: format!("pdswire {}", env!("CARGO_PKG_VERSION")),
            source: SourceSummary {
                file_name: &ctx.source.file_name,
                format: ctx.source.info.format,
                version_hint: ctx.source.info.version_hint.as_deref(),
                size: ctx.source.bytes.len(),
                synthetic: ctx.source.info.synthetic,
            },
            component_count: ctx.components.len(),
            connections: ctx
                .connections
                .iter()
                .map(|c| ManifestConnection {
                    id: c.id.0,
                    from: c.from.to_string(),
                    to: c.to.to_string(),
                    created_at: c.created_at,
                })
                .collect(),
            nets: ctx.options.include_nets.then(|| {
                derive_nets(ctx.connections)
                    .iter()
                    .map(|net| net.iter().map(|e| e.to_string()).collect())
                    .collect()
            }),
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest)?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(project_name.as_str(), stored_entry())?;
        zip.write_all(&ctx.source.bytes)?;
        zip.start_file(manifest_name, stored_entry())?;
        zip.write_all(&manifest_json)?;
        let cursor = zip.finish()?;

        Ok(cursor.into_inner())
    }
}

/// Uncompressed entry with a fixed timestamp, so the bundle is deterministic
/// and the original bytes stay contiguous
fn stored_entry() -> FileOptions<'static, ()> {
    FileOptions::<()>::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(zip::DateTime::default())
}

/// Entry name for the original upload: its base name, kept clear of the
/// manifest entry
fn archive_name(file_name: &str, manifest_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_PROJECT_NAME);
    if base == manifest_name {
        format!("original_{}", base)
    } else {
        base.to_string()
    }
}
