pub mod container;
pub mod fallback;
pub mod format_detector;
pub mod legacy_binary;
pub mod schema;
pub mod warnings;
pub mod xml;

// Re-export for convenience
pub use format_detector::{detect, signature, Detection};
pub use schema::*;
pub use warnings::{ParseWarning, Warnings};

/// Output of a single extraction strategy run
#[derive(Debug, Clone)]
pub struct Extraction {
    pub components: Vec<Component>,
    pub warnings: Warnings,
    /// Demo components were substituted
    pub synthetic: bool,
}

/// Extract components using the strategy for `format`
///
/// Never fails: unknown formats and strategies that recover nothing fall back
/// to the demo component set with a warning.
pub fn extract(bytes: &[u8], format: ProjectFormat) -> Extraction {
    let mut warnings = Warnings::new();

    let components = match format {
        ProjectFormat::Container => container::extract(bytes, &mut warnings),
        ProjectFormat::LegacyText => {
            let content = String::from_utf8_lossy(bytes);
            xml::extract_components(&content, "project document", &mut warnings)
        }
        ProjectFormat::LegacyBinary => legacy_binary::extract(bytes, &mut warnings),
        ProjectFormat::Unknown => Vec::new(),
    };

    if components.is_empty() {
        tracing::warn!(
            "Could not parse {} project file; using demo components",
            format
        );
        warnings.push(ParseWarning::SyntheticFallback { format });
        return Extraction {
            components: fallback::demo_components(),
            warnings,
            synthetic: true,
        };
    }

    Extraction {
        components,
        warnings,
        synthetic: false,
    }
}

/// Detect, extract, and summarize a project upload
pub fn parse_project(bytes: &[u8]) -> ParsedProject {
    let Detection {
        format,
        version_hint,
        mut warnings,
    } = detect(bytes);

    let extraction = extract(bytes, format);
    warnings.extend(extraction.warnings);

    let info = ParsedFileInfo {
        format,
        version_hint,
        component_count: extraction.components.len(),
        parse_warnings: warnings.into_messages(),
        size: bytes.len(),
        signature: signature(bytes),
        synthetic: extraction.synthetic,
    };

    tracing::info!(
        "Parsed {} project ({} bytes): {} components, {} warnings",
        info.format,
        info.size,
        info.component_count,
        info.parse_warnings.len()
    );

    ParsedProject {
        components: extraction.components,
        info,
    }
}
