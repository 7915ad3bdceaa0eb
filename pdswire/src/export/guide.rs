//! Wiring guide writer
//!
//! Plain-text instructions for wiring by hand when the autoroute script
//! cannot run: a numbered list in connection order, then the same
//! connections grouped per component.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::{ArtifactWriter, ExportContext, ExportError, ExportTarget};

const RULE: &str = "================================================================";

pub struct GuideWriter;

impl ArtifactWriter for GuideWriter {
    fn target(&self) -> ExportTarget {
        ExportTarget::Guide
    }

    fn render(&self, ctx: &ExportContext<'_>) -> Result<Vec<u8>, ExportError> {
        let mut out = String::new();

        writeln!(out, "{}", RULE)?;
        writeln!(out, "PROTEUS WIRING GUIDE")?;
        writeln!(out, "{}", RULE)?;
        writeln!(out, "Project: {}", printable(&ctx.source.file_name))?;
        writeln!(out, "Total connections: {}", ctx.connections.len())?;
        writeln!(out)?;

        writeln!(out, "WIRING LIST")?;
        if ctx.connections.is_empty() {
            writeln!(out, "No connections defined.")?;
        }
        for (i, c) in ctx.connections.iter().enumerate() {
            writeln!(
                out,
                "{}. Connect {} pin {} to {} pin {}",
                i + 1,
                printable(&c.from.component),
                printable(&c.from.pin),
                printable(&c.to.component),
                printable(&c.to.pin)
            )?;
        }
        writeln!(out)?;

        // Each connection is listed under both of its components
        let mut by_component: BTreeMap<&str, Vec<(&str, String)>> = BTreeMap::new();
        for c in ctx.connections {
            by_component
                .entry(c.from.component.as_str())
                .or_default()
                .push((c.from.pin.as_str(), c.to.to_string()));
            by_component
                .entry(c.to.component.as_str())
                .or_default()
                .push((c.to.pin.as_str(), c.from.to_string()));
        }

        if !by_component.is_empty() {
            writeln!(out, "BY COMPONENT")?;
            for (component, links) in &by_component {
                writeln!(out, "{}", printable(component))?;
                for (pin, other) in links {
                    writeln!(out, "  - pin {} connects to {}", printable(pin), printable(other))?;
                }
            }
            writeln!(out)?;
        }

        writeln!(out, "{}", RULE)?;
        writeln!(out, "In Proteus press 'W' for the wire tool and click each pin pair above.")?;
        writeln!(out, "{}", RULE)?;

        Ok(out.into_bytes())
    }
}

/// Names may hold spaces here, but never line breaks
fn printable(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}
