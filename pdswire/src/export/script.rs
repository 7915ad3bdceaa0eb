//! Autoroute script writer
//!
//! Proteus matches component and pin names in the script literally, so tokens
//! keep their case. Only characters that would split a line-oriented token are
//! stripped.

use std::collections::BTreeSet;
use std::fmt::Write;

use super::{strip_breaking_chars, ArtifactWriter, ExportContext, ExportError, ExportTarget};
use crate::connections::Endpoint;

pub struct ScriptWriter;

impl ArtifactWriter for ScriptWriter {
    fn target(&self) -> ExportTarget {
        ExportTarget::Script
    }

    fn render(&self, ctx: &ExportContext<'_>) -> Result<Vec<u8>, ExportError> {
        let mut out = String::new();

        writeln!(out, "-- Proteus ISIS autoroute script")?;
        writeln!(out, "-- Source: {}", strip_breaking_chars(&ctx.source.file_name))?;
        writeln!(out, "-- Connections: {}", ctx.connections.len())?;

        let used: BTreeSet<String> = ctx
            .connections
            .iter()
            .flat_map(|c| [&c.from.component, &c.to.component])
            .map(|name| strip_breaking_chars(name))
            .collect();
        if !used.is_empty() {
            writeln!(out, "-- Verify these components exist in the schematic:")?;
            for name in &used {
                writeln!(out, "--   {}", name)?;
            }
        }
        writeln!(out)?;

        writeln!(out, "AUTOROUTE ON")?;
        for connection in ctx.connections {
            writeln!(
                out,
                "WIRE FROM {} TO {}",
                endpoint_token(&connection.from)?,
                endpoint_token(&connection.to)?
            )?;
        }
        writeln!(out, "AUTOROUTE OPTIMIZE")?;

        Ok(out.into_bytes())
    }
}

fn endpoint_token(endpoint: &Endpoint) -> Result<String, ExportError> {
    let component = strip_breaking_chars(&endpoint.component);
    let pin = strip_breaking_chars(&endpoint.pin);
    for (raw, cleaned) in [(&endpoint.component, &component), (&endpoint.pin, &pin)] {
        if cleaned.is_empty() {
            return Err(ExportError::MalformedToken {
                target: ExportTarget::Script,
                token: raw.to_string(),
                reason: "empty after stripping control characters",
            });
        }
    }
    Ok(format!("{}.{}", component, pin))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::ExportOptions;
    use super::*;
    use crate::connections::Connection;

    fn render(connections: &[Connection]) -> String {
        let components = components();
        let source = source(b"");
        let options = ExportOptions::default();
        let ctx = ExportContext {
            components: &components,
            connections,
            source: &source,
            options: &options,
        };
        String::from_utf8(ScriptWriter.render(&ctx).unwrap()).unwrap()
    }

    #[test]
    fn test_directive_order() {
        let text = render(&[
            connection(1, "IC1.D13", "D1.A"),
            connection(2, "D1.K", "PWR2.OUT"),
        ]);
        let directives: Vec<_> = text
            .lines()
            .filter(|l| !l.starts_with("--") && !l.is_empty())
            .collect();
        assert_eq!(
            directives,
            [
                "AUTOROUTE ON",
                "WIRE FROM IC1.D13 TO D1.A",
                "WIRE FROM D1.K TO PWR2.OUT",
                "AUTOROUTE OPTIMIZE",
            ]
        );
    }

    #[test]
    fn test_header_lists_components_once() {
        let text = render(&[
            connection(1, "IC1.D13", "D1.A"),
            connection(2, "D1.K", "PWR2.OUT"),
        ]);
        assert_eq!(text.matches("--   D1\n").count(), 1);
        assert!(text.contains("-- Connections: 2"));
    }

    #[test]
    fn test_case_preserved_and_control_chars_stripped() {
        let mut c = connection(1, "ic1.d13", "D1.A");
        c.to.pin = "A\r".to_string();
        let text = render(&[c]);
        assert!(text.contains("WIRE FROM ic1.d13 TO D1.A\n"));
    }

    #[test]
    fn test_token_empty_after_stripping_rejected() {
        let components = components();
        let source = source(b"");
        let options = ExportOptions::default();
        let mut c = connection(1, "IC1.D13", "D1.A");
        c.to.pin = "\r\n".to_string();
        let connections = [c];
        let ctx = ExportContext {
            components: &components,
            connections: &connections,
            source: &source,
            options: &options,
        };

        let err = ScriptWriter.render(&ctx).unwrap_err();
        assert!(matches!(
            err,
            ExportError::MalformedToken { target: ExportTarget::Script, ref token, .. } if token == "\r\n"
        ));
    }

    #[test]
    fn test_dotted_names_pass_through() {
        let text = render(&[connection(1, "U.1.VCC", "D1.A")]);
        assert!(text.contains("WIRE FROM U.1.VCC TO D1.A"));
    }

    #[test]
    fn test_no_connections() {
        let text = render(&[]);
        assert!(text.contains("AUTOROUTE ON\nAUTOROUTE OPTIMIZE\n"));
    }
}
