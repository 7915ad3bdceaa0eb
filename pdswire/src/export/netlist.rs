//! Netlist writer
//!
//! One line per connection in insertion order:
//!
//! ```text
//! NET1 IC1.D13 D1.A
//! NET2 R1.2 PWR2.OUT
//! ```

use std::fmt::Write;

use super::{ArtifactWriter, ExportContext, ExportError, ExportTarget};
use crate::connections::Endpoint;

pub struct NetlistWriter;

impl ArtifactWriter for NetlistWriter {
    fn target(&self) -> ExportTarget {
        ExportTarget::Netlist
    }

    fn render(&self, ctx: &ExportContext<'_>) -> Result<Vec<u8>, ExportError> {
        let mut out = String::new();
        for (i, connection) in ctx.connections.iter().enumerate() {
            writeln!(
                out,
                "NET{} {} {}",
                i + 1,
                endpoint_token(&connection.from)?,
                endpoint_token(&connection.to)?
            )?;
        }
        Ok(out.into_bytes())
    }
}

/// Rendered as `COMPONENT.PIN`; the first `.` splits the token, so dotted
/// pin names such as `P1.0` pass through unchanged
fn endpoint_token(endpoint: &Endpoint) -> Result<String, ExportError> {
    for part in [&endpoint.component, &endpoint.pin] {
        let reason = if part.is_empty() {
            Some("empty name")
        } else if part.chars().any(|c| c.is_whitespace() || c.is_control()) {
            Some("contains whitespace")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(ExportError::MalformedToken {
                target: ExportTarget::Netlist,
                token: part.to_string(),
                reason,
            });
        }
    }
    Ok(endpoint.to_string())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::ExportOptions;
    use super::*;
    use crate::connections::{Connection, Endpoint};

    fn render(connections: &[Connection]) -> Result<String, ExportError> {
        let components = components();
        let source = source(b"");
        let options = ExportOptions::default();
        let ctx = ExportContext {
            components: &components,
            connections,
            source: &source,
            options: &options,
        };
        NetlistWriter
            .render(&ctx)
            .map(|b| String::from_utf8(b).unwrap())
    }

    #[test]
    fn test_one_line_per_connection() {
        let connections = vec![
            connection(1, "IC1.D13", "D1.A"),
            connection(4, "D1.K", "R1.1"),
            connection(9, "R1.2", "PWR2.OUT"),
        ];
        let text = render(&connections).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            ["NET1 IC1.D13 D1.A", "NET2 D1.K R1.1", "NET3 R1.2 PWR2.OUT"]
        );
    }

    #[test]
    fn test_empty_netlist() {
        assert_eq!(render(&[]).unwrap(), "");
    }

    #[test]
    fn test_dotted_pin_rendered_literally() {
        let mut dotted = connection(1, "IC1.D13", "D1.A");
        dotted.from = Endpoint::new("U1", "P1.0");
        dotted.to = Endpoint::new("U1", "P1.1");
        assert_eq!(render(&[dotted]).unwrap(), "NET1 U1.P1.0 U1.P1.1\n");
    }

    #[test]
    fn test_whitespace_name_rejected() {
        let mut bad = connection(1, "IC1.D13", "D1.A");
        bad.to = Endpoint::new("D1", "A B");
        let err = render(&[bad]).unwrap_err();
        assert!(matches!(
            err,
            ExportError::MalformedToken { target: ExportTarget::Netlist, ref token, .. } if token == "A B"
        ));
    }
}
