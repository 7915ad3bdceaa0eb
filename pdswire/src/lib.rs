//! pdswire - Proteus project parsing and wiring export library
//!
//! This library reads Proteus `.pdsprj` uploads of any generation, recovers
//! the components they declare, lets a user record pin-to-pin connections,
//! and renders those connections as files Proteus users can act on.
//!
//! # Quick Start
//!
//! ```no_run
//! use pdswire::{ConnectionOp, ExportTarget, InMemorySessionStore, ProjectCore};
//!
//! let store = InMemorySessionStore::new();
//! let core = ProjectCore::default();
//!
//! let bytes = std::fs::read("blinky.pdsprj").unwrap();
//! let opened = core.open(&store, "blinky.pdsprj", bytes);
//! for warning in &opened.info.parse_warnings {
//!     eprintln!("warning: {}", warning);
//! }
//!
//! core.mutate_connections(
//!     &store,
//!     &opened.session_id,
//!     ConnectionOp::Add {
//!         from: "IC1.D13".parse().unwrap(),
//!         to: "D1.A".parse().unwrap(),
//!     },
//! )
//! .unwrap();
//!
//! let netlist = core.generate(&store, &opened.session_id, ExportTarget::Netlist).unwrap();
//! println!("{}", String::from_utf8_lossy(&netlist));
//! ```
//!
//! # Features
//!
//! - **Format detection**: ZIP containers (7.x/8.x), legacy text, legacy binary
//! - **Component extraction**: Streaming XML with demo fallback that never fails
//! - **Connection model**: Validated endpoints, atomic bulk replace
//! - **Exports**: Annotated project copy, netlist, autoroute script, wiring guide

pub mod connections;
pub mod core;
pub mod export;
pub mod parser;
pub mod session;

// Re-export main types
pub use crate::core::{ConnectionOp, CoreError, CoreOptions, MutationOutcome, OpenedProject, ProjectCore};
pub use connections::{Connection, ConnectionError, ConnectionId, DuplicatePolicy, Endpoint};
pub use export::{ArtifactResult, ArtifactWriter, ExportError, ExportOptions, ExportRegistry, ExportTarget};
pub use parser::parse_project;
pub use parser::schema::{Component, ComponentKind, ParsedFileInfo, ParsedProject, Pin, ProjectFormat};
pub use session::{InMemorySessionStore, SessionId, SessionStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        ConnectionOp, CoreError, CoreOptions, Endpoint, ExportTarget, InMemorySessionStore,
        ProjectCore, SessionStore,
    };
}
