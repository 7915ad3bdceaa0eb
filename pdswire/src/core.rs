//! Core entry points shared by every front end.
//! No request-layer or storage dependencies; callers inject the session store.

use serde::{Deserialize, Serialize};

use crate::connections::{Connection, ConnectionError, ConnectionId, DuplicatePolicy, Endpoint};
use crate::export::{ArtifactResult, ExportContext, ExportError, ExportOptions, ExportRegistry, ExportTarget};
use crate::parser::parse_project;
use crate::parser::schema::{Component, ParsedFileInfo};
use crate::session::{Session, SessionId, SessionStore};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

/// Options for sessions opened by `ProjectCore`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CoreOptions {
    pub duplicate_policy: DuplicatePolicy,
    pub export: ExportOptions,
}

/// A user edit to a session's connection list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionOp {
    Add { from: Endpoint, to: Endpoint },
    Remove(ConnectionId),
    Clear,
    /// Replace the whole list, as the editor's save does
    ReplaceAll(Vec<(Endpoint, Endpoint)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Added(ConnectionId),
    Removed(Connection),
    Cleared(usize),
    Replaced(Vec<ConnectionId>),
}

/// Result of opening an upload
#[derive(Debug, Clone)]
pub struct OpenedProject {
    pub session_id: SessionId,
    pub components: Vec<Component>,
    pub info: ParsedFileInfo,
}

impl OpenedProject {
    /// Warnings are present, or the components are the demo set
    pub fn needs_attention(&self) -> bool {
        self.info.synthetic || !self.info.parse_warnings.is_empty()
    }
}

/// Core API used by request handlers and the CLI.
pub struct ProjectCore {
    options: CoreOptions,
    registry: ExportRegistry,
}

impl ProjectCore {
    pub fn new(options: CoreOptions) -> Self {
        Self {
            options,
            registry: ExportRegistry::new(),
        }
    }

    /// Use a custom writer registry
    pub fn with_registry(options: CoreOptions, registry: ExportRegistry) -> Self {
        Self { options, registry }
    }

    pub fn options(&self) -> &CoreOptions {
        &self.options
    }

    /// Parse an accepted upload and register a session for it.
    ///
    /// Always succeeds: unparseable files open with the demo components.
    pub fn open(&self, store: &dyn SessionStore, file_name: &str, bytes: Vec<u8>) -> OpenedProject {
        let project = parse_project(&bytes);
        let components = project.components.clone();
        let info = project.info.clone();

        if info.synthetic {
            tracing::warn!(
                "{}: no components recovered, session uses demo components",
                file_name
            );
        }

        let session = Session::new(file_name, bytes, project, self.options.duplicate_policy);
        let session_id = store.insert(session);
        tracing::info!(
            "Opened {} as session {} ({} components)",
            file_name,
            session_id,
            components.len()
        );

        OpenedProject {
            session_id,
            components,
            info,
        }
    }

    /// Apply one connection edit; failed edits leave the session unchanged
    pub fn mutate_connections(
        &self,
        store: &dyn SessionStore,
        session_id: &SessionId,
        op: ConnectionOp,
    ) -> Result<MutationOutcome, CoreError> {
        let handle = store
            .get(session_id)
            .ok_or(CoreError::SessionNotFound(*session_id))?;
        let mut session = handle.lock().unwrap_or_else(|e| e.into_inner());
        let Session {
            components,
            connections,
            ..
        } = &mut *session;

        let outcome = match op {
            ConnectionOp::Add { from, to } => MutationOutcome::Added(connections.add(components, from, to)?),
            ConnectionOp::Remove(id) => MutationOutcome::Removed(connections.remove(id)?),
            ConnectionOp::Clear => MutationOutcome::Cleared(connections.clear()),
            ConnectionOp::ReplaceAll(pairs) => {
                MutationOutcome::Replaced(connections.replace_all(components, pairs)?)
            }
        };
        tracing::debug!("Session {}: {:?}", session_id, outcome);
        Ok(outcome)
    }

    /// Snapshot of a session's connections in insertion order
    pub fn connections(&self, store: &dyn SessionStore, session_id: &SessionId) -> Result<Vec<Connection>, CoreError> {
        let handle = store
            .get(session_id)
            .ok_or(CoreError::SessionNotFound(*session_id))?;
        let session = handle.lock().unwrap_or_else(|e| e.into_inner());
        Ok(session.connections.list().to_vec())
    }

    /// Render one artifact for a session
    pub fn generate(
        &self,
        store: &dyn SessionStore,
        session_id: &SessionId,
        target: ExportTarget,
    ) -> Result<Vec<u8>, CoreError> {
        let handle = store
            .get(session_id)
            .ok_or(CoreError::SessionNotFound(*session_id))?;
        // Held for the whole render so edits cannot interleave
        let session = handle.lock().unwrap_or_else(|e| e.into_inner());
        let ctx = self.context(&session);
        Ok(self.registry.generate(&ctx, target)?)
    }

    /// Render every artifact; each target succeeds or fails on its own
    pub fn generate_all(
        &self,
        store: &dyn SessionStore,
        session_id: &SessionId,
    ) -> Result<Vec<ArtifactResult>, CoreError> {
        let handle = store
            .get(session_id)
            .ok_or(CoreError::SessionNotFound(*session_id))?;
        let session = handle.lock().unwrap_or_else(|e| e.into_inner());
        let ctx = self.context(&session);
        Ok(self.registry.generate_all(&ctx))
    }

    fn context<'a>(&'a self, session: &'a Session) -> ExportContext<'a> {
        ExportContext {
            components: &session.components,
            connections: session.connections.list(),
            source: &session.source,
            options: &self.options.export,
        }
    }
}

impl Default for ProjectCore {
    fn default() -> Self {
        Self::new(CoreOptions::default())
    }
}
