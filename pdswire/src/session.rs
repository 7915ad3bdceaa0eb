//! Sessions and the session store
//!
//! A session is one uploaded project plus its in-progress connection edits.
//! The core never keeps sessions in process-wide state: callers own a
//! `SessionStore` and pass it to every entry point.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connections::{ConnectionModel, DuplicatePolicy};
use crate::parser::schema::{Component, ParsedFileInfo, ParsedProject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The uploaded file as received, kept for the annotated project copy
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub info: ParsedFileInfo,
}

#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub source: SourceFile,
    pub components: Vec<Component>,
    pub connections: ConnectionModel,
}

impl Session {
    pub fn new(
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        project: ParsedProject,
        policy: DuplicatePolicy,
    ) -> Self {
        Self {
            id: SessionId::new(),
            source: SourceFile {
                file_name: file_name.into(),
                bytes,
                info: project.info,
            },
            components: project.components,
            connections: ConnectionModel::new(policy),
        }
    }
}

/// Shared handle; the mutex serializes edits and exports of one session
pub type SessionHandle = Arc<Mutex<Session>>;

/// Storage for live sessions, keyed by session id
///
/// Eviction is the implementor's business.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: Session) -> SessionId;

    fn get(&self, id: &SessionId) -> Option<SessionHandle>;

    fn remove(&self, id: &SessionId) -> Option<SessionHandle>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: Session) -> SessionId {
        let id = session.id;
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(id, Arc::new(Mutex::new(session)));
        tracing::debug!("Stored session {} ({} live)", id, sessions.len());
        id
    }

    fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(id).cloned()
    }

    fn remove(&self, id: &SessionId) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(id)
    }

    fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
