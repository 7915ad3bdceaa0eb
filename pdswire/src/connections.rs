//! Connection Model
//!
//! Ordered list of validated pin-to-pin connections for one session. Every
//! endpoint is checked against the session's component model when the
//! connection is made; insertion order is kept because exports number their
//! output by it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::schema::Component;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("Invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Cannot connect {0} to itself")]
    SelfConnection(Endpoint),

    #[error("Connection {0} not found")]
    NotFound(ConnectionId),

    #[error("Connection {from} -> {to} already exists")]
    Duplicate { from: Endpoint, to: Endpoint },
}

/// A component pin, written `COMPONENT.PIN`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    pub component: String,
    pub pin: String,
}

impl Endpoint {
    pub fn new(component: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            pin: pin.into(),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ConnectionError {
        ConnectionError::InvalidEndpoint {
            endpoint: self.to_string(),
            reason: reason.into(),
        }
    }

    /// Check the endpoint names a real pin and is a single token
    pub fn validate(&self, components: &[Component]) -> Result<(), ConnectionError> {
        for part in [&self.component, &self.pin] {
            if part.is_empty() {
                return Err(self.invalid("empty name"));
            }
            if part.chars().any(char::is_whitespace) {
                return Err(self.invalid("names may not contain whitespace"));
            }
        }

        let component = components
            .iter()
            .find(|c| c.id == self.component)
            .ok_or_else(|| self.invalid(format!("no component {}", self.component)))?;

        if !component.has_pin(&self.pin) {
            return Err(self.invalid(format!(
                "component {} has no pin {}",
                self.component, self.pin
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.pin)
    }
}

impl FromStr for Endpoint {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('.') {
            Some((component, pin)) if !component.is_empty() && !pin.is_empty() => {
                Ok(Endpoint::new(component, pin))
            }
            _ => Err(ConnectionError::InvalidEndpoint {
                endpoint: s.to_string(),
                reason: "expected COMPONENT.PIN".to_string(),
            }),
        }
    }
}

/// Per-session connection handle, never reused after removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: Endpoint,
    pub to: Endpoint,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    pub fn joins(&self, a: &Endpoint, b: &Endpoint) -> bool {
        (&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
    }

    pub fn touches(&self, component: &str) -> bool {
        self.from.component == component || self.to.component == component
    }
}

/// What to do when the same pair is submitted twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Record every submission
    #[default]
    Accumulate,
    /// Refuse a pair that is already connected, in either direction
    Reject,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionModel {
    connections: Vec<Connection>,
    next_id: u64,
    policy: DuplicatePolicy,
}

impl ConnectionModel {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            connections: Vec::new(),
            next_id: 1,
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Validate and append a connection
    pub fn add(
        &mut self,
        components: &[Component],
        from: Endpoint,
        to: Endpoint,
    ) -> Result<ConnectionId, ConnectionError> {
        self.check(components, &from, &to, &self.connections)?;

        let id = self.allocate_id();
        tracing::debug!("Adding connection {} {} -> {}", id, from, to);
        self.connections.push(Connection {
            id,
            from,
            to,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    pub fn remove(&mut self, id: ConnectionId) -> Result<Connection, ConnectionError> {
        let pos = self
            .connections
            .iter()
            .position(|c| c.id == id)
            .ok_or(ConnectionError::NotFound(id))?;
        Ok(self.connections.remove(pos))
    }

    /// Drop every connection, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let count = self.connections.len();
        self.connections.clear();
        count
    }

    /// Replace the whole list; on any invalid pair nothing changes
    pub fn replace_all(
        &mut self,
        components: &[Component],
        pairs: Vec<(Endpoint, Endpoint)>,
    ) -> Result<Vec<ConnectionId>, ConnectionError> {
        let mut staged: Vec<Connection> = Vec::with_capacity(pairs.len());
        let mut next_id = self.next_id.max(1);
        let now = Utc::now();

        for (from, to) in pairs {
            self.check(components, &from, &to, &staged)?;
            staged.push(Connection {
                id: ConnectionId(next_id),
                from,
                to,
                created_at: now,
            });
            next_id += 1;
        }

        self.next_id = next_id;
        let ids = staged.iter().map(|c| c.id).collect();
        self.connections = staged;
        Ok(ids)
    }

    pub fn list(&self) -> &[Connection] {
        &self.connections
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    fn allocate_id(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    fn check(
        &self,
        components: &[Component],
        from: &Endpoint,
        to: &Endpoint,
        existing: &[Connection],
    ) -> Result<(), ConnectionError> {
        from.validate(components)?;
        to.validate(components)?;

        if from == to {
            return Err(ConnectionError::SelfConnection(from.clone()));
        }

        if self.policy == DuplicatePolicy::Reject && existing.iter().any(|c| c.joins(from, to)) {
            return Err(ConnectionError::Duplicate {
                from: from.clone(),
                to: to.clone(),
            });
        }
        Ok(())
    }
}
