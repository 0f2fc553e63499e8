// Defines the core data structures exchanged with the service manager.

use std::fmt;

use super::status::RawState;

/// Name of the managed unit, e.g. `serval.service`. Never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServiceName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One row of the manager's unit enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitEntry {
    pub name: String,
    pub description: String,
    pub load_state: String,   // e.g., "loaded", "not-found"
    pub active_state: String, // e.g., "active", "inactive"
    pub sub_state: String,    // e.g., "running", "dead", "exited"
}

impl UnitEntry {
    pub fn raw_state(&self) -> RawState {
        RawState::new(self.active_state.clone(), Some(self.sub_state.clone()))
    }
}

/// Opaque handle to a unit object returned by a direct lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPath(String);

impl UnitPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    ResetFailed,
}

impl ServiceAction {
    /// Manager method that carries out the action.
    pub fn method(self) -> &'static str {
        match self {
            ServiceAction::Start => "StartUnit",
            ServiceAction::Stop => "StopUnit",
            ServiceAction::ResetFailed => "ResetFailedUnit",
        }
    }

    /// Job conflict mode passed along with the request, if the method takes one.
    pub fn mode(self) -> Option<&'static str> {
        match self {
            ServiceAction::Start | ServiceAction::Stop => Some("replace"),
            ServiceAction::ResetFailed => None,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::ResetFailed => "reset-failed",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}
