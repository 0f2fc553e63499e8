// Maps the service manager's raw state vocabulary onto a closed status set.

use std::fmt;

/// The status a resolution is guaranteed to produce.
///
/// `Other` carries a raw state the table does not classify. It is a valid
/// resolution, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedStatus {
    Running,
    Stopped,
    Starting,
    Stopping,
    Unknown,
    NotFound,
    Other(String),
}

impl NormalizedStatus {
    pub fn as_str(&self) -> &str {
        match self {
            NormalizedStatus::Running => "Running",
            NormalizedStatus::Stopped => "Stopped",
            NormalizedStatus::Starting => "Starting",
            NormalizedStatus::Stopping => "Stopping",
            NormalizedStatus::Unknown => "Unknown",
            NormalizedStatus::NotFound => "NotFound",
            NormalizedStatus::Other(literal) => literal,
        }
    }

    pub fn is_running(&self) -> bool {
        *self == NormalizedStatus::Running
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(
            self,
            NormalizedStatus::Starting | NormalizedStatus::Stopping
        )
    }
}

impl fmt::Display for NormalizedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State pair as reported by the manager for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawState {
    pub active: String,
    pub sub: Option<String>,
}

impl RawState {
    pub fn new(active: impl Into<String>, sub: Option<String>) -> Self {
        Self {
            active: active.into(),
            sub,
        }
    }
}

fn is_noise(c: char) -> bool {
    c.is_whitespace() || c.is_control()
}

/// Returns the meaningful part of a raw state string, or `None` when the
/// input is empty or made only of whitespace and control characters.
fn meaningful(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_matches(is_noise);
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Normalizes an `ActiveState` value.
pub fn normalize_active_state(raw: &str) -> NormalizedStatus {
    let Some(state) = meaningful(raw) else {
        return NormalizedStatus::Unknown;
    };

    match state {
        "active" => NormalizedStatus::Running,
        "inactive" | "failed" => NormalizedStatus::Stopped,
        "activating" => NormalizedStatus::Starting,
        "deactivating" => NormalizedStatus::Stopping,
        other => NormalizedStatus::Other(other.to_string()),
    }
}

/// Normalizes a `SubState` value. Returns `None` when the sub-state carries
/// no information, so the caller keeps the active-state classification.
pub fn normalize_sub_state(raw: &str) -> Option<NormalizedStatus> {
    let state = meaningful(raw)?;

    Some(match state {
        "running" => NormalizedStatus::Running,
        "failed" | "dead" => NormalizedStatus::Stopped,
        other => NormalizedStatus::Other(other.to_string()),
    })
}

/// Normalizes a full state pair. A non-empty sub-state always wins over the
/// active-state.
pub fn normalize(raw: &RawState) -> NormalizedStatus {
    raw.sub
        .as_deref()
        .and_then(normalize_sub_state)
        .unwrap_or_else(|| normalize_active_state(&raw.active))
}
