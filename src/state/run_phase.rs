/// Run phase definitions for the harvest orchestrator
///
/// A run moves strictly forward through the phases; no phase is revisited.
use std::fmt;

/// Represents the current phase of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Nothing has happened yet
    Idle,

    /// The shared HTTP client is open
    SessionOpen,

    /// The search request is being issued and the pager parsed
    Discovering,

    /// Page units are in flight
    Fetching,

    /// Waiting for every unit to reach a terminal state
    Aggregating,

    /// The shared HTTP client has been released
    Closed,
}

impl RunPhase {
    /// Returns the only phase this one may advance to
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::SessionOpen),
            Self::SessionOpen => Some(Self::Discovering),
            Self::Discovering => Some(Self::Fetching),
            Self::Fetching => Some(Self::Aggregating),
            Self::Aggregating => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Returns true if moving from `self` to `to` is a legal transition
    pub fn can_transition_to(&self, to: RunPhase) -> bool {
        self.next() == Some(to)
    }

    /// Returns true while the shared HTTP client must be available
    pub fn has_session(&self) -> bool {
        matches!(
            self,
            Self::SessionOpen | Self::Discovering | Self::Fetching | Self::Aggregating
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SessionOpen => "session_open",
            Self::Discovering => "discovering",
            Self::Fetching => "fetching",
            Self::Aggregating => "aggregating",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
