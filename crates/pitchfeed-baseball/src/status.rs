// Game lifecycle classification.

use std::fmt;

/// Lifecycle state of a game as far as polling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Scheduled,
    Live,
    Final,
    Unknown,
}

/// Classify a raw `(abstractGameState, detailedState)` pair.
///
/// Only the abstract state decides: a delayed game reports `Live` here and
/// differs only in its display label. Total over all inputs, including
/// missing ones.
pub fn classify(abstract_state: Option<&str>, _detailed_state: Option<&str>) -> GameStatus {
    match abstract_state {
        Some("Final") => GameStatus::Final,
        Some("Live") | Some("In Progress") => GameStatus::Live,
        Some("Preview") => GameStatus::Scheduled,
        _ => GameStatus::Unknown,
    }
}

impl GameStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, GameStatus::Live)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Scheduled => "Scheduled",
            GameStatus::Live => "Live",
            GameStatus::Final => "Final",
            GameStatus::Unknown => "Unknown",
        }
    }

    /// Inverse of [`GameStatus::as_str`]; unrecognized names are `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Scheduled" => GameStatus::Scheduled,
            "Live" => GameStatus::Live,
            "Final" => GameStatus::Final,
            _ => GameStatus::Unknown,
        }
    }

    /// Human-facing label. Live games whose detailed state mentions a delay
    /// read `Delayed`; unknown states show the detailed state verbatim.
    pub fn label(&self, detailed_state: &str) -> String {
        match self {
            GameStatus::Live if detailed_state.contains("Delayed") => "Delayed".to_string(),
            GameStatus::Unknown if !detailed_state.is_empty() => detailed_state.to_string(),
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
