// Play records and their identity key.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// MLB game primary key (`gamePk`).
pub type GamePk = u64;

/// Known plays for a game, keyed by identity. `PlayKey` orders
/// chronologically, so iteration yields plays in game order.
pub type PlayMap = BTreeMap<PlayKey, Play>;

// ---------------------------------------------------------------------------
// HalfInning
// ---------------------------------------------------------------------------

/// Which half of an inning a play belongs to. Declaration order is the
/// chronological order (top before bottom); `Unknown` sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HalfInning {
    Top,
    Bottom,
    Unknown,
}

impl HalfInning {
    /// Parse the feed's `about.halfInning` value. Anything other than
    /// `top`/`bottom` (case-insensitive) is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("top") {
            HalfInning::Top
        } else if raw.eq_ignore_ascii_case("bottom") {
            HalfInning::Bottom
        } else {
            HalfInning::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HalfInning::Top => "top",
            HalfInning::Bottom => "bottom",
            HalfInning::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for HalfInning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PlayKey
// ---------------------------------------------------------------------------

/// Identity of a play across polls of the same game.
///
/// `at_bat_index` alone is not enough: it restarts per game and is not
/// guaranteed unique across feed revisions. Field order drives the derived
/// `Ord`: game, then inning, then half, then at-bat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayKey {
    pub game_pk: GamePk,
    pub inning: u32,
    pub half_inning: HalfInning,
    pub at_bat_index: u32,
}

impl fmt::Display for PlayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}-{}",
            self.game_pk, self.at_bat_index, self.inning, self.half_inning
        )
    }
}

// ---------------------------------------------------------------------------
// Play
// ---------------------------------------------------------------------------

/// Ball/strike/out count after the play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Count {
    pub balls: u8,
    pub strikes: u8,
    pub outs: u8,
}

/// One at-bat or event record, fully populated by extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    pub game_pk: GamePk,
    pub at_bat_index: u32,
    pub inning: u32,
    pub half_inning: HalfInning,
    pub event_type: String,
    pub description: String,
    pub is_complete: bool,
    pub count: Count,
    pub away_score: u32,
    pub home_score: u32,
    pub batter: String,
    pub pitcher: String,
    /// When this client first saw the play. Not part of the play's content.
    pub observed_at: DateTime<Utc>,
}

impl Play {
    pub fn key(&self) -> PlayKey {
        self.key_for(self.game_pk)
    }

    /// Identity key of this play under an explicit game id.
    pub fn key_for(&self, game_pk: GamePk) -> PlayKey {
        PlayKey {
            game_pk,
            inning: self.inning,
            half_inning: self.half_inning,
            at_bat_index: self.at_bat_index,
        }
    }

    /// Compare every observable field, ignoring `observed_at`.
    pub fn same_content(&self, other: &Play) -> bool {
        let Play {
            game_pk,
            at_bat_index,
            inning,
            half_inning,
            event_type,
            description,
            is_complete,
            count,
            away_score,
            home_score,
            batter,
            pitcher,
            observed_at: _,
        } = self;

        *game_pk == other.game_pk
            && *at_bat_index == other.at_bat_index
            && *inning == other.inning
            && *half_inning == other.half_inning
            && *event_type == other.event_type
            && *description == other.description
            && *is_complete == other.is_complete
            && *count == other.count
            && *away_score == other.away_score
            && *home_score == other.home_score
            && *batter == other.batter
            && *pitcher == other.pitcher
    }

    pub fn category(&self) -> PlayCategory {
        PlayCategory::from_event_type(&self.event_type)
    }

    /// Inning label such as `Top 3rd`.
    pub fn inning_label(&self) -> String {
        format_inning(self.half_inning, self.inning)
    }
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// Coarse grouping of `eventType` values for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayCategory {
    Hit,
    Out,
    Walk,
    Run,
    Other,
}

impl PlayCategory {
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "home_run" | "triple" | "double" | "single" => PlayCategory::Hit,
            "strikeout"
            | "strikeout_double_play"
            | "field_out"
            | "force_out"
            | "grounded_into_double_play" => PlayCategory::Out,
            "walk" | "intent_walk" => PlayCategory::Walk,
            "run" => PlayCategory::Run,
            _ => PlayCategory::Other,
        }
    }
}

/// `Top 1st`, `Bottom 11th`. An unknown half renders the ordinal alone.
pub fn format_inning(half: HalfInning, inning: u32) -> String {
    match half {
        HalfInning::Top => format!("Top {}", ordinal(inning)),
        HalfInning::Bottom => format!("Bottom {}", ordinal(inning)),
        HalfInning::Unknown => ordinal(inning),
    }
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st.
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, r) if r != 11 => "st",
        (2, r) if r != 12 => "nd",
        (3, r) if r != 13 => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
