// Schedule extraction for the games list.

use pitchfeed_core::error::FeedError;
use serde::Deserialize;
use serde_json::Value;

use crate::extract::StatusDto;
use crate::play::GamePk;
use crate::status::{classify, GameStatus};

/// One game from `/api/v1/schedule`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub game_pk: GamePk,
    pub away_team: String,
    pub home_team: String,
    pub status: GameStatus,
    pub detailed_state: String,
    /// `gameDate` as sent by the API (ISO-8601, UTC).
    pub start_time: String,
}

impl GameSummary {
    /// Whether the game belongs in the live games list. Broader than
    /// `status.is_live()`: a detailed state mentioning "Live" or
    /// "In Progress" also counts.
    pub fn is_live_listing(&self) -> bool {
        let detailed = self.detailed_state.to_ascii_lowercase();
        self.status.is_live() || detailed.contains("live") || detailed.contains("in progress")
    }
}

/// Extract every game across all dates in a schedule response. Games without
/// a `gamePk` are skipped.
pub fn extract_schedule(schedule: &Value) -> Result<Vec<GameSummary>, FeedError> {
    let dto = ScheduleDto::deserialize(schedule).map_err(|e| FeedError::Parse(e.to_string()))?;

    let games = dto
        .dates
        .unwrap_or_default()
        .into_iter()
        .flat_map(|d| d.games.unwrap_or_default())
        .filter_map(GameDto::into_summary)
        .collect();

    Ok(games)
}

/// Live games only, in schedule order.
pub fn live_games(games: Vec<GameSummary>) -> Vec<GameSummary> {
    games.into_iter().filter(GameSummary::is_live_listing).collect()
}

// ---------------------------------------------------------------------------
// Wire DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScheduleDto {
    dates: Option<Vec<DateDto>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DateDto {
    games: Option<Vec<GameDto>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GameDto {
    game_pk: Option<GamePk>,
    game_date: Option<String>,
    status: Option<StatusDto>,
    teams: Option<TeamsDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TeamsDto {
    away: Option<TeamSideDto>,
    home: Option<TeamSideDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TeamSideDto {
    team: Option<TeamDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TeamDto {
    name: Option<String>,
    team_name: Option<String>,
}

impl TeamSideDto {
    /// Short team name (`Yankees`), falling back to the full name.
    fn display_name(side: Option<TeamSideDto>) -> String {
        side.and_then(|s| s.team)
            .and_then(|t| t.team_name.or(t.name))
            .unwrap_or_default()
    }
}

impl GameDto {
    fn into_summary(self) -> Option<GameSummary> {
        let game_pk = self.game_pk?;
        let status = self.status.unwrap_or_default();
        let teams = self.teams.unwrap_or_default();
        Some(GameSummary {
            game_pk,
            away_team: TeamSideDto::display_name(teams.away),
            home_team: TeamSideDto::display_name(teams.home),
            status: classify(
                status.abstract_game_state.as_deref(),
                status.detailed_state.as_deref(),
            ),
            detailed_state: status.detailed_state.unwrap_or_default(),
            start_time: self.game_date.unwrap_or_default(),
        })
    }
}
