// Live feed extraction: one defaulting pass from raw Stats API JSON to a
// fully populated snapshot.
//
// Every optional path in the feed is resolved here, so downstream code never
// deals with partially present plays or statuses. Missing scalars default to
// "", 0 or Unknown; only a structurally wrong document (wrong type at a
// known path) is a parse failure.

use chrono::{DateTime, Utc};
use pitchfeed_core::error::FeedError;
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;

use crate::atbat::{AtBatContext, Bases};
use crate::play::{Count, GamePk, HalfInning, Play};
use crate::status::{classify, GameStatus};

/// Everything one fetch tells us about a game.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub status: GameStatus,
    pub abstract_state: String,
    pub detailed_state: String,
    /// Plays in feed order (chronological for the Stats API).
    pub plays: Vec<Play>,
    /// The at-bat under way, when the document carries `currentPlay`.
    pub at_bat: Option<AtBatContext>,
}

/// Extract status and plays from a live feed document.
///
/// Plays come from `liveData.plays.allPlays`, or from a top-level `allPlays`
/// when the document is a bare play-by-play listing. Every play is stamped
/// with `game_pk` and `observed_at`. The at-bat context is read from
/// `liveData.plays.currentPlay` together with `liveData.linescore`.
pub fn extract_snapshot(
    game_pk: GamePk,
    feed: &Value,
    observed_at: DateTime<Utc>,
) -> Result<FeedSnapshot, FeedError> {
    let dto = FeedDto::deserialize(feed).map_err(|e| FeedError::Parse(e.to_string()))?;

    let status_dto = dto
        .game_data
        .and_then(|g| g.status)
        .unwrap_or_default();
    let status = classify(
        status_dto.abstract_game_state.as_deref(),
        status_dto.detailed_state.as_deref(),
    );

    let live = dto.live_data.unwrap_or_default();
    let plays_dto = live.plays.unwrap_or_default();
    let at_bat = plays_dto
        .current_play
        .map(|current| current.into_at_bat(live.linescore.unwrap_or_default()));
    let raw_plays = plays_dto.all_plays.or(dto.all_plays).unwrap_or_default();

    let plays = raw_plays
        .into_iter()
        .map(|p| p.into_play(game_pk, observed_at))
        .collect();

    Ok(FeedSnapshot {
        status,
        abstract_state: status_dto.abstract_game_state.unwrap_or_default(),
        detailed_state: status_dto.detailed_state.unwrap_or_default(),
        plays,
        at_bat,
    })
}

// ---------------------------------------------------------------------------
// Wire DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FeedDto {
    game_data: Option<GameDataDto>,
    live_data: Option<LiveDataDto>,
    all_plays: Option<Vec<PlayDto>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GameDataDto {
    status: Option<StatusDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct StatusDto {
    pub(crate) abstract_game_state: Option<String>,
    pub(crate) detailed_state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LiveDataDto {
    plays: Option<PlaysDto>,
    linescore: Option<LinescoreDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlaysDto {
    all_plays: Option<Vec<PlayDto>>,
    current_play: Option<PlayDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LinescoreDto {
    offense: Option<OffenseDto>,
    teams: Option<LinescoreTeamsDto>,
}

/// Runner entries are only checked for presence.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OffenseDto {
    first: Option<IgnoredAny>,
    second: Option<IgnoredAny>,
    third: Option<IgnoredAny>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LinescoreTeamsDto {
    away: Option<TeamRunsDto>,
    home: Option<TeamRunsDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TeamRunsDto {
    runs: Option<u32>,
}

impl TeamRunsDto {
    fn runs(team: Option<TeamRunsDto>) -> u32 {
        team.and_then(|t| t.runs).unwrap_or(0)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlayDto {
    at_bat_index: Option<u32>,
    result: Option<ResultDto>,
    about: Option<AboutDto>,
    count: Option<CountDto>,
    matchup: Option<MatchupDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ResultDto {
    description: Option<String>,
    event_type: Option<String>,
    away_score: Option<u32>,
    home_score: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AboutDto {
    at_bat_index: Option<u32>,
    inning: Option<u32>,
    half_inning: Option<String>,
    is_complete: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CountDto {
    balls: Option<u8>,
    strikes: Option<u8>,
    outs: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MatchupDto {
    batter: Option<PersonDto>,
    pitcher: Option<PersonDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PersonDto {
    full_name: Option<String>,
}

impl PersonDto {
    fn name(person: Option<PersonDto>) -> String {
        person.and_then(|p| p.full_name).unwrap_or_default()
    }
}

impl PlayDto {
    fn into_play(self, game_pk: GamePk, observed_at: DateTime<Utc>) -> Play {
        let result = self.result.unwrap_or_default();
        let about = self.about.unwrap_or_default();
        let count = self.count.unwrap_or_default();
        let matchup = self.matchup.unwrap_or_default();

        Play {
            game_pk,
            at_bat_index: about.at_bat_index.or(self.at_bat_index).unwrap_or(0),
            inning: about.inning.unwrap_or(0),
            half_inning: about
                .half_inning
                .as_deref()
                .map(HalfInning::parse)
                .unwrap_or(HalfInning::Unknown),
            event_type: result.event_type.unwrap_or_default(),
            description: result.description.unwrap_or_default(),
            is_complete: about.is_complete.unwrap_or(false),
            count: Count {
                balls: count.balls.unwrap_or(0),
                strikes: count.strikes.unwrap_or(0),
                outs: count.outs.unwrap_or(0),
            },
            away_score: result.away_score.unwrap_or(0),
            home_score: result.home_score.unwrap_or(0),
            batter: PersonDto::name(matchup.batter),
            pitcher: PersonDto::name(matchup.pitcher),
            observed_at,
        }
    }

    fn into_at_bat(self, linescore: LinescoreDto) -> AtBatContext {
        let about = self.about.unwrap_or_default();
        let count = self.count.unwrap_or_default();
        let matchup = self.matchup.unwrap_or_default();
        let offense = linescore.offense.unwrap_or_default();
        let teams = linescore.teams.unwrap_or_default();

        AtBatContext {
            inning: about.inning.unwrap_or(0),
            half_inning: about
                .half_inning
                .as_deref()
                .map(HalfInning::parse)
                .unwrap_or(HalfInning::Unknown),
            batter: PersonDto::name(matchup.batter),
            pitcher: PersonDto::name(matchup.pitcher),
            count: Count {
                balls: count.balls.unwrap_or(0),
                strikes: count.strikes.unwrap_or(0),
                outs: count.outs.unwrap_or(0),
            },
            bases: Bases {
                first: offense.first.is_some(),
                second: offense.second.is_some(),
                third: offense.third.is_some(),
            },
            away_runs: TeamRunsDto::runs(teams.away),
            home_runs: TeamRunsDto::runs(teams.home),
        }
    }
}
