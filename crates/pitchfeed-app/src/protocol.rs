// Messages flowing from background tasks to whoever renders or stores them.

use pitchfeed_baseball::schedule::GameSummary;
use pitchfeed_baseball::{AtBatContext, GamePk, GameStatus, Play};
use pitchfeed_core::error::FeedError;
use pitchfeed_core::feed::FeedKind;
use thiserror::Error;

/// Identifies one poll session. The generation is unique per poller, so a
/// handle from a stopped session never matches a later session for the same
/// game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollHandle {
    pub game_pk: GamePk,
    pub kind: FeedKind,
    pub generation: u64,
}

/// Output of a poll session, in the order the session produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedUpdate {
    /// The game's status differs from the previous cycle (always sent after
    /// the first successful cycle).
    Status {
        session: PollHandle,
        status: GameStatus,
        detailed_state: String,
    },
    /// New or changed plays, in game order. Never empty.
    Plays {
        session: PollHandle,
        delta: Vec<Play>,
    },
    /// The at-bat under way changed. Only sent while the game is live and
    /// the fetched document carries a current play.
    AtBat {
        session: PollHandle,
        context: AtBatContext,
    },
    /// A cycle failed; prior state is untouched and polling continues.
    CycleFailed {
        session: PollHandle,
        error: FeedError,
    },
    /// The session stopped on its own because the game is no longer live.
    Finished {
        session: PollHandle,
        status: GameStatus,
    },
}

impl FeedUpdate {
    pub fn session(&self) -> PollHandle {
        match self {
            FeedUpdate::Status { session, .. }
            | FeedUpdate::Plays { session, .. }
            | FeedUpdate::AtBat { session, .. }
            | FeedUpdate::CycleFailed { session, .. }
            | FeedUpdate::Finished { session, .. } => *session,
        }
    }
}

/// Output of the games list refresher.
#[derive(Debug, Clone, PartialEq)]
pub enum GamesUpdate {
    Refreshed(Vec<GameSummary>),
    RefreshFailed(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("game {game_pk} already has an active {kind} session")]
    AlreadyPolling { game_pk: GamePk, kind: FeedKind },
}
