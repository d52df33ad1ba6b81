// Command-line surface of the `pitchfeed` binary.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use pitchfeed_baseball::GamePk;
use pitchfeed_core::feed::FeedKind;

#[derive(Debug, Parser)]
#[command(name = "pitchfeed", version, about = "Live MLB play-by-play in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch today's schedule (or --date) and list the live games
    Games {
        /// Schedule date, YYYY-MM-DD
        #[arg(long, conflicts_with = "watch")]
        date: Option<NaiveDate>,

        /// Keep refreshing the list until Ctrl+C
        #[arg(long)]
        watch: bool,
    },

    /// Poll a game and print new plays as they happen. Type another game id
    /// on stdin to switch games.
    Watch {
        game_pk: GamePk,

        /// Which live feed to poll
        #[arg(long, value_enum, default_value_t = FeedArg::PlayByPlay)]
        feed: FeedArg,

        /// Delete a game's stored plays when switching away from it
        #[arg(long)]
        clear: bool,
    },

    /// Print the plays stored for a game
    Plays { game_pk: GamePk },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeedArg {
    AtBat,
    PlayByPlay,
}

impl From<FeedArg> for FeedKind {
    fn from(arg: FeedArg) -> Self {
        match arg {
            FeedArg::AtBat => FeedKind::AtBat,
            FeedArg::PlayByPlay => FeedKind::PlayByPlay,
        }
    }
}
