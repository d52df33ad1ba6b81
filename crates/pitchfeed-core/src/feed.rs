// Feed kinds and their polling cadence.

use std::fmt;
use std::time::Duration;

/// Which live feed a poller consumes. Both kinds run the same polling
/// mechanism; they differ only in request shape and cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Full live feed, used for the current at-bat view.
    AtBat,
    /// Live feed narrowed to the play list.
    PlayByPlay,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::AtBat => "at_bat",
            FeedKind::PlayByPlay => "play_by_play",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Poll interval per feed, resolved from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub at_bat: Duration,
    pub play_by_play: Duration,
    /// Background refresh of the games list.
    pub games_list: Duration,
}

impl PollIntervals {
    pub fn for_feed(&self, kind: FeedKind) -> Duration {
        match kind {
            FeedKind::AtBat => self.at_bat,
            FeedKind::PlayByPlay => self.play_by_play,
        }
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            at_bat: Duration::from_secs(10),
            play_by_play: Duration::from_secs(30),
            games_list: Duration::from_secs(15),
        }
    }
}
