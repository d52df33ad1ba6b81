// Live games list: fetch the schedule, keep the live games, store them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use pitchfeed_baseball::schedule::{extract_schedule, live_games, GameSummary};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::client::ScheduleSource;
use crate::protocol::GamesUpdate;
use crate::store::Store;

/// Fetch one schedule, filter it to live games and replace the stored list.
pub async fn refresh_games<S: ScheduleSource + ?Sized>(
    source: &S,
    store: &Store,
    date: Option<NaiveDate>,
) -> Result<Vec<GameSummary>> {
    let schedule = source.fetch_schedule(date).await?;
    let games = live_games(extract_schedule(&schedule)?);
    store.replace_games(&games)?;
    debug!("Games list refreshed: {} live", games.len());
    Ok(games)
}

/// Refresh the games list immediately and then every `interval` until the
/// receiver is dropped. Failures are reported and the loop carries on.
pub async fn run_games_refresher<S: ScheduleSource>(
    source: Arc<S>,
    store: Arc<Store>,
    interval: Duration,
    updates: mpsc::Sender<GamesUpdate>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let update = match refresh_games(source.as_ref(), &store, None).await {
            Ok(games) => GamesUpdate::Refreshed(games),
            Err(e) => {
                warn!("Games list refresh failed: {e:#}");
                GamesUpdate::RefreshFailed(format!("{e:#}"))
            }
        };

        if updates.send(update).await.is_err() {
            break;
        }
    }
}
