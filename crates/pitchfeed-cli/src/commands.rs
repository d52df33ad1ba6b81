// Subcommand bodies.

use std::future::Future;
use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pitchfeed_app::client::{FeedSource, StatsApiClient};
use pitchfeed_app::games::{refresh_games, run_games_refresher};
use pitchfeed_app::protocol::{FeedUpdate, GamesUpdate};
use pitchfeed_app::store::Store;
use pitchfeed_app::watcher::GameWatcher;
use pitchfeed_baseball::GamePk;
use pitchfeed_core::config::Config;
use pitchfeed_core::feed::FeedKind;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::render;

pub async fn games(config: &Config, date: Option<NaiveDate>, out: &mut impl Write) -> Result<()> {
    let client = StatsApiClient::from_config(&config.api)?;
    let store = Store::open(&config.db_path).context("failed to open database")?;

    let games = refresh_games(&client, &store, date).await?;
    if games.is_empty() {
        writeln!(out, "No live games.")?;
    }
    for game in &games {
        writeln!(out, "{}", render::game_line(game))?;
    }
    Ok(())
}

/// Reprint the live games list on every refresh until Ctrl+C.
pub async fn watch_games(config: &Config, out: &mut impl Write) -> Result<()> {
    let client = Arc::new(StatsApiClient::from_config(&config.api)?);
    let store = Arc::new(Store::open(&config.db_path).context("failed to open database")?);
    let (tx, mut rx) = mpsc::channel(8);

    let refresher = tokio::spawn(run_games_refresher(
        client,
        store,
        config.intervals().games_list,
        tx,
    ));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            update = rx.recv() => match update {
                Some(update) => write_games_update(&update, out)?,
                None => break,
            },
        }
    }

    refresher.abort();
    Ok(())
}

fn write_games_update(update: &GamesUpdate, out: &mut impl Write) -> Result<()> {
    match update {
        GamesUpdate::Refreshed(games) => {
            writeln!(out, "-- {} live game(s) --", games.len())?;
            for game in games {
                writeln!(out, "{}", render::game_line(game))?;
            }
        }
        GamesUpdate::RefreshFailed(message) => writeln!(out, "! games refresh failed: {message}")?,
    }
    out.flush()?;
    Ok(())
}

pub fn plays(config: &Config, game_pk: GamePk, out: &mut impl Write) -> Result<()> {
    let store = Store::open(&config.db_path).context("failed to open database")?;
    let plays = store.load_plays(game_pk)?;
    if plays.is_empty() {
        writeln!(out, "No stored plays for game {game_pk}.")?;
    }
    for play in &plays {
        writeln!(out, "{}", render::play_line(play))?;
    }
    Ok(())
}

pub async fn watch(
    config: &Config,
    game_pk: GamePk,
    feed: FeedKind,
    clear: bool,
    out: &mut impl Write,
) -> Result<()> {
    let client = Arc::new(StatsApiClient::from_config(&config.api)?);
    let store = Arc::new(Store::open(&config.db_path).context("failed to open database")?);

    let (update_tx, mut update_rx) = mpsc::channel(256);
    let mut watcher = GameWatcher::new(client, &[feed], config.intervals(), store, update_tx);
    let mut switches = spawn_stdin_switches();

    watcher.select(game_pk, false)?;
    writeln!(out, "Watching game {game_pk} ({feed}); enter another game id to switch, Ctrl+C to quit.")?;

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    run_watch_loop(&mut watcher, &mut update_rx, &mut switches, clear, shutdown, out).await?;

    watcher.deselect(false)?;
    Ok(())
}

/// Print and persist updates until the watched game finishes or `shutdown`
/// resolves. Game ids received on `switches` move the watcher to that game.
pub async fn run_watch_loop<S, W, F>(
    watcher: &mut GameWatcher<S>,
    updates: &mut mpsc::Receiver<FeedUpdate>,
    switches: &mut mpsc::Receiver<GamePk>,
    clear: bool,
    shutdown: F,
    out: &mut W,
) -> Result<()>
where
    S: FeedSource,
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, stopping");
                break;
            }
            Some(next) = switches.recv() => {
                if watcher.current() == Some(next) {
                    continue;
                }
                watcher.select(next, clear)?;
                writeln!(out, "Switched to game {next}.")?;
            }
            update = updates.recv() => {
                let Some(update) = update else { break };
                if !watcher.apply(&update)? {
                    continue;
                }
                for line in render::update_lines(&update) {
                    writeln!(out, "{line}")?;
                }
                out.flush()?;
                if watcher.is_idle() {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Game ids typed on stdin, one per line. Reading happens on a plain thread
/// so a pending read never holds up runtime shutdown.
fn spawn_stdin_switches() -> mpsc::Receiver<GamePk> {
    let (tx, rx) = mpsc::channel(4);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match trimmed.parse::<GamePk>() {
                Ok(game_pk) => {
                    if tx.blocking_send(game_pk).is_err() {
                        break;
                    }
                }
                Err(_) => warn!("Ignoring invalid game id on stdin: {trimmed:?}"),
            }
        }
    });
    rx
}
