// Live feed polling.
//
// A `LiveFeedPoller` runs one background session per game for a single feed
// kind. Each session performs a fetch-and-reconcile cycle immediately, then
// keeps cycling at the configured interval for as long as the game is live.
// Results are pushed to the owner as `FeedUpdate`s over an mpsc channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pitchfeed_baseball::extract::extract_snapshot;
use pitchfeed_baseball::{reconcile, AtBatContext, GamePk, GameStatus, Play, PlayMap};
use pitchfeed_core::error::FeedError;
use pitchfeed_core::feed::FeedKind;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::FeedSource;
use crate::protocol::{FeedUpdate, PollError, PollHandle};

// ---------------------------------------------------------------------------
// PollSession
// ---------------------------------------------------------------------------

/// Per-game polling state. Owned by the session task; nothing else mutates
/// `plays`.
#[derive(Debug)]
pub struct PollSession {
    pub handle: PollHandle,
    pub interval: Duration,
    /// `None` until the first cycle completes. A failed first cycle
    /// settles it on `Unknown`.
    pub last_status: Option<GameStatus>,
    /// Every play seen so far: the base the next snapshot is diffed against.
    pub plays: PlayMap,
    /// Last at-bat context reported to the owner.
    pub at_bat: Option<AtBatContext>,
}

/// What one successful cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub status: GameStatus,
    pub detailed_state: String,
    pub status_changed: bool,
    pub delta: Vec<Play>,
    /// Set when the game is live and the at-bat differs from the last one
    /// reported.
    pub at_bat: Option<AtBatContext>,
}

impl PollSession {
    pub fn new(handle: PollHandle, interval: Duration, plays: PlayMap) -> Self {
        Self {
            handle,
            interval,
            last_status: None,
            plays,
            at_bat: None,
        }
    }

    /// Extract, classify and reconcile one fetched feed. On error the session
    /// is left exactly as it was.
    pub fn apply_feed(
        &mut self,
        feed: &Value,
        observed_at: DateTime<Utc>,
    ) -> Result<CycleOutcome, FeedError> {
        let snapshot = extract_snapshot(self.handle.game_pk, feed, observed_at)?;
        let result = reconcile(self.handle.game_pk, &self.plays, &snapshot.plays);

        let previous = self.last_status.replace(snapshot.status);
        self.plays = result.plays;

        let at_bat = match snapshot.at_bat {
            Some(context) if snapshot.status.is_live() && self.at_bat.as_ref() != Some(&context) => {
                self.at_bat = Some(context.clone());
                Some(context)
            }
            _ => None,
        };

        Ok(CycleOutcome {
            status: snapshot.status,
            detailed_state: snapshot.detailed_state,
            status_changed: previous != Some(snapshot.status),
            delta: result.delta,
            at_bat,
        })
    }

    /// Record a failed cycle. Known state is kept; a session with no status
    /// yet is treated as `Unknown`.
    pub fn record_failure(&mut self) {
        self.last_status.get_or_insert(GameStatus::Unknown);
    }

    /// Whether another cycle should be scheduled: only while the last known
    /// status is live.
    pub fn should_continue(&self) -> bool {
        self.last_status.is_some_and(|s| s.is_live())
    }
}

// ---------------------------------------------------------------------------
// LiveFeedPoller
// ---------------------------------------------------------------------------

struct ActiveSession {
    handle: PollHandle,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Starts and stops poll sessions for one feed kind.
pub struct LiveFeedPoller<S: FeedSource> {
    source: Arc<S>,
    kind: FeedKind,
    interval: Duration,
    updates: mpsc::Sender<FeedUpdate>,
    sessions: HashMap<GamePk, ActiveSession>,
    /// Incremented per started session; see [`PollHandle`].
    generation: u64,
}

impl<S: FeedSource> LiveFeedPoller<S> {
    pub fn new(
        source: Arc<S>,
        kind: FeedKind,
        interval: Duration,
        updates: mpsc::Sender<FeedUpdate>,
    ) -> Self {
        Self {
            source,
            kind,
            interval,
            updates,
            sessions: HashMap::new(),
            generation: 0,
        }
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    /// Start polling `game_pk` with no known plays.
    pub fn start(&mut self, game_pk: GamePk) -> Result<PollHandle, PollError> {
        self.start_with_plays(game_pk, PlayMap::new())
    }

    /// Start polling `game_pk`, diffing the first snapshot against `plays`
    /// (typically what the store already holds for the game).
    ///
    /// Fails if a session for this game is still running.
    pub fn start_with_plays(
        &mut self,
        game_pk: GamePk,
        plays: PlayMap,
    ) -> Result<PollHandle, PollError> {
        self.sessions.retain(|_, active| !active.task.is_finished());
        if self.is_polling(game_pk) {
            return Err(PollError::AlreadyPolling {
                game_pk,
                kind: self.kind,
            });
        }

        self.generation += 1;
        let handle = PollHandle {
            game_pk,
            kind: self.kind,
            generation: self.generation,
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let session = PollSession::new(handle, self.interval, plays);
        let task = tokio::spawn(run_session(
            session,
            Arc::clone(&self.source),
            self.updates.clone(),
            stop_rx,
        ));

        self.sessions.insert(
            game_pk,
            ActiveSession {
                handle,
                stop_tx,
                task,
            },
        );
        info!(
            "Started {} polling for game {} every {:?} (gen: {})",
            self.kind, game_pk, self.interval, handle.generation
        );
        Ok(handle)
    }

    /// Stop a session. Pending cycles are cancelled at once; a fetch already
    /// in flight is allowed to finish but its result is dropped. Returns
    /// `false` if `handle` is not the current session for its game.
    pub fn stop(&mut self, handle: PollHandle) -> bool {
        match self.sessions.get(&handle.game_pk) {
            Some(active) if active.handle == handle => {}
            _ => return false,
        }
        if let Some(active) = self.sessions.remove(&handle.game_pk) {
            let _ = active.stop_tx.send(true);
            info!(
                "Stopped {} polling for game {} (gen: {})",
                self.kind, handle.game_pk, handle.generation
            );
        }
        true
    }

    pub fn stop_all(&mut self) {
        for (_, active) in self.sessions.drain() {
            let _ = active.stop_tx.send(true);
        }
    }

    /// Whether a session for `game_pk` is still running.
    pub fn is_polling(&self, game_pk: GamePk) -> bool {
        self.sessions
            .get(&game_pk)
            .is_some_and(|active| !active.task.is_finished())
    }
}

impl<S: FeedSource> Drop for LiveFeedPoller<S> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// ---------------------------------------------------------------------------
// Session task
// ---------------------------------------------------------------------------

fn stop_requested(stop_rx: &watch::Receiver<bool>) -> bool {
    *stop_rx.borrow() || stop_rx.has_changed().is_err()
}

/// Drive one session until the game stops being live, the owner stops it,
/// or the update receiver goes away.
async fn run_session<S: FeedSource>(
    mut session: PollSession,
    source: Arc<S>,
    updates: mpsc::Sender<FeedUpdate>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let handle = session.handle;

    // The first tick completes immediately, which gives the initial cycle.
    // Ticks that fall due while a fetch is in flight are skipped.
    let mut ticker = tokio::time::interval(session.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }
        if stop_requested(&stop_rx) {
            break;
        }

        let fetched = source.fetch_feed(handle.game_pk, handle.kind).await;

        if stop_requested(&stop_rx) {
            debug!(
                "Discarding {} result for stopped game {} (gen: {})",
                handle.kind, handle.game_pk, handle.generation
            );
            break;
        }

        let updates_open = match fetched.and_then(|feed| session.apply_feed(&feed, Utc::now())) {
            Ok(outcome) => publish_outcome(&updates, handle, outcome).await,
            Err(error) => {
                session.record_failure();
                warn!(
                    error_kind = error.kind(),
                    "{} cycle failed for game {}: {}",
                    handle.kind,
                    handle.game_pk,
                    error
                );
                updates
                    .send(FeedUpdate::CycleFailed {
                        session: handle,
                        error,
                    })
                    .await
                    .is_ok()
            }
        };

        if !updates_open {
            debug!("Update receiver dropped, ending session for game {}", handle.game_pk);
            break;
        }

        if !session.should_continue() {
            let status = session.last_status.unwrap_or(GameStatus::Unknown);
            info!(
                "Game {} is {}, ending {} polling",
                handle.game_pk, status, handle.kind
            );
            let _ = updates
                .send(FeedUpdate::Finished {
                    session: handle,
                    status,
                })
                .await;
            break;
        }
    }
}

/// Send the status (when it changed), the delta (when non-empty) and the
/// at-bat context (when it changed). Returns `false` once the receiver is
/// gone.
async fn publish_outcome(
    updates: &mpsc::Sender<FeedUpdate>,
    handle: PollHandle,
    outcome: CycleOutcome,
) -> bool {
    if outcome.status_changed {
        let sent = updates
            .send(FeedUpdate::Status {
                session: handle,
                status: outcome.status,
                detailed_state: outcome.detailed_state,
            })
            .await;
        if sent.is_err() {
            return false;
        }
    }

    if !outcome.delta.is_empty() {
        debug!(
            "{} new or changed plays for game {}",
            outcome.delta.len(),
            handle.game_pk
        );
        let sent = updates
            .send(FeedUpdate::Plays {
                session: handle,
                delta: outcome.delta,
            })
            .await;
        if sent.is_err() {
            return false;
        }
    }

    match outcome.at_bat {
        Some(context) => updates
            .send(FeedUpdate::AtBat {
                session: handle,
                context,
            })
            .await
            .is_ok(),
        None => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
