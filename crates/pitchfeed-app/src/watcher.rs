// Follows one selected game across every configured feed kind and mirrors
// its plays into the store.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use pitchfeed_baseball::GamePk;
use pitchfeed_core::feed::{FeedKind, PollIntervals};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::FeedSource;
use crate::poller::LiveFeedPoller;
use crate::protocol::{FeedUpdate, PollHandle};
use crate::store::Store;

pub struct GameWatcher<S: FeedSource> {
    pollers: Vec<LiveFeedPoller<S>>,
    store: Arc<Store>,
    current: Option<GamePk>,
    /// Sessions started for `current` that have not finished yet.
    active: HashSet<PollHandle>,
}

impl<S: FeedSource> GameWatcher<S> {
    /// One poller per kind, all reporting on `updates`.
    pub fn new(
        source: Arc<S>,
        kinds: &[FeedKind],
        intervals: PollIntervals,
        store: Arc<Store>,
        updates: mpsc::Sender<FeedUpdate>,
    ) -> Self {
        let pollers = kinds
            .iter()
            .map(|&kind| {
                LiveFeedPoller::new(
                    Arc::clone(&source),
                    kind,
                    intervals.for_feed(kind),
                    updates.clone(),
                )
            })
            .collect();
        Self {
            pollers,
            store,
            current: None,
            active: HashSet::new(),
        }
    }

    pub fn current(&self) -> Option<GamePk> {
        self.current
    }

    /// Switch to `game_pk`. Sessions for the previous game are stopped (and
    /// its stored plays deleted when `clear_previous` is set). New sessions
    /// start from whatever the store already holds for the game. If any
    /// session fails to start, the ones already started are stopped and no
    /// game is selected.
    pub fn select(&mut self, game_pk: GamePk, clear_previous: bool) -> Result<Vec<PollHandle>> {
        self.deselect(clear_previous)?;

        let known = self.store.load_play_map(game_pk)?;
        if !known.is_empty() {
            debug!("Resuming game {} with {} stored plays", game_pk, known.len());
        }

        let mut handles = Vec::with_capacity(self.pollers.len());
        let mut failure = None;
        for poller in &mut self.pollers {
            match poller.start_with_plays(game_pk, known.clone()) {
                Ok(handle) => handles.push(handle),
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }
        if let Some(error) = failure {
            for (poller, handle) in self.pollers.iter_mut().zip(&handles) {
                poller.stop(*handle);
            }
            warn!("Could not watch game {}: {}", game_pk, error);
            return Err(error.into());
        }
        self.active.extend(handles.iter().copied());

        self.current = Some(game_pk);
        info!("Watching game {}", game_pk);
        Ok(handles)
    }

    /// Stop following the current game, if any.
    pub fn deselect(&mut self, clear: bool) -> Result<()> {
        let Some(previous) = self.current.take() else {
            return Ok(());
        };

        for handle in self.active.drain() {
            for poller in &mut self.pollers {
                if poller.kind() == handle.kind {
                    poller.stop(handle);
                }
            }
        }

        if clear {
            let removed = self.store.clear_plays(previous)?;
            debug!("Cleared {} stored plays for game {}", removed, previous);
        }
        Ok(())
    }

    /// Record an update. Returns `false` for updates from sessions that are
    /// no longer current; those are dropped without touching the store.
    pub fn apply(&mut self, update: &FeedUpdate) -> Result<bool> {
        let session = update.session();
        if !self.active.contains(&session) {
            debug!(
                "Ignoring stale {} update for game {} (gen: {})",
                session.kind, session.game_pk, session.generation
            );
            return Ok(false);
        }

        match update {
            FeedUpdate::Plays { delta, .. } => self.store.upsert_plays(delta)?,
            FeedUpdate::Finished { .. } => {
                self.active.remove(&session);
            }
            FeedUpdate::Status { .. }
            | FeedUpdate::AtBat { .. }
            | FeedUpdate::CycleFailed { .. } => {}
        }
        Ok(true)
    }

    /// True once every session for the current game has finished on its own.
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::tests::{feed, MockSource};
    use pitchfeed_baseball::GameStatus;
    use std::time::Duration;

    const GAME: GamePk = 745_123;
    const OTHER: GamePk = 745_200;

    fn new_watcher(
        source: Arc<MockSource>,
        store: Arc<Store>,
    ) -> (GameWatcher<MockSource>, mpsc::Receiver<FeedUpdate>) {
        let (tx, rx) = mpsc::channel(64);
        let watcher = GameWatcher::new(
            source,
            &[FeedKind::AtBat],
            PollIntervals::default(),
            store,
            tx,
        );
        (watcher, rx)
    }

    async fn drain_until_finished(
        watcher: &mut GameWatcher<MockSource>,
        rx: &mut mpsc::Receiver<FeedUpdate>,
    ) {
        while let Some(update) = rx.recv().await {
            watcher.apply(&update).unwrap();
            if watcher.is_idle() {
                break;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn plays_are_mirrored_into_the_store() {
        let source = Arc::new(MockSource::new(vec![
            Ok(feed("Live", &[(1, "top", 0, "out")])),
            Ok(feed("Final", &[(1, "top", 0, "out"), (1, "bottom", 1, "homer")])),
        ]));
        let store = Arc::new(Store::open(":memory:").unwrap());
        let (mut watcher, mut rx) = new_watcher(source, Arc::clone(&store));

        watcher.select(GAME, false).unwrap();
        drain_until_finished(&mut watcher, &mut rx).await;

        let stored = store.load_plays(GAME).unwrap();
        let descriptions: Vec<&str> = stored.iter().map(|p| p.description.as_str()).collect();
        assert_eq!(descriptions, vec!["out", "homer"]);
        assert_eq!(watcher.current(), Some(GAME));
    }

    #[tokio::test(start_paused = true)]
    async fn reselecting_resumes_from_stored_plays() {
        let store = Arc::new(Store::open(":memory:").unwrap());

        let first = Arc::new(MockSource::new(vec![Ok(feed("Final", &[(1, "top", 0, "out")]))]));
        let (mut watcher, mut rx) = new_watcher(first, Arc::clone(&store));
        watcher.select(GAME, false).unwrap();
        drain_until_finished(&mut watcher, &mut rx).await;
        drop(watcher);

        let second = Arc::new(MockSource::new(vec![Ok(feed(
            "Final",
            &[(1, "top", 0, "out"), (1, "top", 1, "walk")],
        ))]));
        let (mut watcher, mut rx) = new_watcher(second, Arc::clone(&store));
        watcher.select(GAME, false).unwrap();

        let mut deltas = Vec::new();
        while let Some(update) = rx.recv().await {
            watcher.apply(&update).unwrap();
            if let FeedUpdate::Plays { delta, .. } = update {
                deltas.extend(delta);
            }
            if watcher.is_idle() {
                break;
            }
        }
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].description, "walk");
        assert_eq!(store.play_count(GAME).unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_start_stops_sessions_already_started() {
        let source = Arc::new(MockSource::new(vec![Ok(feed("Live", &[]))]));
        let store = Arc::new(Store::open(":memory:").unwrap());
        let (tx, _rx) = mpsc::channel(64);
        let mut watcher = GameWatcher::new(
            source,
            &[FeedKind::AtBat, FeedKind::PlayByPlay],
            PollIntervals::default(),
            store,
            tx,
        );

        // A play-by-play session for the game is already running outside
        // the watcher, so the second poller refuses to start.
        let outside = watcher.pollers[1].start(GAME).unwrap();

        assert!(watcher.select(GAME, false).is_err());
        assert!(!watcher.pollers[0].is_polling(GAME));
        assert!(watcher.is_idle());
        assert_eq!(watcher.current(), None);

        assert!(watcher.pollers[1].stop(outside));
        let handles = watcher.select(GAME, false).unwrap();
        assert_eq!(handles.len(), 2);
        assert!(watcher.pollers.iter().all(|p| p.is_polling(GAME)));
    }

    #[tokio::test(start_paused = true)]
    async fn switching_games_drops_stale_updates_and_can_clear() {
        let source = Arc::new(MockSource::new(vec![Ok(feed("Live", &[(1, "top", 0, "out")]))]));
        let store = Arc::new(Store::open(":memory:").unwrap());
        let (mut watcher, mut rx) = new_watcher(source, Arc::clone(&store));

        let old = watcher.select(GAME, false).unwrap();
        // Status then Plays for the first game.
        for _ in 0..2 {
            let update = rx.recv().await.unwrap();
            assert!(watcher.apply(&update).unwrap());
        }
        assert_eq!(store.play_count(GAME).unwrap(), 1);

        watcher.select(OTHER, true).unwrap();
        assert_eq!(store.play_count(GAME).unwrap(), 0);

        let stale = FeedUpdate::Status {
            session: old[0],
            status: GameStatus::Final,
            detailed_state: "Final".into(),
        };
        assert!(!watcher.apply(&stale).unwrap());
        assert_eq!(watcher.current(), Some(OTHER));

        tokio::time::sleep(Duration::from_secs(1)).await;
        watcher.deselect(false).unwrap();
        assert_eq!(watcher.current(), None);
        assert!(watcher.is_idle());
    }
}
