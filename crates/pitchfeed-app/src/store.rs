// SQLite mirror of reconciled plays and the live games list.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pitchfeed_baseball::play::Count;
use pitchfeed_baseball::schedule::GameSummary;
use pitchfeed_baseball::{GamePk, GameStatus, HalfInning, Play, PlayMap};
use rusqlite::{params, Connection, Row};

/// SQLite-backed storage for plays (one row per play identity) and the most
/// recent live games listing.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database at `path` and ensure the schema exists.
    /// `":memory:"` gives an ephemeral database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS plays (
                game_pk       INTEGER NOT NULL,
                inning        INTEGER NOT NULL,
                half_inning   TEXT NOT NULL,
                at_bat_index  INTEGER NOT NULL,
                event_type    TEXT NOT NULL,
                description   TEXT NOT NULL,
                is_complete   INTEGER NOT NULL,
                balls         INTEGER NOT NULL,
                strikes       INTEGER NOT NULL,
                outs          INTEGER NOT NULL,
                away_score    INTEGER NOT NULL,
                home_score    INTEGER NOT NULL,
                batter        TEXT NOT NULL,
                pitcher       TEXT NOT NULL,
                observed_at   TEXT NOT NULL,
                PRIMARY KEY (game_pk, inning, half_inning, at_bat_index)
            );

            CREATE TABLE IF NOT EXISTS games (
                game_pk        INTEGER PRIMARY KEY,
                away_team      TEXT NOT NULL,
                home_team      TEXT NOT NULL,
                status         TEXT NOT NULL,
                detailed_state TEXT NOT NULL,
                start_time     TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Writes are transactional; a poisoned lock is still consistent.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -- Plays -------------------------------------------------------------

    /// Insert or update plays by identity. `observed_at` is written only on
    /// first insert.
    pub fn upsert_plays(&self, plays: &[Play]) -> Result<()> {
        if plays.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO plays (
                     game_pk, inning, half_inning, at_bat_index, event_type, description,
                     is_complete, balls, strikes, outs, away_score, home_score,
                     batter, pitcher, observed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT(game_pk, inning, half_inning, at_bat_index) DO UPDATE SET
                     event_type  = excluded.event_type,
                     description = excluded.description,
                     is_complete = excluded.is_complete,
                     balls       = excluded.balls,
                     strikes     = excluded.strikes,
                     outs        = excluded.outs,
                     away_score  = excluded.away_score,
                     home_score  = excluded.home_score,
                     batter      = excluded.batter,
                     pitcher     = excluded.pitcher",
            )?;
            for play in plays {
                stmt.execute(params![
                    game_pk_to_sql(play.game_pk)?,
                    play.inning,
                    play.half_inning.as_str(),
                    play.at_bat_index,
                    play.event_type,
                    play.description,
                    play.is_complete,
                    play.count.balls,
                    play.count.strikes,
                    play.count.outs,
                    play.away_score,
                    play.home_score,
                    play.batter,
                    play.pitcher,
                    play.observed_at.to_rfc3339(),
                ])
                .with_context(|| format!("failed to upsert play {}", play.key()))?;
            }
        }
        tx.commit().context("failed to commit plays")?;
        Ok(())
    }

    /// All stored plays for a game in game order.
    pub fn load_plays(&self, game_pk: GamePk) -> Result<Vec<Play>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT game_pk, inning, half_inning, at_bat_index, event_type, description,
                    is_complete, balls, strikes, outs, away_score, home_score,
                    batter, pitcher, observed_at
             FROM plays
             WHERE game_pk = ?1
             ORDER BY inning,
                      CASE half_inning WHEN 'top' THEN 0 WHEN 'bottom' THEN 1 ELSE 2 END,
                      at_bat_index",
        )?;
        let plays = stmt
            .query_map(params![game_pk_to_sql(game_pk)?], play_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("failed to load plays for game {game_pk}"))?;
        Ok(plays)
    }

    /// Stored plays keyed by identity, ready to seed a poll session.
    pub fn load_play_map(&self, game_pk: GamePk) -> Result<PlayMap> {
        Ok(self
            .load_plays(game_pk)?
            .into_iter()
            .map(|play| (play.key(), play))
            .collect())
    }

    /// Delete every stored play for a game. Returns the number removed.
    pub fn clear_plays(&self, game_pk: GamePk) -> Result<usize> {
        let removed = self
            .conn()
            .execute(
                "DELETE FROM plays WHERE game_pk = ?1",
                params![game_pk_to_sql(game_pk)?],
            )
            .with_context(|| format!("failed to clear plays for game {game_pk}"))?;
        Ok(removed)
    }

    pub fn play_count(&self, game_pk: GamePk) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM plays WHERE game_pk = ?1",
            params![game_pk_to_sql(game_pk)?],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // -- Games -------------------------------------------------------------

    /// Replace the stored games list wholesale.
    pub fn replace_games(&self, games: &[GameSummary]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM games", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO games
                     (game_pk, away_team, home_team, status, detailed_state, start_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for game in games {
                stmt.execute(params![
                    game_pk_to_sql(game.game_pk)?,
                    game.away_team,
                    game.home_team,
                    game.status.as_str(),
                    game.detailed_state,
                    game.start_time,
                ])?;
            }
        }
        tx.commit().context("failed to commit games list")?;
        Ok(())
    }

    /// Stored games, most recent start first.
    pub fn load_games(&self) -> Result<Vec<GameSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT game_pk, away_team, home_team, status, detailed_state, start_time
             FROM games
             ORDER BY start_time DESC",
        )?;
        let games = stmt
            .query_map([], |row| {
                let status: String = row.get(3)?;
                Ok(GameSummary {
                    game_pk: game_pk_from_sql(row.get(0)?),
                    away_team: row.get(1)?,
                    home_team: row.get(2)?,
                    status: GameStatus::from_name(&status),
                    detailed_state: row.get(4)?,
                    start_time: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load games")?;
        Ok(games)
    }
}

fn game_pk_to_sql(game_pk: GamePk) -> Result<i64> {
    i64::try_from(game_pk).with_context(|| format!("game id {game_pk} out of range"))
}

fn game_pk_from_sql(raw: i64) -> GamePk {
    raw.max(0) as GamePk
}

fn play_from_row(row: &Row<'_>) -> rusqlite::Result<Play> {
    let half: String = row.get(2)?;
    let observed: String = row.get(14)?;
    let observed_at = DateTime::parse_from_rfc3339(&observed)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(14, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Play {
        game_pk: game_pk_from_sql(row.get(0)?),
        inning: row.get(1)?,
        half_inning: HalfInning::parse(&half),
        at_bat_index: row.get(3)?,
        event_type: row.get(4)?,
        description: row.get(5)?,
        is_complete: row.get(6)?,
        count: Count {
            balls: row.get(7)?,
            strikes: row.get(8)?,
            outs: row.get(9)?,
        },
        away_score: row.get(10)?,
        home_score: row.get(11)?,
        batter: row.get(12)?,
        pitcher: row.get(13)?,
        observed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_store() -> Store {
        Store::open(":memory:").expect("in-memory database should open")
    }

    fn play(game_pk: GamePk, inning: u32, half: HalfInning, ab: u32, desc: &str) -> Play {
        Play {
            game_pk,
            at_bat_index: ab,
            inning,
            half_inning: half,
            event_type: "single".into(),
            description: desc.into(),
            is_complete: true,
            count: Count {
                balls: 1,
                strikes: 2,
                outs: 0,
            },
            away_score: 0,
            home_score: 0,
            batter: "Batter".into(),
            pitcher: "Pitcher".into(),
            observed_at: Utc.timestamp_opt(1_720_000_000, 0).unwrap(),
        }
    }

    fn game(game_pk: GamePk, start_time: &str) -> GameSummary {
        GameSummary {
            game_pk,
            away_team: "Yankees".into(),
            home_team: "Red Sox".into(),
            status: GameStatus::Live,
            detailed_state: "In Progress".into(),
            start_time: start_time.into(),
        }
    }

    #[test]
    fn plays_round_trip_through_sqlite() {
        let store = test_store();
        let original = play(1, 3, HalfInning::Bottom, 20, "Single to left.");
        store.upsert_plays(&[original.clone()]).unwrap();

        assert_eq!(store.load_plays(1).unwrap(), vec![original]);
    }

    #[test]
    fn load_orders_by_game_position() {
        let store = test_store();
        store
            .upsert_plays(&[
                play(1, 2, HalfInning::Top, 6, "c"),
                play(1, 1, HalfInning::Bottom, 3, "b"),
                play(1, 1, HalfInning::Top, 0, "a"),
            ])
            .unwrap();

        let order: Vec<String> = store
            .load_plays(1)
            .unwrap()
            .into_iter()
            .map(|p| p.description)
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn upsert_updates_content_but_keeps_first_observed_at() {
        let store = test_store();
        let first = play(1, 1, HalfInning::Top, 0, "Ball in play.");
        store.upsert_plays(&[first.clone()]).unwrap();

        let mut revised = first.clone();
        revised.description = "Judge singles to left.".into();
        revised.observed_at = Utc.timestamp_opt(1_720_000_600, 0).unwrap();
        store.upsert_plays(&[revised]).unwrap();

        let stored = store.load_plays(1).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].description, "Judge singles to left.");
        assert_eq!(stored[0].observed_at, first.observed_at);
    }

    #[test]
    fn plays_are_scoped_per_game() {
        let store = test_store();
        store
            .upsert_plays(&[
                play(1, 1, HalfInning::Top, 0, "a"),
                play(2, 1, HalfInning::Top, 0, "b"),
            ])
            .unwrap();

        assert_eq!(store.play_count(1).unwrap(), 1);
        assert_eq!(store.clear_plays(1).unwrap(), 1);
        assert_eq!(store.play_count(1).unwrap(), 0);
        assert_eq!(store.play_count(2).unwrap(), 1);
    }

    #[test]
    fn play_map_is_keyed_by_identity() {
        let store = test_store();
        let stored = play(9, 4, HalfInning::Top, 30, "x");
        store.upsert_plays(&[stored.clone()]).unwrap();

        let map = store.load_play_map(9).unwrap();
        assert_eq!(map.get(&stored.key()), Some(&stored));
    }

    #[test]
    fn games_list_is_replaced_wholesale() {
        let store = test_store();
        store
            .replace_games(&[game(1, "2024-07-04T17:05:00Z"), game(2, "2024-07-04T23:10:00Z")])
            .unwrap();
        let pks: Vec<GamePk> = store.load_games().unwrap().iter().map(|g| g.game_pk).collect();
        assert_eq!(pks, vec![2, 1]);

        store.replace_games(&[game(3, "2024-07-05T18:00:00Z")]).unwrap();
        let games = store.load_games().unwrap();
        assert_eq!(games, vec![game(3, "2024-07-05T18:00:00Z")]);

        store.replace_games(&[]).unwrap();
        assert!(store.load_games().unwrap().is_empty());
    }
}
