// Incremental play reconciliation.
//
// Compares a full snapshot against the plays already known for a game and
// yields the new map plus the ordered delta of new or changed plays.

use std::collections::HashMap;

use crate::play::{GamePk, Play, PlayKey, PlayMap};

/// The result of reconciling one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Prior plays with the snapshot applied.
    pub plays: PlayMap,
    /// New or changed plays, in snapshot order.
    pub delta: Vec<Play>,
}

/// Reconcile `snapshot` for `game_pk` against `prior`.
///
/// Keys are built from `game_pk` and each play's inning, half and at-bat
/// index. If a key repeats within the snapshot the later occurrence wins,
/// placed at the position the key first appeared. Each resolved play is then
/// compared against `prior`: a new key is inserted, a key whose content
/// differs is replaced (keeping the original `observed_at`), and identical
/// plays are left alone and not reported.
///
/// Pure: no clock, no I/O.
pub fn reconcile(game_pk: GamePk, prior: &PlayMap, snapshot: &[Play]) -> Reconciliation {
    let mut order: Vec<PlayKey> = Vec::with_capacity(snapshot.len());
    let mut latest: HashMap<PlayKey, &Play> = HashMap::with_capacity(snapshot.len());
    for incoming in snapshot {
        let key = incoming.key_for(game_pk);
        if latest.insert(key, incoming).is_none() {
            order.push(key);
        }
    }

    let mut plays = prior.clone();
    let mut delta: Vec<Play> = Vec::new();

    for key in order {
        let Some(incoming) = latest.remove(&key) else {
            continue;
        };
        let mut candidate = incoming.clone();
        candidate.game_pk = game_pk;

        match prior.get(&key) {
            Some(existing) if existing.same_content(&candidate) => continue,
            Some(existing) => candidate.observed_at = existing.observed_at,
            None => {}
        }

        plays.insert(key, candidate.clone());
        delta.push(candidate);
    }

    Reconciliation { plays, delta }
}
