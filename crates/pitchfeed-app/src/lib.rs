// Live feed orchestration: HTTP client, per-game pollers, the games list
// refresher and the local SQLite mirror.

pub mod client;
pub mod games;
pub mod poller;
pub mod protocol;
pub mod store;
pub mod watcher;
