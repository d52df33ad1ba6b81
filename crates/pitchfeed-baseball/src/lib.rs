// Baseball domain model and the pure parts of live-feed handling: status
// classification, snapshot extraction and play reconciliation.

pub mod atbat;
pub mod extract;
pub mod play;
pub mod reconcile;
pub mod schedule;
pub mod status;

pub use atbat::{AtBatContext, Bases};
pub use play::{GamePk, HalfInning, Play, PlayKey, PlayMap};
pub use reconcile::{reconcile, Reconciliation};
pub use status::{classify, GameStatus};
