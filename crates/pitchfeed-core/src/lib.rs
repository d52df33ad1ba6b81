// Shared infrastructure for the pitchfeed crates: configuration, feed kinds
// and the error types that cross crate boundaries.

pub mod config;
pub mod error;
pub mod feed;
