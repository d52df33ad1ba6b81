// Terminal client for live play-by-play.

pub mod cli;
pub mod commands;
pub mod render;
