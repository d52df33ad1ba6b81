// pitchfeed entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (log to file, not terminal)
// 3. Load config (copying defaults on first run)
// 4. Run the subcommand

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pitchfeed_cli::cli::{Cli, Command};
use pitchfeed_cli::commands;
use pitchfeed_core::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing()?;
    info!("pitchfeed starting: {:?}", cli.command);

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: api={}, db={}",
        config.api.base_url, config.db_path
    );

    let mut out = std::io::stdout();
    let result = match cli.command {
        Command::Games { date, watch: false } => commands::games(&config, date, &mut out).await,
        Command::Games { watch: true, .. } => commands::watch_games(&config, &mut out).await,
        Command::Watch {
            game_pk,
            feed,
            clear,
        } => commands::watch(&config, game_pk, feed.into(), clear, &mut out).await,
        Command::Plays { game_pk } => commands::plays(&config, game_pk, &mut out),
    };

    if let Err(e) = &result {
        tracing::error!("{e:#}");
    }
    info!("pitchfeed exiting");
    result
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("pitchfeed.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pitchfeed=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
