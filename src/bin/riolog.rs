//! RioLog command-line console

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use riolog::{
    ConsoleConfig, ConsoleSession, DisplayEvent, DisplaySurface, PresentationBridge, RioLog,
    TextDisplay,
};

#[derive(Parser, Debug)]
#[command(name = "riolog")]
#[command(about = "Stream or view an FRC robot console", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to a robot and stream its console
    Listen {
        /// Team number; overrides the config file
        #[arg(long)]
        team: Option<u32>,

        /// YAML connection settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Save everything shown to this file on Ctrl-C
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Print a saved console log
    View {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("riolog=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Listen { team, config, save } => listen(team, config, save).await,
        Command::View { file } => view(file).await,
    }
}

async fn listen(team: Option<u32>, config: Option<PathBuf>, save: Option<PathBuf>) -> Result<()> {
    let mut config = match config {
        Some(path) => ConsoleConfig::from_path(&path)?,
        None => ConsoleConfig::default(),
    };
    if let Some(team) = team {
        config.team_number = team;
    }
    let hidden_capacity = config.hidden_capacity;
    tracing::info!("Listening for team {}", config.team_number);

    let mut session = ConsoleSession::new(config)?;
    let bridge = PresentationBridge::with_capacity(
        TextDisplay::new(tokio::io::stdout()),
        session.handle(),
        hidden_capacity,
    );
    let (display_tx, display_rx) = mpsc::channel(16);
    let bridge_task = tokio::spawn(bridge.run(session.subscribe(), display_rx));

    display_tx.send(DisplayEvent::Active).await?;
    session.start_listening();

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    display_tx.send(DisplayEvent::Disposed).await?;
    let display = bridge_task.await?;
    session.shutdown().await;

    if let Some(path) = save {
        let records = display.shown().to_vec();
        let count = records.len();
        let mut display = display.with_save_path(&path);
        if !display.handle_save(records).await {
            anyhow::bail!("failed to save console log to {}", path.display());
        }
        tracing::info!("Saved {} records to {}", count, path.display());
    }
    Ok(())
}

async fn view(file: PathBuf) -> Result<()> {
    let replay = RioLog::open(&file)?;
    let bridge = PresentationBridge::new(TextDisplay::new(tokio::io::stdout()), replay.clone());

    // No display lifecycle: print the whole log and exit
    let (_, display_rx) = mpsc::channel(1);
    bridge.run(replay.subscribe(), display_rx).await;
    Ok(())
}
