use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use subchat::clock::{Clock, SystemClock};
use subchat::data::{AppStateStore, Preferences, SqlitePreferences};
use subchat::input::ShortcutRegistry;
use subchat::repro::{replay, Recorder, Tape};
use subchat::{
    util, App, ChatBackend, Config, Database, EffectRunner, HubSettings, LocalBackend, SessionHub,
};

#[derive(Parser)]
#[command(name = "subchat", version)]
#[command(about = "Multi-session chat navigation: tabs, pins, splits, undo and quick switch")]
struct Cli {
    /// Directory for the database, config and logs (default ~/.subchat)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive list UI (the default)
    Run {
        /// Record every command to a replayable JSONL tape
        #[arg(long, value_name = "TAPE")]
        record: Option<PathBuf>,
    },

    /// Replay a tape offline and print the final state as JSON
    Replay {
        tape: PathBuf,

        /// Print every labeled snapshot, not just the final state
        #[arg(long)]
        all: bool,
    },
}

fn init_logging() -> Result<()> {
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir);
    init_logging()?;

    match cli.command.unwrap_or(Commands::Run { record: None }) {
        Commands::Run { record } => run(record.as_deref()).await,
        Commands::Replay { tape, all } => replay_tape(&tape, all).await,
    }
}

async fn run(record: Option<&Path>) -> Result<()> {
    subchat::ui::install_panic_hook();

    let config = Config::load(&util::config_path());
    let db = Database::open(util::database_path()).context("failed to open database")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let local = LocalBackend::with_clock(&db, clock.clone());
    local.ensure_seeded()?;
    let backend: Arc<dyn ChatBackend> = Arc::new(local);
    let preferences = Preferences::new(Arc::new(SqlitePreferences::new(AppStateStore::new(
        db.connection(),
    ))));

    let mut hub = SessionHub::new(HubSettings::from(&config.navigation), clock.clone());
    let primary = preferences.quick_switch_primary().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable quick switch preference");
        Default::default()
    });
    hub.set_primary_target(primary);

    let shortcuts = ShortcutRegistry::new();
    let mut app = App::new(hub, &config, &shortcuts)?;
    if let Some(path) = record {
        let mut pins = HashMap::new();
        for workspace in backend.list_workspaces().await? {
            match preferences.load_pins(workspace.id) {
                Ok(ids) => {
                    pins.insert(workspace.id, ids);
                }
                Err(e) => tracing::warn!(workspace_id = %workspace.id, error = %e, "Unreadable pins"),
            }
        }
        let recorder = Recorder::start(path, backend.as_ref(), primary, &pins, clock.wall())
            .await
            .with_context(|| format!("failed to start recording to {}", path.display()))?;
        app = app.with_recorder(recorder);
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting");
    app.run(EffectRunner::new(backend, preferences)).await
}

async fn replay_tape(path: &Path, all: bool) -> Result<()> {
    let tape = Tape::read_jsonl_from_path(path)?;
    let report = replay(&tape)
        .await
        .with_context(|| format!("failed to replay {}", path.display()))?;

    let json = if all {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string_pretty(&report.final_state)?
    };
    println!("{json}");
    Ok(())
}
