//! # habits
//!
//! Command-line habit tracker on top of habit-sync.
//!
//! Every change is stored locally first and sent to the habit service when
//! it is reachable. With `--offline` nothing is sent; queued changes go out
//! on the next online run.
//!
//! ## Commands
//!
//! - `init`: Write the server config
//! - `list`: Show habits and today's progress
//! - `add` / `edit` / `rm`: Manage habits
//! - `done` / `undo`: Count or take back a completion
//! - `sync`: Send queued changes and fetch the server's habits
//! - `reset`: Forget all local state
//! - `status`: Show config, queue and last sync
//!
//! ## Example
//!
//! ```bash
//! habits init --base-url https://habits.example.com
//! habits add "Drink water" --need 8
//! habits --offline done 3f2a
//! habits sync
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use habit_sync_client::{
    CompletionDelta, ConnectivityMonitor, FileStore, HabitSync, HttpRemote,
};
use habit_sync_core::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::add::NewHabit;
use commands::edit::HabitEdit;
use commands::{add, edit, init, list, remove, reset, status, sync, toggle};
use config::CliConfig;

/// Command-line habit tracker with offline sync.
#[derive(Parser, Debug)]
#[command(name = "habits")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for config, habits and the sync queue
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Work offline: changes are queued, nothing is sent
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the server configuration
    Init {
        /// Base URL of the habit service
        #[arg(long)]
        base_url: String,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    #[command(flatten)]
    Habits(HabitCommand),
}

/// Commands that work on the local habit store.
#[derive(Subcommand, Debug)]
enum HabitCommand {
    /// List habits with today's progress
    List {
        /// Only habits scheduled for today
        #[arg(long)]
        today: bool,
    },

    /// Add a habit
    Add {
        /// Habit name
        name: String,

        /// Completions needed per day
        #[arg(long)]
        need: Option<u32>,

        /// Scheduled days, e.g. mon,wed,fri (default: every day)
        #[arg(long)]
        days: Option<String>,

        /// Color tag
        #[arg(long)]
        color: Option<String>,

        /// Category (sport, reading, food, health, education, productivity, personal_care, social, other)
        #[arg(long)]
        category: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Notification time HH:MM (repeatable)
        #[arg(long)]
        notify: Vec<String>,
    },

    /// Count one completion for today
    Done {
        /// Habit id or unique prefix
        id: String,
    },

    /// Take back one of today's completions
    Undo {
        /// Habit id or unique prefix
        id: String,
    },

    /// Edit a habit
    Edit {
        /// Habit id or unique prefix
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Completions needed per day
        #[arg(long)]
        need: Option<u32>,

        /// Scheduled days, e.g. mon,wed,fri
        #[arg(long)]
        days: Option<String>,

        /// Color tag
        #[arg(long)]
        color: Option<String>,

        /// Category
        #[arg(long)]
        category: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a habit
    Rm {
        /// Habit id or unique prefix
        id: String,
    },

    /// Send queued changes and fetch the server's habits
    Sync,

    /// Forget all local habits and queued changes
    Reset,

    /// Show configuration, queue and last sync
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;
    config::set_dir_permissions_0700(&data_dir)
        .await
        .context("Failed to set data directory permissions")?;

    match cli.command {
        Commands::Init {
            base_url,
            timeout,
            force,
        } => init::run(&data_dir, &base_url, timeout, force),
        Commands::Habits(command) => run(command, data_dir, cli.offline).await,
    }
}

/// Wire the habit service together and run one command against it.
async fn run(command: HabitCommand, data_dir: PathBuf, offline: bool) -> Result<()> {
    let config = CliConfig::load(&data_dir).context("Failed to load configuration")?;
    let remote = HttpRemote::new(&config.server).context("Invalid server configuration")?;
    let store = FileStore::open(data_dir.clone()).context("Failed to open habit storage")?;
    let monitor = ConnectivityMonitor::new(!offline);
    let sync = HabitSync::new(remote, store, Arc::new(SystemClock), monitor.subscribe());
    sync.load();

    match command {
        HabitCommand::List { today } => list::run(&sync, today).await?,
        HabitCommand::Add {
            name,
            need,
            days,
            color,
            category,
            description,
            notify,
        } => {
            let new = NewHabit {
                name,
                need,
                days,
                color,
                category,
                description,
                notify,
            };
            add::run(&sync, new).await?;
        }
        HabitCommand::Done { id } => {
            toggle::run(&sync, &id, CompletionDelta::Increment).await?;
        }
        HabitCommand::Undo { id } => {
            toggle::run(&sync, &id, CompletionDelta::Decrement).await?;
        }
        HabitCommand::Edit {
            id,
            name,
            need,
            days,
            color,
            category,
            description,
        } => {
            let changes = HabitEdit {
                name,
                need,
                days,
                color,
                category,
                description,
            };
            edit::run(&sync, &id, changes).await?;
        }
        HabitCommand::Rm { id } => remove::run(&sync, &id).await?,
        HabitCommand::Sync => {
            sync::run(&sync).await?;
        }
        HabitCommand::Reset => reset::run(&sync).await?,
        HabitCommand::Status => status::run(&sync, &config, &data_dir)?,
    }

    Ok(())
}

/// Get the default data directory for habits.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "habit-sync", "habits")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
