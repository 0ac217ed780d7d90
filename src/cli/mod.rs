//! Command-line interface for weekdo
//!
//! This module defines the CLI structure using clap derive macros.
//! Command groups are implemented in their own submodules.

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::app::App;
use crate::config::Config;
use crate::deadline::Weekday;
use crate::error::{Error, Result};
use crate::output::OutputOptions;

mod category;
mod schedule;
mod task;
mod user;

/// weekdo - a weekly to-do board
///
/// Tasks grouped by category and user, scheduled on weekdays, cleared every
/// Sunday night.
#[derive(Parser, Debug)]
#[command(name = "weekdo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding the local store
    #[arg(long, global = true, env = "WEEKDO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (defaults to weekdo.toml in the data directory)
    #[arg(long, global = true, env = "WEEKDO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Task board
    #[command(subcommand)]
    Task(TaskCommands),

    /// Category list management
    #[command(subcommand)]
    Category(CategoryCommands),

    /// User management
    #[command(subcommand)]
    User(UserCommands),

    /// Completed tasks per weekday
    Score,

    /// Weekly reset (every task is deleted on Sunday 23:59)
    #[command(subcommand)]
    Reset(ResetCommands),

    /// Show or set the display name
    Name {
        /// New display name
        name: Option<String>,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Category for the task
        #[arg(short, long)]
        category: Option<String>,

        /// Assignee user id
        #[arg(short, long)]
        user: Option<u64>,

        /// Weekday the task is planned for (monday..sunday or mon..sun)
        #[arg(short, long)]
        weekday: Option<Weekday>,

        /// Time of day (HH:MM)
        #[arg(short, long)]
        time: Option<String>,
    },

    /// List tasks
    List {
        /// Only tasks tagged with this category ("All" shows everything)
        #[arg(short, long, conflicts_with = "other")]
        category: Option<String>,

        /// Only tasks carrying a non-default category
        #[arg(long)]
        other: bool,

        /// Only tasks assigned to this user id
        #[arg(short, long)]
        user: Option<u64>,
    },

    /// Toggle a task between open and done
    Done {
        id: u64,
    },

    /// Change a task title
    Rename {
        id: u64,
        title: String,
    },

    /// Delete a task
    Rm {
        id: u64,
    },

    /// Move a task to another list position (1-based, as shown by `task list`)
    Move {
        from: usize,
        to: usize,
    },

    /// Replace a task's categories
    Tag {
        id: u64,

        #[arg(required = true)]
        categories: Vec<String>,
    },

    /// Assign a task to a user, or clear the assignee
    Assign {
        id: u64,

        /// User id (omit to unassign)
        #[arg(short, long)]
        user: Option<u64>,
    },

    /// Set or clear a task deadline
    ///
    /// Fields left out keep the value of the current deadline.
    Deadline {
        id: u64,

        /// Remove the deadline
        #[arg(
            long,
            conflicts_with_all = ["weekday", "start_date", "start_time", "end_date", "end_time"],
            required_unless_present_any = ["weekday", "start_date", "start_time", "end_date", "end_time"]
        )]
        clear: bool,

        #[arg(long)]
        weekday: Option<Weekday>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// Start time (HH:MM)
        #[arg(long)]
        start_time: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// End time (HH:MM)
        #[arg(long)]
        end_time: Option<String>,
    },
}

/// Category subcommands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories in display order
    List,

    /// Add a category
    Add { name: String },

    /// Remove a category (tasks keep their tags)
    Rm { name: String },

    /// Replace the category order
    Reorder {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

/// User subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List users
    List,

    /// Add a user
    Add { name: String },

    /// Remove a user by id
    Rm { id: u64 },
}

/// Weekly reset subcommands
#[derive(Subcommand, Debug)]
pub enum ResetCommands {
    /// Run one reset check now
    Check,

    /// Keep checking until interrupted
    Watch {
        /// Seconds between checks (overrides reset.check_interval_secs)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.execute())
    }

    async fn execute(self) -> Result<()> {
        let (data_dir, config) = resolve_data_dir(self.data_dir, self.config.as_deref())?;
        let app = App::open(&data_dir, config).await?;
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };

        if !matches!(self.command, Commands::Reset(_)) && app.config().reset.enabled {
            if let Err(err) = app.weekly_reset().check(app.tasks(), Local::now()).await {
                warn!(error = %err, "weekly reset check failed");
            }
        }

        match self.command {
            Commands::Task(cmd) => task::run(&app, cmd, output).await,
            Commands::Category(cmd) => category::run(&app, cmd, output).await,
            Commands::User(cmd) => user::run(&app, cmd, output).await,
            Commands::Score => schedule::run_score(&app, output),
            Commands::Reset(cmd) => schedule::run_reset(&app, cmd, output).await,
            Commands::Name { name } => schedule::run_name(&app, name, output),
        }
    }
}

/// Pick the data directory and configuration.
///
/// Precedence for the directory: `--data-dir` / `WEEKDO_DATA_DIR`, then
/// `data_dir` from the config file, then the platform data directory.
fn resolve_data_dir(flag: Option<PathBuf>, config_path: Option<&Path>) -> Result<(PathBuf, Config)> {
    let fallback = default_data_dir();
    let config = match (config_path, flag.as_deref().or(fallback.as_deref())) {
        (Some(path), _) => Config::load(path)?,
        (None, Some(dir)) => Config::load_from_dir(dir)?,
        (None, None) => Config::default(),
    };

    let data_dir = flag
        .or_else(|| config.data_dir.clone())
        .or(fallback)
        .ok_or_else(|| {
            Error::InvalidArgument(
                "cannot determine a data directory; pass --data-dir".to_string(),
            )
        })?;
    Ok((data_dir, config))
}

fn default_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "weekdo").map(|dirs| dirs.data_dir().to_path_buf())
}
