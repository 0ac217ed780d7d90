//! weekdo - Weekly to-do board library
//!
//! This library provides the core functionality for the weekdo CLI: a local
//! task manager whose tasks are grouped by category and user, planned on
//! weekdays and cleared every Sunday night.
//!
//! # Core Concepts
//!
//! - **Local Store**: versioned JSON collections with additive upgrades that
//!   degrade to an in-memory no-op store when the disk is unusable
//! - **Registries**: cached task, category and user lists republished over
//!   `tokio::sync::watch` after every change
//! - **Deadlines**: three stored shapes normalized into one interval
//! - **Weekly reset**: a persisted Sunday 23:59 checkpoint that clears the
//!   board once a week
//!
//! # Module Organization
//!
//! - `app`: Facade wiring the store and registries together
//! - `category`: Category registry with default seeding
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `weekdo.toml`
//! - `deadline`: Deadline shapes, normalization, formatting, validation
//! - `edit`: Title edit state machine
//! - `error`: Error types and result aliases
//! - `filter`: Category and assignee filters
//! - `flags`: Small key/value flags (display name, reset checkpoint)
//! - `lock`: File locking and atomic writes
//! - `output`: Human and JSON output envelopes
//! - `reset`: Weekly reset checkpoint and sweep
//! - `schema`: Store schema versions and upgrades
//! - `score`: Weekly score per weekday
//! - `storage`: The local store
//! - `task`: Task records and the task board
//! - `user`: User registry

pub mod app;
pub mod category;
pub mod cli;
pub mod config;
pub mod deadline;
pub mod edit;
pub mod error;
pub mod filter;
pub mod flags;
pub mod lock;
pub mod output;
pub mod reset;
pub mod schema;
pub mod score;
pub mod storage;
pub mod task;
pub mod user;

pub use error::{Error, Result};
