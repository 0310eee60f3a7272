// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::config::Settings;

use clap::{Parser, Subcommand};

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database path
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Directory to save resolved .torrent files to
    #[arg(short = 'd', long)]
    pub torrents_dir: Option<PathBuf>,

    /// Seconds before a single attempt is put to sleep
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seconds of active time before a lookup is offloaded back to the store
    #[arg(long)]
    pub aged: Option<u64>,

    /// Maximum concurrent lookups
    #[arg(long)]
    pub pool: Option<usize>,

    /// Minimum milliseconds between lookup spawns
    #[arg(long)]
    pub spawn_ms: Option<u64>,

    /// Maximum never-attempted identifiers loaded per generation
    #[arg(long)]
    pub max_new: Option<usize>,

    /// Maximum previously-attempted identifiers loaded per generation
    #[arg(long)]
    pub max_old: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Queue one info-hash (hex) for resolution
    Add { infohash: String },
    /// Seed the tracker table from a URL-per-line file
    ImportTrackers { file: PathBuf },
    /// Print backlog and tracker counts
    Stats,
}

/// Command-line flags win over the settings file and environment.
pub fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(db) = &cli.db {
        settings.db_path = Some(db.clone());
    }
    if let Some(dir) = &cli.torrents_dir {
        settings.torrents_dir = Some(dir.clone());
    }
    if let Some(timeout) = cli.timeout {
        settings.timeout_secs = timeout;
    }
    if let Some(aged) = cli.aged {
        settings.aged_secs = aged;
    }
    if let Some(pool) = cli.pool {
        settings.pool_capacity = pool;
    }
    if let Some(spawn_ms) = cli.spawn_ms {
        settings.spawn_interval_ms = spawn_ms;
    }
    if let Some(max_new) = cli.max_new {
        settings.max_new = max_new;
    }
    if let Some(max_old) = cli.max_old {
        settings.max_old = max_old;
    }
}
