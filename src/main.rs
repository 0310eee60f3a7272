// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

mod cli;
mod config;
mod descriptor;
mod errors;
mod infohash;
mod resolver;
mod store;
mod swarm;
mod trackers;

use crate::cli::{Cli, Commands};
use crate::config::{load_settings, Settings};
use crate::infohash::InfoHash;
use crate::resolver::{Counters, ResolverContext};
use crate::store::Store;
use crate::swarm::qbittorrent::QbClient;

use fs2::FileExt;
use std::env;
use std::fs;
use std::fs::File;
use std::path::PathBuf;

use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;

use tracing_subscriber::filter::Targets;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

use clap::Parser;

const DEFAULT_LOG_FILTER: LevelFilter = LevelFilter::INFO;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_data_dir = config::get_app_paths()
        .map(|(_, data_dir)| data_dir)
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let log_dir = base_data_dir.join("logs");
    let general_log = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(31)
        .filename_prefix("app")
        .filename_suffix("log")
        .build(&log_dir)
        .expect("Failed to initialize rolling file appender");
    let (non_blocking_general, _guard_general) = tracing_appender::non_blocking(general_log);
    let _subscriber_result = {
        if fs::create_dir_all(&log_dir).is_ok() {
            let quiet_filter = Targets::new().with_default(DEFAULT_LOG_FILTER);

            let general_layer = fmt::layer()
                .with_writer(non_blocking_general)
                .with_ansi(false)
                .with_filter(quiet_filter);

            tracing_subscriber::registry()
                .with(general_layer)
                .try_init()
        } else {
            tracing_subscriber::registry().try_init()
        }
    };

    tracing::info!("STARTING METARESOLVR");

    let args = Cli::parse();
    let mut settings = load_settings();
    cli::apply_overrides(&mut settings, &args);

    // One-shot store commands run without the instance lock; SQLite
    // serializes them against a running resolver.
    if let Some(command) = &args.command {
        return run_command(command, &settings);
    }

    let mut proceed_to_resolver = true;
    let mut _lock_file_handle: Option<File> = None;

    if let Some(lock_path) = get_lock_path() {
        if let Ok(file) = File::create(&lock_path) {
            if file.try_lock_exclusive().is_ok() {
                _lock_file_handle = Some(file);
            } else {
                proceed_to_resolver = false;
            }
        }
    }
    if !proceed_to_resolver {
        println!("metaresolvr is already running.");
        return Ok(());
    }

    // Without a backlog there is nothing to schedule; a store that cannot
    // be opened ends the process here with a non-zero status.
    let store = Store::open(&settings.resolve_db_path())?;
    let mut swarm = QbClient::connect(
        &settings.swarm_url,
        &settings.swarm_username,
        &settings.swarm_password,
    )
    .await?;

    let generation_pause = settings.generation_pause();
    let mut ctx = ResolverContext::new(settings, store)?;
    let mut totals = Counters::default();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                break;
            }
            result = resolver::run_generation(&mut ctx, &mut swarm) => {
                match result {
                    Ok(report) => {
                        totals.absorb(report.counters);
                        tracing::info!(
                            "generation complete; lifetime: new {}, old {}, resolved {}, offloaded {}",
                            totals.new, totals.old, totals.resolved, totals.offloaded
                        );
                    }
                    Err(e) if e.is_fatal() => {
                        tracing::error!("aborting: {}", e);
                        return Err(e.into());
                    }
                    Err(e) => {
                        tracing::error!("generation failed: {}; retrying after pause", e);
                    }
                }
            }
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                break;
            }
            _ = tokio::time::sleep(generation_pause) => {}
        }
    }

    Ok(())
}

fn run_command(command: &Commands, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = Store::open(&settings.resolve_db_path())?;

    match command {
        Commands::Add { infohash } => {
            let hash: InfoHash = infohash.parse()?;
            if store.add_new_hash(&hash)? {
                println!("queued {}", hash);
            } else {
                println!("{} is already queued", hash);
            }
        }
        Commands::ImportTrackers { file } => {
            let content = fs::read_to_string(file)?;
            let urls: Vec<String> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect();
            let added = store.import_trackers(&urls)?;
            println!("imported {} new trackers ({} in file)", added, urls.len());
        }
        Commands::Stats => {
            println!("new hashes:      {}", store.count_new()?);
            println!("aged hashes:     {}", store.count_aged()?);
            println!("resolved:        {}", store.count_resolved()?);
            println!("known trackers:  {}", store.count_trackers()?);
        }
    }

    Ok(())
}

fn get_lock_path() -> Option<PathBuf> {
    let base_data_dir = config::get_app_paths()
        .map(|(_, data_dir)| data_dir)
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    Some(base_data_dir.join("metaresolvr.lock"))
}
