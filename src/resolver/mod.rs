// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod counters;
pub mod job;
pub mod scheduler;

pub use counters::Counters;

use crate::config::Settings;
use crate::errors::ResolverError;
use crate::store::Store;
use crate::swarm::SwarmClient;
use crate::trackers::TrackerCatalog;

use scheduler::Scheduler;

use std::collections::VecDeque;
use std::path::Path;

use tempfile::TempDir;

use tracing::{info, warn};

/// Everything one scheduling generation needs, threaded explicitly through
/// the loop instead of living in globals.
pub struct ResolverContext {
    pub settings: Settings,
    pub store: Store,
    pub catalog: TrackerCatalog,
    pub counters: Counters,
    /// Scratch save-path handed to the swarm daemon; lookups run
    /// metadata-only, so nothing of substance lands here.
    scratch_dir: TempDir,
}

impl ResolverContext {
    pub fn new(settings: Settings, store: Store) -> Result<Self, ResolverError> {
        let scratch_dir = tempfile::tempdir()?;
        Ok(ResolverContext {
            settings,
            store,
            catalog: TrackerCatalog::default(),
            counters: Counters::default(),
            scratch_dir,
        })
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch_dir.path()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationReport {
    pub counters: Counters,
}

/// Runs one full generation: load the tracker catalog and both backlog
/// partitions, drain them through the scheduling loop, persist the tracker
/// statistics. The caller decides when to start the next generation.
pub async fn run_generation(
    ctx: &mut ResolverContext,
    swarm: &mut dyn SwarmClient,
) -> Result<GenerationReport, ResolverError> {
    ctx.counters = Counters::default();
    ctx.catalog.load(&ctx.store)?;
    if ctx.catalog.is_empty() {
        warn!("tracker catalog is empty; lookups depend on DHT peers alone");
    }

    let mut pending = VecDeque::new();

    let new_records = ctx.store.load_new(ctx.settings.max_new)?;
    ctx.counters.new = new_records.len() as u64;
    pending.extend(new_records);

    let aged_records = ctx.store.load_aged(ctx.settings.max_old)?;
    ctx.counters.old = aged_records.len() as u64;
    pending.extend(aged_records);

    info!(
        "generation start: {} new, {} previously attempted, {} trackers",
        ctx.counters.new,
        ctx.counters.old,
        ctx.catalog.len()
    );

    let report = Scheduler::new(ctx, swarm, pending).run().await?;

    ctx.catalog.persist(&mut ctx.store)?;
    Ok(report)
}
