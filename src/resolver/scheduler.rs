// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! The admission and lifecycle loop.
//!
//! One scheduler instance drives one generation: it keeps the active pool
//! topped up from the pending queue and the sleeping waitlist, polls every
//! active lookup once per cycle, and routes terminal outcomes back into the
//! store and the tracker catalog. All swarm sessions run concurrently on the
//! daemon side; this loop only ever waits on its own pacing sleeps.

use crate::descriptor::parser;
use crate::errors::ResolverError;
use crate::infohash::InfoHash;
use crate::resolver::job::Job;
use crate::resolver::{GenerationReport, ResolverContext};
use crate::store::{IdentifierRecord, ResolvedSummary};
use crate::swarm::{SessionStatus, SubmitOptions, SwarmClient};

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::sleep;

use tracing::{debug, info, warn};

pub struct Scheduler<'a> {
    ctx: &'a mut ResolverContext,
    swarm: &'a mut dyn SwarmClient,

    /// Identifiers not yet spawned, new partition first, both FIFO.
    pending: VecDeque<IdentifierRecord>,
    active: Vec<Job>,
    /// Timed-out lookups parked for a later wake, oldest first.
    sleeping: VecDeque<Job>,

    pool_capacity: usize,
    timeout: Duration,
    aged: Duration,
    spawn_interval: Duration,
    poll_interval: Duration,
    sample_size: usize,
    submit_opts: SubmitOptions,
    torrents_dir: Option<PathBuf>,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        ctx: &'a mut ResolverContext,
        swarm: &'a mut dyn SwarmClient,
        pending: VecDeque<IdentifierRecord>,
    ) -> Self {
        let settings = &ctx.settings;
        // A zero-capacity pool could never drain the backlog.
        let pool_capacity = settings.pool_capacity.max(1);
        let submit_opts = SubmitOptions {
            metadata_only: true,
            max_peer_connections: settings.max_peer_connections,
            save_path: ctx.scratch_path().to_path_buf(),
        };

        Scheduler {
            pool_capacity,
            timeout: settings.timeout(),
            aged: settings.aged(),
            spawn_interval: settings.spawn_interval(),
            poll_interval: settings.poll_interval(),
            sample_size: settings.tracker_sample_size,
            torrents_dir: settings.torrents_dir.clone(),
            submit_opts,
            ctx,
            swarm,
            pending,
            active: Vec::new(),
            sleeping: VecDeque::new(),
        }
    }

    pub async fn run(mut self) -> Result<GenerationReport, ResolverError> {
        while !self.pending.is_empty() || !self.active.is_empty() || !self.sleeping.is_empty() {
            self.fill_pool().await?;
            sleep(self.poll_interval).await;
            self.poll_cycle().await?;
            self.log_cycle();
        }

        info!("no more lookups in this generation");
        Ok(GenerationReport {
            counters: self.ctx.counters,
        })
    }

    /// Tops the active pool back up, preferring fresh spawns over wakes.
    /// Admission is paced to avoid bursting session creation at the daemon.
    async fn fill_pool(&mut self) -> Result<(), ResolverError> {
        while self.active.len() < self.pool_capacity
            && (!self.pending.is_empty() || !self.sleeping.is_empty())
        {
            if !self.pending.is_empty() {
                if !self.spawn_next().await? {
                    break;
                }
            } else {
                self.wake_next().await;
            }
            sleep(self.spawn_interval).await;
        }
        Ok(())
    }

    /// Returns false when the daemon refused the submission; the record goes
    /// back to the head of the queue and admission stops for this cycle.
    async fn spawn_next(&mut self) -> Result<bool, ResolverError> {
        let Some(record) = self.pending.pop_front() else {
            return Ok(true);
        };

        let trackers = self.ctx.catalog.sample(self.sample_size);
        match self
            .swarm
            .submit(&record.infohash, &trackers, &self.submit_opts)
            .await
        {
            Ok(handle) => {
                self.active.push(Job::new(&record, handle));
                debug!(
                    "spawned lookup {} ({} pending, {} active, {} sleeping)",
                    record.infohash,
                    self.pending.len(),
                    self.active.len(),
                    self.sleeping.len()
                );
                Ok(true)
            }
            Err(e) => {
                warn!(
                    "swarm daemon refused lookup {}: {}; retrying next cycle",
                    record.infohash, e
                );
                self.pending.push_front(record);
                Ok(false)
            }
        }
    }

    async fn wake_next(&mut self) {
        let Some(mut job) = self.sleeping.pop_front() else {
            return;
        };
        if let Err(e) = job.wake().await {
            // Leave the stale baseline in place; the lookup will fall back
            // asleep on its next poll and the resume gets retried.
            warn!("waking lookup {} failed: {}", job.infohash, e);
        }
        self.active.push(job);
    }

    /// Polls a stable snapshot of the active pool, applying at most one
    /// transition per lookup. Predicate order matters: a finished lookup
    /// must never be discarded as timed out or aged.
    async fn poll_cycle(&mut self) -> Result<(), ResolverError> {
        let jobs = std::mem::take(&mut self.active);
        for mut job in jobs {
            let status = match job.handle.status().await {
                Ok(status) => status,
                Err(e) => {
                    warn!("status poll for {} failed: {}", job.infohash, e);
                    self.active.push(job);
                    continue;
                }
            };

            if job.is_complete(&status) {
                match self.reap_completed(&mut job, &status).await {
                    Ok(()) => {
                        self.ctx.counters.resolved += 1;
                        if let Err(e) = job.release().await {
                            warn!("releasing resolved lookup failed: {}", e);
                        }
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(
                            "reaping resolved lookup {} failed: {}; retrying next cycle",
                            job.infohash, e
                        );
                        self.active.push(job);
                    }
                }
            } else if job.is_timed_out(&status, self.timeout) {
                if let Err(e) = job.go_to_sleep().await {
                    warn!("pausing lookup {} failed: {}", job.infohash, e);
                }
                self.sleeping.push_back(job);
            } else if job.is_aged(&status, self.aged) {
                match self.offload_aged(&job, &status).await {
                    Ok(()) => {
                        self.ctx.counters.offloaded += 1;
                        if let Err(e) = job.release().await {
                            warn!("releasing aged lookup failed: {}", e);
                        }
                    }
                    Err(e) => {
                        warn!(
                            "offloading lookup {} failed: {}; retrying next cycle",
                            job.infohash, e
                        );
                        self.active.push(job);
                    }
                }
            } else {
                self.active.push(job);
            }
        }
        Ok(())
    }

    /// Extracts and verifies the resolved descriptor, persists it, and
    /// clears the backlog record. Tracker bookkeeping happens last so a
    /// store failure retried next cycle cannot double-count an endpoint.
    async fn reap_completed(
        &mut self,
        job: &mut Job,
        status: &SessionStatus,
    ) -> Result<(), ResolverError> {
        let raw = job.handle.export_descriptor().await?;
        let descriptor = parser::from_bytes(&raw).map_err(|source| ResolverError::BadDescriptor {
            submitted: job.infohash,
            source,
        })?;

        let derived = descriptor.info_hash();
        if derived != job.infohash {
            return Err(ResolverError::InfoHashMismatch {
                submitted: job.infohash,
                derived,
            });
        }

        let files = descriptor
            .file_list()
            .into_iter()
            .map(|(path, size)| (path.join("/"), size))
            .collect();
        self.ctx.store.insert_resolved(&ResolvedSummary {
            infohash: job.infohash,
            name: descriptor.name().to_string(),
            total_size: descriptor.info.total_length().max(0) as u64,
            files,
        })?;

        if let Some(dir) = &self.torrents_dir {
            write_descriptor_file(dir, &job.infohash, &raw)?;
        }

        self.ctx.store.remove(&job.to_record())?;

        let urls = job.handle.current_trackers().await.unwrap_or_default();
        self.ctx.catalog.record_outcome(&urls, true);

        info!(
            "resolved {} ({:?}, {} files, {} peers / {} seeds seen)",
            job.infohash,
            descriptor.name(),
            descriptor.num_files(),
            status.peer_count,
            status.seed_count
        );
        Ok(())
    }

    /// Pushes a lookup that outlived the aging horizon back into durable
    /// storage, accumulating the active time this attempt burned.
    async fn offload_aged(&mut self, job: &Job, status: &SessionStatus) -> Result<(), ResolverError> {
        self.ctx.store.offload(&job.to_record(), status.active_time)?;

        let urls = job.handle.current_trackers().await.unwrap_or_default();
        self.ctx.catalog.record_outcome(&urls, false);

        info!(
            "offloaded {} after {}s active",
            job.infohash,
            status.active_time.as_secs()
        );
        Ok(())
    }

    fn log_cycle(&self) {
        let counters = &self.ctx.counters;
        info!(
            "new {}, old {}, resolved {}, offloaded {}; {} pending, {} active, {} sleeping",
            counters.new,
            counters.old,
            counters.resolved,
            counters.offloaded,
            self.pending.len(),
            self.active.len(),
            self.sleeping.len()
        );
    }
}

fn write_descriptor_file(dir: &Path, infohash: &InfoHash, raw: &[u8]) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let final_path = dir.join(format!("{}.torrent", infohash));
    let temp_path = dir.join(format!("{}.torrent.tmp", infohash));
    fs::write(&temp_path, raw)?;
    fs::rename(&temp_path, &final_path)?;
    Ok(())
}
