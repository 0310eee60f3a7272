// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod qbittorrent;

#[cfg(test)]
pub mod fake;

use crate::infohash::InfoHash;

use async_trait::async_trait;

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwarmError {
    #[error("swarm daemon request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("swarm daemon refused login for user '{0}'")]
    AuthRejected(String),
    #[error("swarm daemon rejected lookup submission: {0}")]
    SubmitRejected(String),
    #[error("lookup session for {0} is not known to the swarm daemon")]
    SessionVanished(InfoHash),
    #[error("metadata descriptor is not available yet")]
    DescriptorUnavailable,
}

/// Options applied when a lookup session is submitted to the swarm daemon.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Stop transferring payload data once the metadata has been fetched.
    pub metadata_only: bool,
    pub max_peer_connections: usize,
    pub save_path: PathBuf,
}

/// A point-in-time snapshot of one lookup session.
#[derive(Debug, Clone, Default)]
pub struct SessionStatus {
    pub has_metadata: bool,
    /// Wall-clock time this session has spent unpaused.
    pub active_time: Duration,
    pub name: String,
    pub peer_count: u64,
    pub seed_count: u64,
    pub last_seen_complete: Option<SystemTime>,
}

/// One in-flight metadata lookup owned by the swarm daemon.
///
/// Handles are exclusively owned; dropping one without calling `remove`
/// leaks the session on the daemon side.
#[async_trait]
pub trait SwarmSession {
    async fn status(&self) -> Result<SessionStatus, SwarmError>;

    async fn pause(&mut self) -> Result<(), SwarmError>;

    async fn resume(&mut self) -> Result<(), SwarmError>;

    /// Tears the session down on the daemon, discarding any payload data.
    async fn remove(self: Box<Self>) -> Result<(), SwarmError>;

    /// Exports the full bencoded metadata descriptor. Only meaningful once
    /// `status()` reports `has_metadata`.
    async fn export_descriptor(&self) -> Result<Vec<u8>, SwarmError>;

    /// The announce URLs this session is currently registered with.
    async fn current_trackers(&self) -> Result<Vec<String>, SwarmError>;
}

/// The capability of a swarm daemon to run many concurrent lookups.
#[async_trait]
pub trait SwarmClient {
    async fn submit(
        &mut self,
        infohash: &InfoHash,
        trackers: &[String],
        opts: &SubmitOptions,
    ) -> Result<Box<dyn SwarmSession>, SwarmError>;
}
