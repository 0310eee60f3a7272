// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::infohash::InfoHash;
use crate::store::{IdentifierRecord, Partition};
use crate::swarm::{SessionStatus, SwarmError, SwarmSession};

use std::time::Duration;

use tracing::debug;

/// One in-flight resolution attempt: an identifier bound to an exclusively
/// owned swarm session handle.
///
/// `session_runtime` is the active-time baseline of the current run window;
/// it starts at zero and is rebased on every wake so the timeout predicate
/// only measures the window since the last resume.
pub struct Job {
    pub id: i64,
    pub infohash: InfoHash,
    pub handle: Box<dyn SwarmSession>,
    /// Active time accumulated by earlier generations' attempts.
    pub total_runtime: Duration,
    pub session_runtime: Duration,
}

impl Job {
    pub fn new(record: &IdentifierRecord, handle: Box<dyn SwarmSession>) -> Self {
        Job {
            id: record.id,
            infohash: record.infohash,
            handle,
            total_runtime: record.accumulated_runtime,
            session_runtime: Duration::ZERO,
        }
    }

    /// Which backlog partition this job's record lives in. Holds because a
    /// record accumulates runtime exactly when it ages out of the New
    /// partition.
    pub fn partition(&self) -> Partition {
        if self.total_runtime.is_zero() {
            Partition::New
        } else {
            Partition::Aged
        }
    }

    pub fn to_record(&self) -> IdentifierRecord {
        IdentifierRecord {
            id: self.id,
            infohash: self.infohash,
            accumulated_runtime: self.total_runtime,
            partition: self.partition(),
        }
    }

    pub fn is_complete(&self, status: &SessionStatus) -> bool {
        status.has_metadata
    }

    pub fn is_timed_out(&self, status: &SessionStatus, timeout: Duration) -> bool {
        status.active_time > self.session_runtime + timeout
    }

    pub fn is_aged(&self, status: &SessionStatus, aged: Duration) -> bool {
        status.active_time > aged
    }

    pub async fn go_to_sleep(&mut self) -> Result<(), SwarmError> {
        debug!("lookup {} going to sleep", self.infohash);
        self.handle.pause().await
    }

    /// Resumes the paused session and rebases the timeout window.
    pub async fn wake(&mut self) -> Result<(), SwarmError> {
        debug!("lookup {} waking up", self.infohash);
        self.handle.resume().await?;
        let status = self.handle.status().await?;
        self.session_runtime = status.active_time;
        Ok(())
    }

    /// Tears the session down on the swarm daemon. Mandatory before the job
    /// is discarded, or the daemon keeps the lookup alive forever.
    pub async fn release(self) -> Result<(), SwarmError> {
        self.handle.remove().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarm::fake::{FakeSwarm, SessionScript};
    use crate::swarm::{SubmitOptions, SwarmClient};

    use std::path::PathBuf;

    async fn job_with_tick(tick: Duration) -> Job {
        let infohash = InfoHash::from([5u8; 20]);
        let mut swarm = FakeSwarm::new();
        swarm.script(
            infohash,
            SessionScript {
                tick,
                ..SessionScript::default()
            },
        );
        let handle = swarm
            .submit(
                &infohash,
                &[],
                &SubmitOptions {
                    metadata_only: true,
                    max_peer_connections: 2,
                    save_path: PathBuf::from("/tmp"),
                },
            )
            .await
            .unwrap();

        let record = IdentifierRecord {
            id: 1,
            infohash,
            accumulated_runtime: Duration::ZERO,
            partition: Partition::New,
        };
        Job::new(&record, handle)
    }

    #[tokio::test]
    async fn test_timeout_measures_from_baseline() {
        let job = job_with_tick(Duration::ZERO).await;
        let timeout = Duration::from_secs(50);

        let mut status = SessionStatus {
            active_time: Duration::from_secs(50),
            ..SessionStatus::default()
        };
        assert!(!job.is_timed_out(&status, timeout));

        status.active_time = Duration::from_secs(51);
        assert!(job.is_timed_out(&status, timeout));
    }

    #[tokio::test]
    async fn test_wake_rebases_timeout_window() {
        let mut job = job_with_tick(Duration::from_secs(60)).await;
        let timeout = Duration::from_secs(50);

        // The wake's own status poll advances active time to 60 and makes
        // that the new baseline.
        job.wake().await.unwrap();
        assert_eq!(job.session_runtime, Duration::from_secs(60));

        let status = SessionStatus {
            active_time: Duration::from_secs(100),
            ..SessionStatus::default()
        };
        assert!(!job.is_timed_out(&status, timeout));
    }

    #[tokio::test]
    async fn test_aging_ignores_baseline() {
        let mut job = job_with_tick(Duration::from_secs(60)).await;
        job.wake().await.unwrap();

        let status = SessionStatus {
            active_time: Duration::from_secs(90),
            ..SessionStatus::default()
        };
        assert!(job.is_aged(&status, Duration::from_secs(80)));
        assert!(!job.is_aged(&status, Duration::from_secs(90)));
    }

    #[tokio::test]
    async fn test_partition_follows_accumulated_runtime() {
        let mut job = job_with_tick(Duration::ZERO).await;
        assert_eq!(job.partition(), Partition::New);

        job.total_runtime = Duration::from_secs(30);
        assert_eq!(job.partition(), Partition::Aged);
        assert_eq!(job.to_record().partition, Partition::Aged);
    }
}
