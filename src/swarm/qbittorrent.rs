// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Adapter driving a qBittorrent daemon over its WebUI API.
//!
//! The daemon owns every swarm-facing concern (peer discovery, piece
//! verification, NAT traversal); this adapter only maps lookup sessions onto
//! daemon torrents and polls their state.

use crate::infohash::InfoHash;
use crate::swarm::{SessionStatus, SubmitOptions, SwarmClient, SwarmError, SwarmSession};

use async_trait::async_trait;

use serde::Deserialize;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize, Default)]
struct TorrentInfo {
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    num_seeds: i64,
    #[serde(default)]
    num_leechs: i64,
    #[serde(default)]
    time_active: i64,
    #[serde(default)]
    seen_complete: i64,
    #[serde(default)]
    total_size: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct TrackerEntry {
    url: String,
}

pub struct QbClient {
    http: reqwest::Client,
    base: String,
}

impl QbClient {
    /// Logs into the daemon's WebUI; the session cookie is kept in the
    /// client's cookie store.
    pub async fn connect(base_url: &str, username: &str, password: &str) -> Result<Self, SwarmError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(HTTP_TIMEOUT)
            .build()?;
        let base = base_url.trim_end_matches('/').to_string();

        let response = http
            .post(format!("{}/api/v2/auth/login", base))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let body = response.text().await?;
        if body.trim() != "Ok." {
            return Err(SwarmError::AuthRejected(username.to_string()));
        }

        Ok(QbClient { http, base })
    }
}

#[async_trait]
impl SwarmClient for QbClient {
    async fn submit(
        &mut self,
        infohash: &InfoHash,
        trackers: &[String],
        opts: &SubmitOptions,
    ) -> Result<Box<dyn SwarmSession>, SwarmError> {
        let magnet = build_magnet(infohash, trackers);
        let save_path = opts.save_path.to_string_lossy().to_string();

        let mut form = vec![
            ("urls".to_string(), magnet),
            ("savepath".to_string(), save_path),
            ("paused".to_string(), "false".to_string()),
        ];
        if opts.metadata_only {
            form.push(("stopCondition".to_string(), "MetadataReceived".to_string()));
        }

        let response = self
            .http
            .post(format!("{}/api/v2/torrents/add", self.base))
            .form(&form)
            .send()
            .await?;
        let body = response.text().await?;
        if body.trim() != "Ok." {
            return Err(SwarmError::SubmitRejected(body.trim().to_string()));
        }

        debug!("submitted lookup for {}", infohash);
        Ok(Box::new(QbSession {
            http: self.http.clone(),
            base: self.base.clone(),
            infohash: *infohash,
        }))
    }
}

pub struct QbSession {
    http: reqwest::Client,
    base: String,
    infohash: InfoHash,
}

impl QbSession {
    async fn post_hashes(&self, endpoint: &str) -> Result<(), SwarmError> {
        self.http
            .post(format!("{}/api/v2/torrents/{}", self.base, endpoint))
            .form(&[("hashes", self.infohash.to_hex())])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl SwarmSession for QbSession {
    async fn status(&self) -> Result<SessionStatus, SwarmError> {
        let infos: Vec<TorrentInfo> = self
            .http
            .get(format!("{}/api/v2/torrents/info", self.base))
            .query(&[("hashes", self.infohash.to_hex())])
            .send()
            .await?
            .json()
            .await?;

        match infos.first() {
            Some(info) => Ok(status_from_info(info)),
            None => Err(SwarmError::SessionVanished(self.infohash)),
        }
    }

    async fn pause(&mut self) -> Result<(), SwarmError> {
        self.post_hashes("pause").await
    }

    async fn resume(&mut self) -> Result<(), SwarmError> {
        self.post_hashes("resume").await
    }

    async fn remove(self: Box<Self>) -> Result<(), SwarmError> {
        self.http
            .post(format!("{}/api/v2/torrents/delete", self.base))
            .form(&[
                ("hashes", self.infohash.to_hex()),
                ("deleteFiles", "true".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn export_descriptor(&self) -> Result<Vec<u8>, SwarmError> {
        let response = self
            .http
            .get(format!("{}/api/v2/torrents/export", self.base))
            .query(&[("hash", self.infohash.to_hex())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SwarmError::DescriptorUnavailable);
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn current_trackers(&self) -> Result<Vec<String>, SwarmError> {
        let entries: Vec<TrackerEntry> = self
            .http
            .get(format!("{}/api/v2/torrents/trackers", self.base))
            .query(&[("hash", self.infohash.to_hex())])
            .send()
            .await?
            .json()
            .await?;

        // The daemon lists DHT/PEX/LSD as pseudo-trackers wrapped in "**".
        Ok(entries
            .into_iter()
            .map(|e| e.url)
            .filter(|url| !url.starts_with("**"))
            .collect())
    }
}

fn build_magnet(infohash: &InfoHash, trackers: &[String]) -> String {
    let mut magnet = format!("magnet:?xt=urn:btih:{}", infohash.to_hex());
    for tracker in trackers {
        magnet.push_str("&tr=");
        magnet.push_str(&urlencoding::encode(tracker));
    }
    magnet
}

fn status_from_info(info: &TorrentInfo) -> SessionStatus {
    // While the daemon is still fetching metadata the state is "metaDL" and
    // the size is unknown.
    let has_metadata = info.state != "metaDL" && info.total_size > 0;
    let last_seen_complete = if info.seen_complete > 0 {
        Some(UNIX_EPOCH + Duration::from_secs(info.seen_complete as u64))
    } else {
        None
    };

    SessionStatus {
        has_metadata,
        active_time: Duration::from_secs(info.time_active.max(0) as u64),
        name: info.name.clone(),
        peer_count: info.num_leechs.max(0) as u64,
        seed_count: info.num_seeds.max(0) as u64,
        last_seen_complete,
    }
}
