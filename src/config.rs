// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use figment::providers::{Env, Format};
use figment::{providers::Toml, Figment};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Settings {
    /// SQLite database holding the backlog and tracker statistics.
    /// Defaults to the app data directory when unset.
    pub db_path: Option<PathBuf>,

    /// Where resolved .torrent files are written; None means don't save.
    pub torrents_dir: Option<PathBuf>,

    // Scheduling
    pub pool_capacity: usize,
    pub timeout_secs: u64,
    pub aged_secs: u64,
    pub spawn_interval_ms: u64,
    pub poll_interval_secs: u64,
    pub generation_pause_secs: u64,

    // Backlog intake per generation
    pub max_new: usize,
    pub max_old: usize,

    // Swarm daemon
    pub swarm_url: String,
    pub swarm_username: String,
    pub swarm_password: String,
    pub tracker_sample_size: usize,
    pub max_peer_connections: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: None,
            torrents_dir: None,
            pool_capacity: 200,
            timeout_secs: 50,
            aged_secs: 80,
            spawn_interval_ms: 100,
            poll_interval_secs: 10,
            generation_pause_secs: 30,
            max_new: 1000,
            max_old: 100,
            swarm_url: "http://127.0.0.1:8080".to_string(),
            swarm_username: "admin".to_string(),
            swarm_password: String::new(),
            tracker_sample_size: 3,
            max_peer_connections: 2,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn aged(&self) -> Duration {
        Duration::from_secs(self.aged_secs)
    }

    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn generation_pause(&self) -> Duration {
        Duration::from_secs(self.generation_pause_secs)
    }

    pub fn resolve_db_path(&self) -> PathBuf {
        if let Some(path) = &self.db_path {
            return path.clone();
        }
        get_app_paths()
            .map(|(_, data_dir)| data_dir.join("metaresolvr.db"))
            .unwrap_or_else(|| PathBuf::from("metaresolvr.db"))
    }
}

/// Single source of truth for the app's config and data directories.
pub fn get_app_paths() -> Option<(PathBuf, PathBuf)> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "github", "metaresolvr") {
        let config_dir = proj_dirs.config_dir().to_path_buf();
        let data_dir = proj_dirs.data_local_dir().to_path_buf();

        fs::create_dir_all(&config_dir).ok()?;
        fs::create_dir_all(&data_dir).ok()?;

        Some((config_dir, data_dir))
    } else {
        None
    }
}

pub fn load_settings() -> Settings {
    if let Some((config_dir, _)) = get_app_paths() {
        let config_file_path = config_dir.join("settings.toml");

        return Figment::new()
            .merge(Toml::file(config_file_path))
            .merge(Env::prefixed("METARESOLVR_"))
            .extract()
            .unwrap_or_default();
    }

    // Fallback if we can't even determine the application paths.
    Settings::default()
}

/// Saves the provided settings to the config file.
pub fn save_settings(settings: &Settings) -> io::Result<()> {
    if let Some((config_dir, _)) = get_app_paths() {
        let config_file_path = config_dir.join("settings.toml");
        let temp_file_path = config_dir.join("settings.toml.tmp");
        let content = toml::to_string_pretty(settings).map_err(io::Error::other)?;
        fs::write(&temp_file_path, content)?;
        fs::rename(&temp_file_path, &config_file_path)?;
    }
    Ok(())
}
