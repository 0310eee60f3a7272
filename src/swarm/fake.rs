// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Scripted in-memory stand-in for the swarm daemon, used by scheduler tests.
//!
//! Sessions advance their active-time by a fixed tick on every status poll,
//! which makes timeout and aging behavior deterministic per poll count.

use crate::infohash::InfoHash;
use crate::swarm::{SessionStatus, SubmitOptions, SwarmClient, SwarmError, SwarmSession};

use async_trait::async_trait;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct SessionScript {
    /// Metadata becomes available once active-time reaches this point.
    pub metadata_after: Option<Duration>,
    pub descriptor: Option<Vec<u8>>,
    pub trackers: Vec<String>,
    /// Active-time advance applied per status poll while unpaused.
    pub tick: Duration,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub script: SessionScript,
    pub active_time: Duration,
    pub paused: bool,
    pub removed: bool,
    pub pause_count: u32,
    pub resume_count: u32,
}

pub type SharedState = Arc<Mutex<SessionState>>;

#[derive(Debug, Default)]
pub struct Gauge {
    pub live: usize,
    pub max_live: usize,
}

pub struct FakeSwarm {
    scripts: HashMap<InfoHash, SessionScript>,
    pub submitted: Vec<InfoHash>,
    pub states: HashMap<InfoHash, SharedState>,
    gauge: Arc<Mutex<Gauge>>,
}

impl FakeSwarm {
    pub fn new() -> Self {
        FakeSwarm {
            scripts: HashMap::new(),
            submitted: Vec::new(),
            states: HashMap::new(),
            gauge: Arc::new(Mutex::new(Gauge::default())),
        }
    }

    pub fn script(&mut self, infohash: InfoHash, script: SessionScript) {
        self.scripts.insert(infohash, script);
    }

    pub fn state(&self, infohash: &InfoHash) -> SharedState {
        self.states[infohash].clone()
    }

    pub fn max_live(&self) -> usize {
        self.gauge.lock().unwrap().max_live
    }
}

#[async_trait]
impl SwarmClient for FakeSwarm {
    async fn submit(
        &mut self,
        infohash: &InfoHash,
        _trackers: &[String],
        _opts: &SubmitOptions,
    ) -> Result<Box<dyn SwarmSession>, SwarmError> {
        let script = self.scripts.get(infohash).cloned().unwrap_or_default();
        let state = Arc::new(Mutex::new(SessionState {
            script,
            ..SessionState::default()
        }));

        self.submitted.push(*infohash);
        self.states.insert(*infohash, state.clone());

        let mut gauge = self.gauge.lock().unwrap();
        gauge.live += 1;
        gauge.max_live = gauge.max_live.max(gauge.live);

        Ok(Box::new(FakeSession {
            state,
            gauge: self.gauge.clone(),
        }))
    }
}

pub struct FakeSession {
    state: SharedState,
    gauge: Arc<Mutex<Gauge>>,
}

#[async_trait]
impl SwarmSession for FakeSession {
    async fn status(&self) -> Result<SessionStatus, SwarmError> {
        let mut state = self.state.lock().unwrap();
        if !state.paused {
            let tick = state.script.tick;
            state.active_time += tick;
        }

        Ok(SessionStatus {
            has_metadata: state
                .script
                .metadata_after
                .is_some_and(|after| state.active_time >= after),
            active_time: state.active_time,
            name: state.script.name.clone(),
            peer_count: 0,
            seed_count: 0,
            last_seen_complete: None,
        })
    }

    async fn pause(&mut self) -> Result<(), SwarmError> {
        let mut state = self.state.lock().unwrap();
        state.paused = true;
        state.pause_count += 1;
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), SwarmError> {
        let mut state = self.state.lock().unwrap();
        state.paused = false;
        state.resume_count += 1;
        Ok(())
    }

    async fn remove(self: Box<Self>) -> Result<(), SwarmError> {
        self.state.lock().unwrap().removed = true;
        self.gauge.lock().unwrap().live -= 1;
        Ok(())
    }

    async fn export_descriptor(&self) -> Result<Vec<u8>, SwarmError> {
        self.state
            .lock()
            .unwrap()
            .script
            .descriptor
            .clone()
            .ok_or(SwarmError::DescriptorUnavailable)
    }

    async fn current_trackers(&self) -> Result<Vec<String>, SwarmError> {
        Ok(self.state.lock().unwrap().script.trackers.clone())
    }
}
