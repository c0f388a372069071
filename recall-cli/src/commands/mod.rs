// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Commands

pub mod identity;
pub mod init;
pub mod probe;
pub mod profile;
pub mod sync;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use recall_core::{RecordSource, SyncEngine, SyncEvent, WebSocketTransport};
use tracing::debug;

use crate::config::CliConfig;

pub type Engine = SyncEngine<WebSocketTransport>;

/// Pause between polls while the relay is unreachable.
const OFFLINE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Opens the engine without activating an identity.
pub fn open_engine(config: &CliConfig) -> Engine {
    SyncEngine::open(&config.sync_config(), WebSocketTransport::new())
}

/// Opens the engine and activates the remembered phrase.
pub fn open_active_engine(config: &CliConfig) -> Result<Engine> {
    if !config.is_initialized() {
        bail!("Recall not initialized. Run 'recall init <phrase>' first.");
    }
    let mut engine = open_engine(config);
    debug!("Opened tiers under {}", config.data_dir.display());
    if !engine.activate_remembered()? {
        bail!("No phrase remembered. Run 'recall init <phrase>' first.");
    }
    Ok(engine)
}

/// Collects record changes reported by the engine.
#[derive(Clone, Default)]
pub struct ChangeLog {
    sources: Arc<Mutex<Vec<RecordSource>>>,
}

impl ChangeLog {
    pub fn attach(engine: &mut Engine) -> Self {
        let log = ChangeLog::default();
        let sources = Arc::clone(&log.sources);
        engine.on_event(move |event| {
            if let SyncEvent::RecordChanged { source, .. } = event {
                if let Ok(mut sources) = sources.lock() {
                    sources.push(source);
                }
            }
        });
        log
    }

    pub fn from_relay(&self) -> bool {
        self.sources
            .lock()
            .map(|s| s.contains(&RecordSource::Relay))
            .unwrap_or(false)
    }
}

/// Polls the engine until `done` holds or `wait` elapses.
///
/// Returns true if `done` held before the deadline.
pub fn drive<F>(engine: &mut Engine, wait: Duration, mut done: F) -> bool
where
    F: FnMut(&Engine) -> bool,
{
    let deadline = Instant::now() + wait;
    loop {
        engine.poll();
        if done(engine) {
            return true;
        }
        if Instant::now() >= deadline {
            debug!("Gave up waiting after {:?}", wait);
            return false;
        }
        if !engine.is_online() {
            thread::sleep(OFFLINE_POLL_INTERVAL);
        }
    }
}
