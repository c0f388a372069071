// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Probe Command
//!
//! Checks whether the relay actually stores what it is sent.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use recall_core::probe::PROBE_DEADLINE_MS;
use recall_core::ProbeOutcome;

use super::{drive, open_engine};
use crate::config::CliConfig;
use crate::display;

/// Extra time past the probe deadline before giving up on the engine.
const PROBE_GRACE: Duration = Duration::from_millis(500);

/// Runs a persistence probe and prints its outcome.
pub fn run(config: &CliConfig) -> Result<()> {
    let mut engine = open_engine(config);
    let outcome: Arc<Mutex<Option<ProbeOutcome>>> = Arc::new(Mutex::new(None));

    println!("Probing {}...", config.relay_url);
    let sink = Arc::clone(&outcome);
    engine.start_probe(move |result: ProbeOutcome| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(result);
        }
    });

    let wait = Duration::from_millis(PROBE_DEADLINE_MS as u64) + PROBE_GRACE;
    drive(&mut engine, wait, |e| !e.probe_in_flight());

    let resolved = outcome.lock().ok().and_then(|slot| *slot);
    match resolved {
        Some(outcome) => display::display_probe(outcome),
        None => display::warning("Probe did not finish"),
    }
    Ok(())
}
