// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Command
//!
//! Reconciles the profile with the relay.

use anyhow::Result;

use super::{drive, open_active_engine, ChangeLog};
use crate::config::CliConfig;
use crate::display;

/// Runs the sync command.
pub fn run(config: &CliConfig) -> Result<()> {
    let mut engine = open_active_engine(config)?;
    let changes = ChangeLog::attach(&mut engine);

    println!("Syncing with {}...", config.relay_url);
    drive(&mut engine, config.wait, |_| false);

    if !engine.is_online() {
        display::warning(&format!("Relay {} not reachable", config.relay_url));
        return Ok(());
    }
    if changes.from_relay() {
        display::success("Profile updated from relay");
    } else {
        display::success("Profile up to date");
    }
    if engine.relay().has_pending_push() {
        display::warning("Local changes are still waiting to be pushed");
    }
    Ok(())
}
