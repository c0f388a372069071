// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Init Command
//!
//! Activates a recovery phrase on this device and recovers its profile.

use anyhow::{bail, Result};
use recall_core::{validate_phrase_shape, Identity, RecordStore, Storage};

use super::{drive, open_engine, ChangeLog};
use crate::config::CliConfig;
use crate::display;

/// Activates `phrase`, recovering the profile from the local tiers or the relay.
pub fn run(config: &CliConfig, phrase: &str) -> Result<()> {
    validate_phrase_shape(phrase)?;
    let identity = Identity::from_phrase(phrase)?;

    if config.is_initialized() {
        let remembered = Storage::open(config.database_path())?.load_phrase()?;
        if let Some(remembered) = remembered {
            if Identity::from_phrase(&remembered)?.id() != identity.id() {
                bail!(
                    "Another phrase is active in {:?}. Run 'recall forget' first.",
                    config.data_dir
                );
            }
        }
    }

    let mut engine = open_engine(config);
    let changes = ChangeLog::attach(&mut engine);
    engine.activate(identity);
    drive(&mut engine, config.wait, |_| changes.from_relay());

    let Some(identity) = engine.identity() else {
        bail!("Identity not active after activation");
    };
    display::success("Phrase activated");
    println!();
    println!("  Identity: {}", identity.id());
    println!("  Data dir: {:?}", config.data_dir);
    println!();

    match engine.current() {
        Some(record) => display::info(&format!(
            "Profile recovered ({} attributes)",
            record.attributes.len()
        )),
        None => display::info("No profile yet. Add attributes with: recall profile set <key> <value>"),
    }
    if !engine.is_online() {
        display::warning(&format!("Relay {} not reachable", config.relay_url));
    }

    Ok(())
}

/// Forgets the remembered phrase. Stored envelopes are kept.
pub fn forget(config: &CliConfig) -> Result<()> {
    if !config.is_initialized() {
        display::info("Nothing to forget");
        return Ok(());
    }
    open_engine(config).forget()?;
    display::success("Phrase forgotten");
    Ok(())
}
