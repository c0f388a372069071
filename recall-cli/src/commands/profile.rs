// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Profile Commands
//!
//! Show and edit the profile record of the active phrase.

use anyhow::Result;
use serde_json::Value;

use super::{drive, open_active_engine, Engine};
use crate::config::CliConfig;
use crate::display;

/// Parses a command-line value: numbers and booleans keep their type,
/// everything else is a string.
pub fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

/// Shows the current profile.
pub fn show(config: &CliConfig, json: bool) -> Result<()> {
    let engine = open_active_engine(config)?;

    match engine.current() {
        Some(record) if json => println!("{}", serde_json::to_string_pretty(record)?),
        Some(record) => display::display_record(record),
        None if json => println!("null"),
        None => display::info("No profile yet. Add attributes with: recall profile set <key> <value>"),
    }
    Ok(())
}

/// Sets one attribute.
pub fn set(config: &CliConfig, key: &str, value: &str) -> Result<()> {
    let mut engine = open_active_engine(config)?;
    let value = parse_value(value);
    engine.update(|attributes| {
        attributes.insert(key.to_string(), value);
    })?;
    display::success(&format!("Set {}", key));
    flush(config, &mut engine);
    Ok(())
}

/// Removes one attribute.
pub fn unset(config: &CliConfig, key: &str) -> Result<()> {
    let mut engine = open_active_engine(config)?;
    if !engine.current().is_some_and(|r| r.attributes.contains_key(key)) {
        display::warning(&format!("No attribute named {}", key));
        return Ok(());
    }
    engine.update(|attributes| {
        attributes.remove(key);
    })?;
    display::success(&format!("Removed {}", key));
    flush(config, &mut engine);
    Ok(())
}

/// Gives the held push a chance to reach the relay.
fn flush(config: &CliConfig, engine: &mut Engine) {
    let pushed = drive(engine, config.wait, |e| {
        e.is_online() && !e.relay().has_pending_push()
    });
    if !pushed {
        display::warning("Relay not reachable; the change is stored locally and will be pushed on the next sync");
    }
}
