// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity Command

use anyhow::{bail, Result};
use recall_core::{Identity, RecordStore, Storage};

use crate::config::CliConfig;

/// Prints the identity for `phrase`, or for the remembered phrase.
///
/// Never touches the network.
pub fn show(config: &CliConfig, phrase: Option<&str>) -> Result<()> {
    let identity = match phrase {
        Some(phrase) => Identity::from_phrase(phrase)?,
        None => {
            if !config.is_initialized() {
                bail!("Recall not initialized. Pass --phrase or run 'recall init <phrase>'.");
            }
            match Storage::open(config.database_path())?.load_phrase()? {
                Some(remembered) => Identity::from_phrase(&remembered)?,
                None => bail!("No phrase remembered. Run 'recall init <phrase>' first."),
            }
        }
    };

    println!("{}", identity.id());
    Ok(())
}
