// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Last-write-wins merge.
//!
//! Whole-record comparison on `updated_at`. No field-level merging.

use crate::record::ProfileRecord;

/// Picks between a candidate and the incumbent copy.
///
/// The candidate wins only if strictly newer, so equal stamps keep the
/// incumbent.
pub fn pick_winner<'a>(
    candidate: &'a ProfileRecord,
    incumbent: &'a ProfileRecord,
) -> &'a ProfileRecord {
    if candidate.updated_at > incumbent.updated_at {
        candidate
    } else {
        incumbent
    }
}

/// Merges an incoming copy into an optional incumbent.
///
/// Returns the winner and whether it differs from the incumbent.
pub fn merge(incumbent: Option<&ProfileRecord>, candidate: ProfileRecord) -> (ProfileRecord, bool) {
    match incumbent {
        None => (candidate, true),
        Some(current) if candidate.updated_at > current.updated_at => (candidate, true),
        Some(current) => (current.clone(), false),
    }
}
