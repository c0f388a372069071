// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Profile Record
//!
//! The single synchronized entity per identity. Attributes are free-form;
//! only the timestamps carry meaning for synchronization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered attribute map, so the serialized form is canonical.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// A user's profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Milliseconds since the Unix epoch. Strictly increases on every local edit.
    pub updated_at: i64,
}

impl ProfileRecord {
    /// Creates the first revision of a record.
    pub fn new(id: impl Into<String>, attributes: Attributes, now_ms: i64) -> Self {
        ProfileRecord {
            id: id.into(),
            attributes,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Produces the next revision with new attributes.
    ///
    /// The stamp is `max(now, updated_at + 1)` so a lagging clock still
    /// yields a strictly newer record.
    pub fn next_revision(&self, attributes: Attributes, now_ms: i64) -> Self {
        ProfileRecord {
            id: self.id.clone(),
            attributes,
            created_at: self.created_at,
            updated_at: now_ms.max(self.updated_at.saturating_add(1)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    /// Returns an attribute if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }
}
