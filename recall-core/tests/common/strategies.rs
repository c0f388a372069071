// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.

use proptest::prelude::*;
use recall_core::{Attributes, ProfileRecord};

/// Strategy for attribute keys (camelCase-ish).
pub fn attribute_key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,19}"
}

/// Strategy for attribute values: strings, numbers and flags.
pub fn attribute_value_strategy() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        ".{0,60}".prop_map(serde_json::Value::from),
        any::<i32>().prop_map(serde_json::Value::from),
        any::<bool>().prop_map(serde_json::Value::from),
    ]
}

pub fn attributes_strategy() -> impl Strategy<Value = Attributes> {
    prop::collection::btree_map(attribute_key_strategy(), attribute_value_strategy(), 0..8)
}

/// Strategy for records with arbitrary (non-negative) timestamps.
pub fn record_strategy() -> impl Strategy<Value = ProfileRecord> {
    (attributes_strategy(), 0i64..1_000_000, 0i64..1_000_000).prop_map(
        |(attributes, created_at, delta)| ProfileRecord {
            id: "profile-test".into(),
            attributes,
            created_at,
            updated_at: created_at + delta,
        },
    )
}
