// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-process stand-ins for relays with different behavior, as mock
//! transport responders.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use recall_core::network::{encode_message, parse_message, Frame};
use recall_core::{MockTransport, SyncMessage};

/// Stored `identity -> (payload, timestamp)` shared with the test.
pub type BrokerTable = Arc<Mutex<HashMap<String, (String, Option<i64>)>>>;

fn frame(message: SyncMessage) -> Frame {
    Frame::Text(encode_message(&message).unwrap())
}

/// A relay that stores pushes and answers pulls.
pub fn faithful_broker() -> (MockTransport, BrokerTable) {
    let table: BrokerTable = Arc::new(Mutex::new(HashMap::new()));
    (faithful_broker_on(table.clone()), table)
}

/// A faithful relay over an existing table, so several clients can share it.
pub fn faithful_broker_on(table: BrokerTable) -> MockTransport {
    MockTransport::with_responder(move |text| {
        let Ok(message) = parse_message(text) else {
            return Vec::new();
        };
        match message {
            SyncMessage::Push {
                identity,
                payload,
                timestamp,
            } => {
                table
                    .lock()
                    .unwrap()
                    .insert(identity.clone(), (payload, timestamp));
                vec![frame(SyncMessage::PushAck { identity })]
            }
            SyncMessage::Pull { identity } => {
                let stored = table.lock().unwrap().get(&identity).cloned();
                vec![frame(SyncMessage::PullResponse {
                    identity,
                    payload: stored.as_ref().map(|(p, _)| p.clone()),
                    timestamp: stored.and_then(|(_, t)| t),
                })]
            }
            _ => Vec::new(),
        }
    })
}

/// A relay that reflects every frame back unchanged.
pub fn echo_broker() -> MockTransport {
    MockTransport::with_responder(|text| vec![Frame::Text(text.to_string())])
}

/// A relay that accepts frames and never answers.
pub fn silent_broker() -> MockTransport {
    MockTransport::with_responder(|_| Vec::new())
}

/// A relay that acknowledges pushes but answers every pull with a fixed payload.
pub fn mismatching_broker() -> MockTransport {
    MockTransport::with_responder(|text| match parse_message(text) {
        Ok(SyncMessage::Push { identity, .. }) => vec![frame(SyncMessage::PushAck { identity })],
        Ok(SyncMessage::Pull { identity }) => vec![frame(SyncMessage::PullResponse {
            identity,
            payload: Some("something-else".into()),
            timestamp: Some(1),
        })],
        _ => Vec::new(),
    })
}
