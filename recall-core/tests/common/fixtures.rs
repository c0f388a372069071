// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Test fixtures: phrases, identities and engines wired to mocks.

use std::sync::{Arc, Mutex, OnceLock};

use recall_core::network::RelayClientConfig;
use recall_core::{
    Attributes, Identity, ManualClock, MemoryStore, MockTransport, RecordStore, RelayClient,
    SyncEngine, SyncEvent,
};

pub const PHRASE_A: &str = "abandon ability able about above absent absorb abstract absurd abuse access accident";
pub const PHRASE_B: &str = "zoo zone zero youth young you yellow year yard wrong write wrist";

/// Start time for manual clocks.
pub const T0: i64 = 1_700_000_000_000;

/// Key derivation is slow in debug builds, so derive each phrase once.
pub fn identity_a() -> Identity {
    static IDENTITY: OnceLock<Identity> = OnceLock::new();
    IDENTITY
        .get_or_init(|| Identity::from_phrase(PHRASE_A).unwrap())
        .clone()
}

pub fn identity_b() -> Identity {
    static IDENTITY: OnceLock<Identity> = OnceLock::new();
    IDENTITY
        .get_or_init(|| Identity::from_phrase(PHRASE_B).unwrap())
        .clone()
}

pub fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
        .collect()
}

/// Everything a test needs to poke at a running engine.
pub struct Harness {
    pub engine: SyncEngine<MockTransport>,
    pub clock: ManualClock,
    pub primary: MemoryStore,
    pub fallback: MemoryStore,
    pub events: Arc<Mutex<Vec<SyncEvent>>>,
}

impl Harness {
    pub fn new(transport: MockTransport) -> Self {
        Self::with_stores(transport, MemoryStore::new(), MemoryStore::new())
    }

    pub fn with_stores(transport: MockTransport, primary: MemoryStore, fallback: MemoryStore) -> Self {
        let clock = ManualClock::new(T0);
        let relay = RelayClient::new(transport, RelayClientConfig::default(), Arc::new(clock.clone()));
        let mut engine = SyncEngine::new(
            relay,
            Box::new(primary.clone()),
            Box::new(fallback.clone()),
            Arc::new(clock.clone()),
        );

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        engine.on_event(move |event| sink.lock().unwrap().push(event));

        Harness {
            engine,
            clock,
            primary,
            fallback,
            events,
        }
    }

    /// Builds an engine whose tier 1 is an arbitrary store.
    pub fn with_primary(transport: MockTransport, primary: Box<dyn RecordStore>) -> Self {
        let clock = ManualClock::new(T0);
        let relay = RelayClient::new(transport, RelayClientConfig::default(), Arc::new(clock.clone()));
        let fallback = MemoryStore::new();
        let mut engine = SyncEngine::new(
            relay,
            primary,
            Box::new(fallback.clone()),
            Arc::new(clock.clone()),
        );

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        engine.on_event(move |event| sink.lock().unwrap().push(event));

        Harness {
            engine,
            clock,
            primary: MemoryStore::new(),
            fallback,
            events,
        }
    }

    /// Advances the clock in small steps, polling after each.
    pub fn run_for(&mut self, ms: i64) {
        let step = 10;
        let mut elapsed = 0;
        while elapsed < ms {
            self.clock.advance(step);
            self.engine.poll();
            elapsed += step;
        }
    }

    pub fn take_events(&self) -> Vec<SyncEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}
