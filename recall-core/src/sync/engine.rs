// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Engine
//!
//! Owns the relay client, both local tiers and the current authoritative
//! record. Local reads and writes complete synchronously; everything that
//! involves the relay completes during later calls to [`SyncEngine::poll`]
//! and is reported through [`SyncEvent`]s.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::SyncError;
use super::merge::merge;
use crate::api::{CallbackHandler, EventDispatcher, EventHandler, RelayConfig, SyncConfig, SyncEvent};
use crate::crypto::{decrypt_payload, decrypt_record, encrypt_record, Envelope};
use crate::identity::Identity;
use crate::network::{
    encode_message, Clock, ConnectionState, RelayClient, RelayEvent, SyncMessage, SystemClock,
    Transport,
};
use crate::probe::{PersistenceProbe, ProbeFailure, ProbeOutcome};
use crate::record::{Attributes, ProfileRecord};
use crate::storage::{FallbackStore, MemoryStore, RecordStore, Storage, StorageError};

/// Where an adopted copy of the record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// Tier 1, or a local edit.
    Local,
    /// Tier 2.
    Fallback,
    /// The relay.
    Relay,
}

/// Abbreviated identity for log lines.
fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Builds the push for an envelope, failing if it cannot be framed.
fn build_push(
    identity: &Identity,
    envelope: &Envelope,
    updated_at: i64,
) -> Result<SyncMessage, SyncError> {
    let payload = envelope.to_payload()?;
    let push = SyncMessage::push(identity.id(), payload, Some(updated_at));
    encode_message(&push)?;
    Ok(push)
}

/// Phrase-keyed profile synchronization.
///
/// # Example
///
/// ```ignore
/// use recall_core::{Identity, SyncConfig, SyncEngine, WebSocketTransport};
///
/// let mut engine = SyncEngine::open(&SyncConfig::with_data_dir("./data"), WebSocketTransport::new());
/// engine.activate(Identity::from_phrase(phrase)?);
/// engine.save(attributes)?;
/// loop {
///     engine.poll();
/// }
/// ```
pub struct SyncEngine<T: Transport> {
    relay: RelayClient<T>,
    primary: Box<dyn RecordStore>,
    fallback: Box<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    identity: Option<Identity>,
    current: Option<ProfileRecord>,
    events: EventDispatcher,
    probe: PersistenceProbe,
    persistence_health: Option<ProbeOutcome>,
}

impl<T: Transport> SyncEngine<T> {
    /// Creates an engine from already constructed parts.
    pub fn new(
        relay: RelayClient<T>,
        primary: Box<dyn RecordStore>,
        fallback: Box<dyn RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        SyncEngine {
            relay,
            primary,
            fallback,
            clock,
            identity: None,
            current: None,
            events: EventDispatcher::new(),
            probe: PersistenceProbe::new(),
            persistence_health: None,
        }
    }

    /// Opens the tiers described by `config` on the wall clock.
    ///
    /// An unusable tier 1 database degrades to an in-memory store.
    pub fn open(config: &SyncConfig, transport: T) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let relay = RelayClient::new(
            transport,
            config.relay.to_relay_client_config(),
            clock.clone(),
        );

        let primary: Box<dyn RecordStore> = match Storage::open(&config.database_path) {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                warn!(
                    "Primary store at {} unavailable ({}), keeping tier 1 in memory",
                    config.database_path.display(),
                    e
                );
                Box::new(MemoryStore::new())
            }
        };
        let fallback = Box::new(FallbackStore::new(config.fallback_dir.clone()));

        Self::new(relay, primary, fallback, clock)
    }

    // --- Accessors -------------------------------------------------------

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The current authoritative record.
    pub fn current(&self) -> Option<&ProfileRecord> {
        self.current.as_ref()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.relay.state()
    }

    pub fn is_online(&self) -> bool {
        self.relay.is_open()
    }

    /// Outcome of the latest completed persistence probe.
    pub fn persistence_health(&self) -> Option<ProbeOutcome> {
        self.persistence_health
    }

    pub fn probe_in_flight(&self) -> bool {
        self.probe.is_active()
    }

    pub fn relay(&self) -> &RelayClient<T> {
        &self.relay
    }

    pub fn relay_mut(&mut self) -> &mut RelayClient<T> {
        &mut self.relay
    }

    // --- Events ----------------------------------------------------------

    /// Adds an event handler.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.events.add_handler(handler);
    }

    /// Adds a closure as event handler.
    pub fn on_event<F>(&mut self, callback: F)
    where
        F: Fn(SyncEvent) + Send + Sync + 'static,
    {
        self.events.add_handler(Arc::new(CallbackHandler::new(callback)));
    }

    // --- Identity --------------------------------------------------------

    /// Makes `identity` active: remembers the phrase, loads the local tiers
    /// and asks the relay for its copy.
    pub fn activate(&mut self, identity: Identity) {
        if let Err(e) = self.primary.save_phrase(identity.phrase()) {
            self.report_store_error("remember phrase", &e);
        }

        let same = self
            .identity
            .as_ref()
            .is_some_and(|active| active.id() == identity.id());
        if !same {
            info!("Activated identity {}", short(identity.id()));
            self.current = None;
            self.identity = Some(identity);
        }

        self.load_local();
        self.request_pull();
    }

    /// Derives an identity from `phrase` and activates it.
    pub fn activate_phrase(&mut self, phrase: &str) -> Result<(), SyncError> {
        let identity = Identity::from_phrase(phrase)?;
        self.activate(identity);
        Ok(())
    }

    /// Activates the phrase remembered by tier 1, if there is one.
    pub fn activate_remembered(&mut self) -> Result<bool, SyncError> {
        match self.primary.load_phrase()? {
            Some(phrase) => {
                self.activate_phrase(&phrase)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deactivates the identity and forgets the remembered phrase. Stored
    /// envelopes stay where they are.
    pub fn forget(&mut self) -> Result<(), SyncError> {
        self.primary.clear_phrase()?;
        self.identity = None;
        self.current = None;
        Ok(())
    }

    // --- Local writes ----------------------------------------------------

    /// Saves new attributes as the next revision of the record.
    ///
    /// Both local tiers are written and subscribers notified before this
    /// returns. The push goes out now if the relay is open, otherwise it is
    /// held until the next open. A record too large to frame is rejected
    /// with [`crate::network::NetworkError::FrameTooLarge`] before anything is written.
    pub fn save(&mut self, attributes: Attributes) -> Result<ProfileRecord, SyncError> {
        let identity = self.identity.clone().ok_or(SyncError::NoIdentity)?;
        let now = self.clock.now_ms();

        let record = match &self.current {
            Some(current) => current.next_revision(attributes, now),
            None => ProfileRecord::new(identity.record_id(), attributes, now),
        };
        let envelope = encrypt_record(&record, identity.key())?;
        let push = build_push(&identity, &envelope, record.updated_at)?;

        self.write_tiers(identity.id(), &envelope);
        self.current = Some(record.clone());
        self.events.dispatch(SyncEvent::RecordChanged {
            record: record.clone(),
            source: RecordSource::Local,
        });

        self.send_push(push);
        Ok(record)
    }

    /// Edits the current attributes in place and saves the result.
    pub fn update<F>(&mut self, edit: F) -> Result<ProfileRecord, SyncError>
    where
        F: FnOnce(&mut Attributes),
    {
        let mut attributes = self
            .current
            .as_ref()
            .map(|r| r.attributes.clone())
            .unwrap_or_default();
        edit(&mut attributes);
        self.save(attributes)
    }

    // --- Relay -----------------------------------------------------------

    /// Asks the relay for its copy (debounced).
    pub fn request_pull(&mut self) {
        self.relay.request_pull();
        if !self.relay.is_open()
            && !self.relay.reconnect_scheduled()
            && !self.relay.retries_exhausted()
        {
            // Failures schedule their own retry
            let _ = self.relay.connect();
        }
    }

    /// Reconnects with a fresh retry budget.
    pub fn reconnect(&mut self) -> Result<(), SyncError> {
        self.relay.reconnect()?;
        Ok(())
    }

    /// Applies a new relay configuration and reconnects.
    pub fn set_relay_config(&mut self, config: &RelayConfig) -> Result<(), SyncError> {
        self.relay.set_config(config.to_relay_client_config());
        self.reconnect()
    }

    /// Starts a persistence probe. `on_result` runs once with the outcome,
    /// which is also cached and published as [`SyncEvent::ProbeResolved`].
    pub fn start_probe<F>(&mut self, on_result: F)
    where
        F: FnOnce(ProbeOutcome) + Send + 'static,
    {
        let now = self.clock.now_ms();
        let resolved = self.probe.start(&mut self.relay, now, Box::new(on_result));
        for outcome in resolved {
            self.record_probe_outcome(outcome);
        }
    }

    /// Runs one step of the event loop: timers, inbound messages, probe.
    ///
    /// Returns the number of events handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;

        let now = self.clock.now_ms();
        if let Some(outcome) = self.probe.tick(&mut self.relay, now) {
            self.record_probe_outcome(outcome);
            handled += 1;
        }

        for event in self.relay.poll() {
            handled += 1;
            match event {
                RelayEvent::StatusChanged { online } => {
                    self.events.dispatch(SyncEvent::ConnectionChanged { online });
                }
                RelayEvent::PullDue => self.send_pull(),
                RelayEvent::Message(message) => self.handle_message(message),
            }
        }

        handled
    }

    fn send_pull(&mut self) {
        let Some(identity) = self.identity.as_ref() else {
            return;
        };
        let pull = SyncMessage::pull(identity.id());
        if let Err(e) = self.relay.send(pull) {
            debug!("Pull not sent: {}", e);
        }
    }

    fn handle_message(&mut self, message: SyncMessage) {
        if self.probe.owns(&message) {
            if let Some(outcome) = self.probe.handle_message(&message) {
                self.record_probe_outcome(outcome);
            }
            return;
        }

        let active = self.identity.as_ref().map(|i| i.id().to_string());
        match message {
            SyncMessage::PullResponse {
                identity, payload, ..
            } if active.as_deref() == Some(identity.as_str()) => {
                self.apply_pull_response(payload);
            }
            SyncMessage::PushAck { identity } => {
                debug!("Relay acknowledged push for {}", short(&identity));
            }
            other => {
                debug!(
                    "Ignoring {} for {} from relay",
                    other.kind().as_str(),
                    short(other.identity())
                );
            }
        }
    }

    fn apply_pull_response(&mut self, payload: Option<String>) {
        let Some(identity) = self.identity.clone() else {
            return;
        };

        let Some(payload) = payload else {
            debug!("Relay has no copy for {}", short(identity.id()));
            self.push_current(&identity);
            return;
        };

        match decrypt_payload(&payload, identity.key()) {
            Some((record, envelope)) => {
                let relay_stamp = record.updated_at;
                if !self.adopt(&identity, record, envelope, RecordSource::Relay)
                    && self
                        .current
                        .as_ref()
                        .is_some_and(|c| c.updated_at > relay_stamp)
                {
                    debug!("Relay copy is older, pushing local record");
                    self.push_current(&identity);
                }
            }
            None => warn!("Ignoring relay copy for {} that does not decrypt", short(identity.id())),
        }
    }

    /// Pushes the current record so the relay catches up.
    fn push_current(&mut self, identity: &Identity) {
        let Some(current) = self.current.clone() else {
            return;
        };
        let pushed = encrypt_record(&current, identity.key())
            .map_err(SyncError::from)
            .and_then(|envelope| build_push(identity, &envelope, current.updated_at));
        match pushed {
            Ok(push) => self.send_push(push),
            Err(e) => self.report_error(format!("Failed to push local record: {}", e)),
        }
    }

    fn send_push(&mut self, push: SyncMessage) {
        match self.relay.send(push) {
            Ok(()) => {}
            Err(e) if e.is_connection_loss() => debug!("Push held for later: {}", e),
            Err(e) => self.report_error(format!("Failed to push local record: {}", e)),
        }
    }

    fn record_probe_outcome(&mut self, outcome: ProbeOutcome) {
        if outcome != ProbeOutcome::Failed(ProbeFailure::Superseded) {
            self.persistence_health = Some(outcome);
        }
        self.events.dispatch(SyncEvent::ProbeResolved { outcome });
    }

    // --- Tiers -----------------------------------------------------------

    /// Tier 2 first, then tier 1; the newer copy wins, ties go to tier 1.
    fn load_local(&mut self) {
        let Some(identity) = self.identity.clone() else {
            return;
        };

        let fallback = self.read_tier(self.fallback.as_ref(), "fallback", &identity);
        let local = self.read_tier(self.primary.as_ref(), "primary", &identity);

        let ((record, envelope), source) = match (local, fallback) {
            (None, None) => {
                debug!("No local copy for {}", short(identity.id()));
                return;
            }
            (Some(local), None) => (local, RecordSource::Local),
            (None, Some(fallback)) => (fallback, RecordSource::Fallback),
            (Some(local), Some(fallback)) => {
                if fallback.0.updated_at > local.0.updated_at {
                    (fallback, RecordSource::Fallback)
                } else {
                    (local, RecordSource::Local)
                }
            }
        };

        self.adopt(&identity, record, envelope, source);
    }

    fn read_tier(
        &self,
        store: &dyn RecordStore,
        tier: &str,
        identity: &Identity,
    ) -> Option<(ProfileRecord, Envelope)> {
        match store.load(identity.id()) {
            Ok(Some(envelope)) => {
                let record = decrypt_record(&envelope, identity.key());
                if record.is_none() {
                    warn!("Ignoring {} copy that does not decrypt", tier);
                }
                record.map(|r| (r, envelope))
            }
            Ok(None) => None,
            Err(e) => {
                self.report_store_error(&format!("read {} tier", tier), &e);
                None
            }
        }
    }

    /// Merges `record` into the current copy. On a change, persists it to
    /// both local tiers and notifies subscribers.
    fn adopt(
        &mut self,
        identity: &Identity,
        record: ProfileRecord,
        envelope: Envelope,
        source: RecordSource,
    ) -> bool {
        let (winner, changed) = merge(self.current.as_ref(), record);
        if !changed {
            return false;
        }

        debug!(
            "Adopting {:?} copy of {} (updated_at {})",
            source,
            short(identity.id()),
            winner.updated_at
        );
        self.write_tiers(identity.id(), &envelope);
        self.current = Some(winner.clone());
        self.events.dispatch(SyncEvent::RecordChanged {
            record: winner,
            source,
        });
        true
    }

    fn write_tiers(&self, identity: &str, envelope: &Envelope) {
        if let Err(e) = self.primary.store(identity, envelope) {
            self.report_store_error("write primary tier", &e);
        }
        if let Err(e) = self.fallback.store(identity, envelope) {
            self.report_store_error("write fallback tier", &e);
        }
    }

    fn report_store_error(&self, action: &str, error: &StorageError) {
        self.report_error(format!("Failed to {}: {}", action, error));
    }

    fn report_error(&self, message: String) {
        warn!("{}", message);
        self.events.dispatch(SyncEvent::Error { message });
    }
}
