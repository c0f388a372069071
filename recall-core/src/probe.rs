// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistence Probe
//!
//! Some relays accept pushes and answer pulls without storing anything. The
//! probe finds out by pushing a throwaway payload under a synthetic identity,
//! pulling it back shortly after and comparing.

use tracing::{debug, info};
use uuid::Uuid;

use crate::network::{RelayClient, SyncMessage, TimerQueue, Transport};

/// Delay between the probe push and the probe pull.
pub const PROBE_STAGGER_MS: i64 = 150;
/// Time allowed for the whole round trip.
pub const PROBE_DEADLINE_MS: i64 = 2_500;

/// Prefix of synthetic probe identities.
pub const PROBE_IDENTITY_PREFIX: &str = "probe-";

/// Result of a persistence probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The relay returned exactly what was pushed.
    Persisting,
    /// The relay answered, but did not keep the payload.
    NotPersisting(NotPersistingReason),
    /// The probe could not run to completion.
    Failed(ProbeFailure),
}

impl ProbeOutcome {
    pub fn is_persisting(&self) -> bool {
        matches!(self, ProbeOutcome::Persisting)
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Persisting => write!(f, "persisting"),
            ProbeOutcome::NotPersisting(reason) => write!(f, "not persisting ({:?})", reason),
            ProbeOutcome::Failed(failure) => write!(f, "failed ({:?})", failure),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotPersistingReason {
    /// The pull came back with a different payload, or none.
    PayloadMismatch,
    /// The relay reflected our pull instead of answering it.
    EchoedPull,
    /// Nothing relevant arrived before the deadline.
    NoResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    /// The relay connection could not be opened.
    TransportUnavailable,
    /// A newer probe replaced this one.
    Superseded,
}

/// Called exactly once with the probe's outcome.
pub type ProbeCallback = Box<dyn FnOnce(ProbeOutcome) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeTimer {
    Pull,
    Deadline,
}

struct ProbeSession {
    identity: String,
    expected_payload: String,
    timers: TimerQueue<ProbeTimer>,
    resolve: ProbeCallback,
}

/// Runs at most one probe at a time over a borrowed relay client.
#[derive(Default)]
pub struct PersistenceProbe {
    session: Option<ProbeSession>,
}

impl PersistenceProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Synthetic identity of the running probe.
    pub fn identity(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.identity.as_str())
    }

    /// Starts a probe, superseding any probe still in flight.
    ///
    /// Returns every outcome resolved by the call: the superseded probe (if
    /// any) and, when the relay cannot be reached, this probe itself.
    pub fn start<T: Transport>(
        &mut self,
        relay: &mut RelayClient<T>,
        now_ms: i64,
        resolve: ProbeCallback,
    ) -> Vec<ProbeOutcome> {
        let mut resolved = Vec::new();
        if let Some(outcome) = self.finish(ProbeOutcome::Failed(ProbeFailure::Superseded)) {
            resolved.push(outcome);
        }

        if !relay.is_open() {
            let _ = relay.connect();
        }

        let identity = format!("{}{}", PROBE_IDENTITY_PREFIX, Uuid::new_v4());
        let expected_payload = format!("probe:{}", Uuid::new_v4().simple());
        let push = SyncMessage::push(identity.as_str(), expected_payload.as_str(), Some(now_ms));

        if let Err(e) = relay.send_now(&push) {
            info!("Persistence probe could not reach the relay: {}", e);
            let outcome = ProbeOutcome::Failed(ProbeFailure::TransportUnavailable);
            resolve(outcome);
            resolved.push(outcome);
            return resolved;
        }

        debug!("Persistence probe started as {}", identity);
        let mut timers = TimerQueue::new();
        timers.arm(ProbeTimer::Pull, now_ms + PROBE_STAGGER_MS);
        timers.arm(ProbeTimer::Deadline, now_ms + PROBE_DEADLINE_MS);

        self.session = Some(ProbeSession {
            identity,
            expected_payload,
            timers,
            resolve,
        });
        resolved
    }

    /// Sends the staggered pull and enforces the deadline.
    pub fn tick<T: Transport>(
        &mut self,
        relay: &mut RelayClient<T>,
        now_ms: i64,
    ) -> Option<ProbeOutcome> {
        let session = self.session.as_mut()?;

        for timer in session.timers.pop_due(now_ms) {
            match timer {
                ProbeTimer::Pull => {
                    let pull = SyncMessage::pull(session.identity.as_str());
                    if let Err(e) = relay.send_now(&pull) {
                        debug!("Probe pull not sent: {}", e);
                    }
                }
                ProbeTimer::Deadline => {
                    return self.finish(ProbeOutcome::NotPersisting(
                        NotPersistingReason::NoResponse,
                    ));
                }
            }
        }
        None
    }

    /// True if `message` belongs to the running probe.
    pub fn owns(&self, message: &SyncMessage) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.identity == message.identity())
    }

    /// Consumes a message addressed to the probe identity.
    ///
    /// Returns the outcome if the message settles the probe. Acks and echoed
    /// pushes are swallowed without resolving.
    pub fn handle_message(&mut self, message: &SyncMessage) -> Option<ProbeOutcome> {
        if !self.owns(message) {
            return None;
        }

        let outcome = match message {
            SyncMessage::PullResponse { payload, .. } => {
                let expected = self.session.as_ref().map(|s| s.expected_payload.as_str());
                if payload.as_deref() == expected {
                    ProbeOutcome::Persisting
                } else {
                    ProbeOutcome::NotPersisting(NotPersistingReason::PayloadMismatch)
                }
            }
            SyncMessage::Pull { .. } => {
                ProbeOutcome::NotPersisting(NotPersistingReason::EchoedPull)
            }
            SyncMessage::PushAck { .. } | SyncMessage::Push { .. } => return None,
        };
        self.finish(outcome)
    }

    /// Abandons the running probe without resolving it.
    pub fn cancel(&mut self) {
        self.session = None;
    }

    fn finish(&mut self, outcome: ProbeOutcome) -> Option<ProbeOutcome> {
        let session = self.session.take()?;
        info!("Persistence probe {}: {}", session.identity, outcome);
        (session.resolve)(outcome);
        Some(outcome)
    }
}
