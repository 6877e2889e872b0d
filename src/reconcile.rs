//! Drift detection between the live roster and the fingerprint captured at
//! the last clean reconciliation.
//!
//! State machine:
//!
//! ```text
//! Idle → Diffing → NoChange → Idle
//!                → SafeChangesApplied → Idle
//!                → AwaitingDecision → (option chosen / moved to unassigned) → Applied → Idle
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::SeatingEngine;
use crate::gateway::{SyncOption, SyncProcessResponse};
use crate::model::*;

// ── Drift events ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    NewConfirmed,
    BecameConfirmed,
    AttendingCountIncreased,
    AttendingCountDecreased,
    NoLongerConfirmed,
    DetailsChanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftEvent {
    pub guest_id: GuestId,
    pub kind: DriftKind,
    #[serde(default)]
    pub previous_count: Option<u32>,
    pub current_count: u32,
    /// Tables currently holding any occurrence of the guest.
    #[serde(default)]
    pub tables: Vec<TableId>,
    /// No safe automatic resolution exists locally.
    #[serde(default)]
    pub requires_decision: bool,
}

fn slots(separated: bool) -> &'static [Option<Gender>] {
    if separated {
        &[Some(Gender::Male), Some(Gender::Female)]
    } else {
        &[None]
    }
}

fn entry_count(entry: &FingerprintEntry, slot: Option<Gender>) -> u32 {
    match slot {
        None => entry.party_size,
        Some(Gender::Male) => entry.male_count,
        Some(Gender::Female) => entry.female_count,
    }
}

fn total(counts: impl Fn(Option<Gender>) -> u32, separated: bool) -> u32 {
    slots(separated).iter().map(|s| counts(*s)).sum()
}

/// Classify every roster change since `fingerprint` was captured.
///
/// An event needs a decision when the guest is seated and either no longer
/// attends or sits at a table that is now over capacity.
pub fn detect_drift(fingerprint: &GuestFingerprint, engine: &SeatingEngine) -> Vec<DriftEvent> {
    let separated = engine.is_separated();
    let over: HashSet<TableId> = engine.over_capacity_tables().into_iter().collect();
    let seated_tables = |id: GuestId| -> Vec<TableId> {
        let mut tables: Vec<TableId> = slots(separated)
            .iter()
            .filter_map(|slot| {
                engine.store().table_of(&GuestRef {
                    guest_id: id,
                    gender: *slot,
                })
            })
            .collect();
        tables.dedup();
        tables
    };

    let mut events = Vec::new();
    for guest in engine.guests() {
        let current = total(|s| guest.count_for(s), separated);
        let tables = seated_tables(guest.id);
        let overflowing = tables.iter().any(|t| over.contains(t));
        let prev = fingerprint.get(&guest.id);
        let previous_count = prev.map(|p| total(|s| entry_count(p, s), separated));

        let classified = match prev {
            None if guest.is_confirmed() => Some((DriftKind::NewConfirmed, overflowing)),
            None => None,
            Some(p) if p.status != RsvpStatus::Confirmed && guest.is_confirmed() => {
                Some((DriftKind::BecameConfirmed, overflowing))
            }
            Some(p) if p.status == RsvpStatus::Confirmed && !guest.is_confirmed() => {
                Some((DriftKind::NoLongerConfirmed, !tables.is_empty()))
            }
            Some(_) if !guest.is_confirmed() => None,
            Some(p) => {
                let grew = slots(separated)
                    .iter()
                    .any(|s| guest.count_for(*s) > entry_count(p, *s));
                let shrank = slots(separated)
                    .iter()
                    .any(|s| guest.count_for(*s) < entry_count(p, *s));
                if grew {
                    Some((DriftKind::AttendingCountIncreased, overflowing))
                } else if shrank {
                    Some((DriftKind::AttendingCountDecreased, false))
                } else if p.name != guest.name || p.group.as_deref() != guest.group_label() {
                    Some((DriftKind::DetailsChanged, false))
                } else {
                    None
                }
            }
        };

        if let Some((kind, requires_decision)) = classified {
            events.push(DriftEvent {
                guest_id: guest.id,
                kind,
                previous_count,
                current_count: current,
                tables,
                requires_decision,
            });
        }
    }

    // Guests that vanished from the roster altogether.
    for (id, entry) in &fingerprint.guests {
        if engine.guest(id).is_some() || entry.status != RsvpStatus::Confirmed {
            continue;
        }
        let tables = seated_tables(*id);
        events.push(DriftEvent {
            guest_id: *id,
            kind: DriftKind::NoLongerConfirmed,
            previous_count: Some(total(|s| entry_count(entry, s), separated)),
            current_count: 0,
            requires_decision: !tables.is_empty(),
            tables,
        });
    }
    events
}

// ── Decisions ────────────────────────────────────────────────────

/// What the consuming UI is asked to resolve.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDecision {
    pub options: Vec<SyncOption>,
    pub affected_guests: Vec<GuestId>,
    pub pending_triggers: Vec<DriftEvent>,
    pub message: String,
}

/// How to proceed after the server has processed a drift.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Safe: adopt the server's seating if it sent one.
    Apply(Option<SeatingSnapshot>),
    Decide(PendingDecision),
}

/// Combine local classification with the server's answer. Either side can
/// escalate to a decision; neither can downgrade the other.
pub fn resolve_response(events: &[DriftEvent], response: SyncProcessResponse) -> Resolution {
    let local_decision = events.iter().any(|e| e.requires_decision);
    if !(response.requires_user_decision || local_decision) {
        return Resolution::Apply(response.seating.filter(|_| response.has_changes));
    }

    let mut affected = response.affected_guests;
    if affected.is_empty() {
        for e in events.iter().filter(|e| e.requires_decision) {
            if !affected.contains(&e.guest_id) {
                affected.push(e.guest_id);
            }
        }
    }
    let pending_triggers = if response.pending_triggers.is_empty() {
        events.to_vec()
    } else {
        response.pending_triggers
    };
    let message = if response.message.is_empty() {
        format!("{} guest(s) need a seating decision", affected.len())
    } else {
        response.message
    };
    Resolution::Decide(PendingDecision {
        options: response.options,
        affected_guests: affected,
        pending_triggers,
        message,
    })
}

// ── State machine ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReconcileState {
    #[default]
    Idle,
    Diffing,
    AwaitingDecision(PendingDecision),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    NoChange,
    SafeChangesApplied { events: Vec<DriftEvent> },
    AwaitingDecision(PendingDecision),
    Applied,
}

impl ReconcileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ReconcileOutcome::NoChange => "no_change",
            ReconcileOutcome::SafeChangesApplied { .. } => "safe_changes_applied",
            ReconcileOutcome::AwaitingDecision(_) => "awaiting_decision",
            ReconcileOutcome::Applied => "applied",
        }
    }
}

/// Result of entering `Diffing`.
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// No fingerprint yet; capture one and report no change.
    Prime,
    Clean,
    Drift(Vec<DriftEvent>),
    /// A decision is still open; nothing was diffed.
    Pending(PendingDecision),
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    state: ReconcileState,
    fingerprint: Option<GuestFingerprint>,
}

impl Reconciler {
    pub fn new(fingerprint: Option<GuestFingerprint>) -> Self {
        Self {
            state: ReconcileState::Idle,
            fingerprint,
        }
    }

    pub fn state(&self) -> &ReconcileState {
        &self.state
    }

    pub fn fingerprint(&self) -> Option<&GuestFingerprint> {
        self.fingerprint.as_ref()
    }

    /// Adopt the fingerprint that came with a remote snapshot.
    pub fn set_fingerprint(&mut self, fingerprint: Option<GuestFingerprint>) {
        self.fingerprint = fingerprint;
    }

    pub fn pending(&self) -> Option<&PendingDecision> {
        match &self.state {
            ReconcileState::AwaitingDecision(p) => Some(p),
            _ => None,
        }
    }

    pub fn begin(&mut self, engine: &SeatingEngine) -> Diff {
        if let ReconcileState::AwaitingDecision(p) = &self.state {
            return Diff::Pending(p.clone());
        }
        self.state = ReconcileState::Diffing;
        let Some(fingerprint) = &self.fingerprint else {
            return Diff::Prime;
        };
        let events = detect_drift(fingerprint, engine);
        if events.is_empty() {
            Diff::Clean
        } else {
            debug!(drift = events.len(), "roster drift detected");
            Diff::Drift(events)
        }
    }

    fn refresh(&mut self, engine: &SeatingEngine) {
        self.fingerprint = Some(GuestFingerprint::capture(&engine.roster_snapshot()));
        self.state = ReconcileState::Idle;
    }

    pub fn finish_clean(&mut self, engine: &SeatingEngine) -> ReconcileOutcome {
        self.refresh(engine);
        ReconcileOutcome::NoChange
    }

    pub fn finish_applied(&mut self, engine: &SeatingEngine, events: Vec<DriftEvent>) -> ReconcileOutcome {
        self.refresh(engine);
        info!(drift = events.len(), "safe roster changes applied");
        ReconcileOutcome::SafeChangesApplied { events }
    }

    pub fn await_decision(&mut self, pending: PendingDecision) -> ReconcileOutcome {
        info!(
            affected = pending.affected_guests.len(),
            options = pending.options.len(),
            "reconciliation awaiting decision"
        );
        self.state = ReconcileState::AwaitingDecision(pending.clone());
        ReconcileOutcome::AwaitingDecision(pending)
    }

    /// The chosen resolution was applied server-side and folded in.
    pub fn finish_decision(&mut self, engine: &SeatingEngine) -> ReconcileOutcome {
        self.refresh(engine);
        ReconcileOutcome::Applied
    }

    /// Leave `Diffing` without touching the fingerprint.
    pub fn abort(&mut self) {
        if self.state == ReconcileState::Diffing {
            self.state = ReconcileState::Idle;
        }
    }

    /// Forget everything; the next run re-primes.
    pub fn reset(&mut self) {
        self.fingerprint = None;
        self.state = ReconcileState::Idle;
    }
}
