//! One editing session over one event's seating.
//!
//! The session owns the only writable [`SeatingEngine`] for its event. Edits
//! apply synchronously, then arm a debounce timer; when it fires the whole
//! snapshot is pushed. A background poller adopts newer remote snapshots
//! (last writer wins) unless a local edit is still on its way out.

mod error;
mod manager;
mod poll;

pub use error::{SessionError, SessionResult};
pub use manager::SessionManager;
pub use poll::PollOutcome;

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::engine::{SeatOutcome, SeatingEngine, SeatingError, SeatingStats, TableSummary};
use crate::gateway::*;
use crate::limits::*;
use crate::model::*;
use crate::notify::{NotifyHub, SessionEvent};
use crate::observability::*;
use crate::reconcile::{Diff, PendingDecision, ReconcileOutcome, Reconciler, Resolution, resolve_response};
use crate::suggest::{self, CapacityWarning, SuggestionOptions};

struct Debounce {
    seq: u64,
    handle: JoinHandle<()>,
}

struct SessionState {
    engine: SeatingEngine,
    reconciler: Reconciler,
    /// Newest `updatedAt` known to be reflected locally.
    last_seen: Option<Ms>,
    /// Bumped on every accepted edit.
    edit_seq: u64,
    /// `edit_seq` covered by the last successful push or remote replacement.
    saved_seq: u64,
    debounce: Option<Debounce>,
    /// Pushes claimed but not finished.
    pushes_pending: usize,
    closed: bool,
}

impl SessionState {
    fn has_pending_edit(&self) -> bool {
        self.debounce.is_some() || self.pushes_pending > 0
    }
}

pub(crate) struct SessionInner {
    event_id: String,
    config: SessionConfig,
    gateway: Arc<dyn SeatingGateway>,
    notify: Arc<NotifyHub>,
    state: Mutex<SessionState>,
    /// Serializes pushes so an older snapshot never lands after a newer one.
    push_gate: Mutex<()>,
    /// Serializes reconciliation runs and decision resolution.
    reconcile_gate: Mutex<()>,
    cancel: CancellationToken,
}

/// Result of a create-and-arrange run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangeReport {
    pub created: Vec<TableId>,
    pub warning: Option<CapacityWarning>,
}

impl SessionInner {
    fn writable(&self, st: &SessionState) -> SessionResult<()> {
        if st.closed {
            return Err(SessionError::Closed);
        }
        if self.config.read_only {
            return Err(SessionError::ReadOnly);
        }
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        self.notify.send(&self.event_id, event);
    }

    /// Map a gateway result, ending the session on an expired token.
    async fn gateway_result<T>(&self, result: GatewayResult<T>) -> SessionResult<T> {
        match result.map_err(SessionError::from) {
            Err(SessionError::AuthExpired) => {
                let mut st = self.state.lock().await;
                self.expire(&mut st);
                Err(SessionError::AuthExpired)
            }
            other => other,
        }
    }

    fn expire(&self, st: &mut SessionState) {
        if st.closed {
            return;
        }
        st.closed = true;
        if let Some(d) = st.debounce.take() {
            d.handle.abort();
        }
        self.cancel.cancel();
        metrics::counter!(AUTH_EXPIRED_TOTAL).increment(1);
        warn!(event = %self.event_id, "authentication expired, session ended");
        self.emit(SessionEvent::AuthExpired {
            redirect_after_ms: AUTH_REDIRECT_DELAY_MS,
        });
    }

    /// Rearm the debounce for the edit just applied.
    fn schedule_push(self: &Arc<Self>, st: &mut SessionState) {
        st.edit_seq += 1;
        if self.config.read_only || st.closed {
            return;
        }
        if let Some(old) = st.debounce.take() {
            old.handle.abort();
        }
        let seq = st.edit_seq;
        let delay = self.config.debounce;
        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.debounce_fired(seq).await;
        });
        st.debounce = Some(Debounce { seq, handle });
    }

    async fn debounce_fired(&self, seq: u64) {
        {
            let mut st = self.state.lock().await;
            if st.debounce.as_ref().is_none_or(|d| d.seq != seq) {
                return;
            }
            // Claimed: from here on nobody holds the handle to abort us.
            st.debounce = None;
            st.pushes_pending += 1;
        }
        if let Err(e) = self.push().await {
            debug!(event = %self.event_id, "debounced push failed: {e}");
        }
    }

    /// Push the current snapshot. The caller has already counted itself in
    /// `pushes_pending`.
    async fn push(&self) -> SessionResult<()> {
        let _gate = self.push_gate.lock().await;
        let (snapshot, seq) = {
            let mut st = self.state.lock().await;
            if st.edit_seq == st.saved_seq {
                st.pushes_pending -= 1;
                return Ok(());
            }
            let mut snapshot = st.engine.snapshot();
            snapshot.updated_at = Some(now_ms());
            snapshot.guest_fingerprint = st.reconciler.fingerprint().cloned();
            (snapshot, st.edit_seq)
        };

        let started = Instant::now();
        let result = self.gateway.push_snapshot(&self.event_id, &snapshot).await;
        metrics::histogram!(PUSH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        metrics::counter!(PUSHES_TOTAL, "status" => status_label(&result)).increment(1);

        let mut st = self.state.lock().await;
        st.pushes_pending -= 1;
        match result {
            Ok(ack) => {
                let updated_at = ack.or(snapshot.updated_at).unwrap_or_else(now_ms);
                st.last_seen = Some(st.last_seen.map_or(updated_at, |seen| seen.max(updated_at)));
                st.saved_seq = st.saved_seq.max(seq);
                debug!(event = %self.event_id, updated_at, "snapshot pushed");
                self.emit(SessionEvent::Saved { updated_at });
                Ok(())
            }
            Err(e) => {
                let e = SessionError::from(e);
                if matches!(e, SessionError::AuthExpired) {
                    self.expire(&mut st);
                } else {
                    // Local state stays authoritative until the next push or poll.
                    warn!(event = %self.event_id, "snapshot push failed: {e}");
                    self.emit(SessionEvent::SaveFailed { message: e.to_string() });
                }
                Err(e)
            }
        }
    }

    /// Diff the live roster against the fingerprint and resolve what can be
    /// resolved.
    async fn reconcile(self: &Arc<Self>) -> SessionResult<ReconcileOutcome> {
        let _gate = self.reconcile_gate.lock().await;
        {
            let st = self.state.lock().await;
            self.writable(&st)?;
        }
        let roster = self
            .gateway_result(self.gateway.fetch_roster(&self.event_id).await)
            .await?;

        let (diff, separated) = {
            let mut st = self.state.lock().await;
            self.writable(&st)?;
            let SessionState {
                engine, reconciler, ..
            } = &mut *st;
            engine.set_roster(roster.guests);
            (reconciler.begin(engine), engine.is_separated())
        };

        let outcome = match diff {
            Diff::Pending(pending) => ReconcileOutcome::AwaitingDecision(pending),
            Diff::Prime => {
                let mut st = self.state.lock().await;
                let SessionState {
                    engine, reconciler, ..
                } = &mut *st;
                let outcome = reconciler.finish_clean(engine);
                // Persist the new fingerprint alongside an existing layout.
                if st.engine.store().table_count() > 0 {
                    self.schedule_push(&mut st);
                }
                outcome
            }
            Diff::Clean => {
                let mut st = self.state.lock().await;
                let SessionState {
                    engine, reconciler, ..
                } = &mut *st;
                reconciler.finish_clean(engine)
            }
            Diff::Drift(events) => {
                let request = SyncProcessRequest {
                    triggers: events.clone(),
                    is_separated_seating: separated,
                };
                let response = self.gateway.process_sync(&self.event_id, &request).await;
                let response = match self.gateway_result(response).await {
                    Ok(r) => r,
                    Err(e) => {
                        self.state.lock().await.reconciler.abort();
                        warn!(event = %self.event_id, "reconciliation failed: {e}");
                        return Err(e);
                    }
                };
                let mut st = self.state.lock().await;
                match resolve_response(&events, response) {
                    Resolution::Apply(seating) => {
                        if let Some(seating) = seating {
                            st.engine.load_arrangement(&seating);
                            st.engine.refresh_all_names();
                        }
                        let SessionState {
                            engine, reconciler, ..
                        } = &mut *st;
                        let outcome = reconciler.finish_applied(engine, events);
                        self.schedule_push(&mut st);
                        outcome
                    }
                    Resolution::Decide(pending) => {
                        self.emit(SessionEvent::DecisionRequired {
                            decision: pending.clone(),
                        });
                        st.reconciler.await_decision(pending)
                    }
                }
            }
        };

        metrics::counter!(RECONCILE_RUNS_TOTAL, "outcome" => outcome.label()).increment(1);
        if let ReconcileOutcome::SafeChangesApplied { events } = &outcome {
            self.emit(SessionEvent::Reconciled {
                outcome: outcome.label(),
                changes: events.len(),
            });
        }
        Ok(outcome)
    }

    /// Adopt a server-side resolution of the pending decision.
    async fn resolve_decision(self: &Arc<Self>, seating: SeatingSnapshot) -> ReconcileOutcome {
        let mut st = self.state.lock().await;
        st.engine.load_arrangement(&seating);
        st.engine.refresh_all_names();
        let SessionState {
            engine, reconciler, ..
        } = &mut *st;
        let outcome = reconciler.finish_decision(engine);
        self.schedule_push(&mut st);
        metrics::counter!(RECONCILE_RUNS_TOTAL, "outcome" => outcome.label()).increment(1);
        self.emit(SessionEvent::Reconciled {
            outcome: outcome.label(),
            changes: 0,
        });
        outcome
    }
}

/// Handle to an open session. Dropping it stops the poller; call
/// [`close`](Self::close) to flush pending edits first.
pub struct SeatingSession {
    inner: Arc<SessionInner>,
}

impl SeatingSession {
    /// Load roster and snapshot, reconcile once if an arrangement exists,
    /// and start polling.
    pub async fn open(
        event_id: impl Into<String>,
        config: SessionConfig,
        gateway: Arc<dyn SeatingGateway>,
        notify: Arc<NotifyHub>,
    ) -> SessionResult<Self> {
        let event_id = event_id.into();
        if event_id.is_empty() {
            return Err(SessionError::InvalidEvent("empty event id"));
        }
        if event_id.len() > MAX_EVENT_ID_LEN {
            return Err(SessionError::InvalidEvent("event id too long"));
        }

        let (roster, snapshot) = tokio::try_join!(
            gateway.fetch_roster(&event_id),
            gateway.fetch_snapshot(&event_id)
        )?;

        let mut engine = SeatingEngine::new(config.table_label.clone(), roster.separated_seating);
        engine.set_roster(roster.guests);
        let mut last_seen = None;
        let mut fingerprint = None;
        let mut has_arrangement = false;
        if let Some(snapshot) = &snapshot {
            engine.load_snapshot(snapshot);
            last_seen = snapshot.updated_at;
            fingerprint = snapshot.guest_fingerprint.clone();
            has_arrangement = snapshot.has_arrangement();
        }
        info!(
            event = %event_id,
            guests = engine.guests().count(),
            tables = engine.store().table_count(),
            separated = engine.is_separated(),
            "seating session opened"
        );

        let inner = Arc::new(SessionInner {
            event_id,
            config,
            gateway,
            notify,
            state: Mutex::new(SessionState {
                engine,
                reconciler: Reconciler::new(fingerprint),
                last_seen,
                edit_seq: 0,
                saved_seq: 0,
                debounce: None,
                pushes_pending: 0,
                closed: false,
            }),
            push_gate: Mutex::new(()),
            reconcile_gate: Mutex::new(()),
            cancel: CancellationToken::new(),
        });

        if !inner.config.read_only {
            if has_arrangement {
                match inner.reconcile().await {
                    Ok(_) => {}
                    Err(SessionError::AuthExpired) => return Err(SessionError::AuthExpired),
                    Err(e) => warn!(event = %inner.event_id, "initial reconciliation failed: {e}"),
                }
            } else {
                let mut st = inner.state.lock().await;
                let SessionState {
                    engine, reconciler, ..
                } = &mut *st;
                if reconciler.fingerprint().is_none() {
                    reconciler.begin(engine);
                    reconciler.finish_clean(engine);
                }
            }
            tokio::spawn(poll::run_poller(Arc::clone(&inner)));
        }

        Ok(Self { inner })
    }

    pub fn event_id(&self) -> &str {
        &self.inner.event_id
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.notify.subscribe(&self.inner.event_id)
    }

    // ── Reads ────────────────────────────────────────────────

    /// Run a read-only closure against the engine.
    pub async fn read<T>(&self, f: impl FnOnce(&SeatingEngine) -> T) -> T {
        let st = self.inner.state.lock().await;
        f(&st.engine)
    }

    pub async fn snapshot(&self) -> SeatingSnapshot {
        self.read(|e| e.snapshot()).await
    }

    pub async fn table_summaries(&self) -> Vec<TableSummary> {
        self.read(|e| e.table_summaries()).await
    }

    pub async fn stats(&self) -> SeatingStats {
        self.read(|e| e.stats()).await
    }

    pub async fn unseated(&self) -> Vec<GuestRef> {
        self.read(|e| e.unseated()).await
    }

    pub async fn pending_decision(&self) -> Option<PendingDecision> {
        self.inner.state.lock().await.reconciler.pending().cloned()
    }

    /// Local edits not yet acknowledged by a push.
    pub async fn has_unsaved_changes(&self) -> bool {
        let st = self.inner.state.lock().await;
        st.edit_seq != st.saved_seq
    }

    // ── Edits ────────────────────────────────────────────────

    async fn mutate<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut SeatingEngine) -> Result<T, SeatingError>,
    ) -> SessionResult<T> {
        let mut st = self.inner.state.lock().await;
        self.inner.writable(&st)?;
        let result = f(&mut st.engine);
        metrics::counter!(OPERATIONS_TOTAL, "op" => op, "status" => status_label(&result)).increment(1);
        match result {
            Ok(value) => {
                self.inner.schedule_push(&mut st);
                Ok(value)
            }
            Err(e) => {
                debug!(event = %self.inner.event_id, op, "rejected: {e}");
                Err(e.into())
            }
        }
    }

    pub async fn seat(&self, guest: GuestRef, table_id: TableId) -> SessionResult<SeatOutcome> {
        self.mutate("seat", |e| e.seat(guest, table_id)).await
    }

    /// Idempotent; only an actual change is pushed.
    pub async fn unseat(&self, guest: GuestRef) -> SessionResult<Vec<TableId>> {
        let mut st = self.inner.state.lock().await;
        self.inner.writable(&st)?;
        let freed = st.engine.unseat(guest);
        metrics::counter!(OPERATIONS_TOTAL, "op" => "unseat", "status" => "ok").increment(1);
        if !freed.is_empty() {
            self.inner.schedule_push(&mut st);
        }
        Ok(freed)
    }

    pub async fn add_table(&self, spec: NewTable) -> SessionResult<TableId> {
        self.mutate("add_table", |e| e.add_table(spec)).await
    }

    pub async fn add_tables(&self, capacities: &[u32]) -> SessionResult<Vec<TableId>> {
        self.mutate("add_tables", |e| e.add_tables(capacities)).await
    }

    pub async fn confirm_table(&self, id: TableId) -> SessionResult<()> {
        self.mutate("confirm_table", |e| e.confirm_table(id)).await
    }

    pub async fn discard_draft(&self, id: TableId) -> SessionResult<Vec<GuestRef>> {
        self.mutate("discard_draft", |e| e.discard_draft(id)).await
    }

    pub async fn update_table(&self, id: TableId, update: TableUpdate) -> SessionResult<()> {
        self.mutate("update_table", |e| e.update_table(id, update)).await
    }

    pub async fn delete_table(&self, id: TableId) -> SessionResult<Vec<GuestRef>> {
        self.mutate("delete_table", |e| e.delete_table(id)).await
    }

    pub async fn migrate_table(&self, id: TableId, partition: Partition) -> SessionResult<()> {
        self.mutate("migrate_table", |e| e.migrate_table(id, partition)).await
    }

    /// Drop every table and arrangement and forget the fingerprint.
    pub async fn clear_all(&self) -> SessionResult<()> {
        let mut st = self.inner.state.lock().await;
        self.inner.writable(&st)?;
        st.engine.clear_all();
        st.reconciler.reset();
        metrics::counter!(OPERATIONS_TOTAL, "op" => "clear_all", "status" => "ok").increment(1);
        self.inner.schedule_push(&mut st);
        Ok(())
    }

    /// Returns how many must-sit-together pairs were dropped.
    pub async fn set_preferences(&self, preferences: Preferences) -> SessionResult<usize> {
        self.mutate("set_preferences", |e| Ok(e.set_preferences(preferences)))
            .await
    }

    pub async fn set_layout(&self, layout: Layout) -> SessionResult<()> {
        self.mutate("set_layout", |e| {
            e.set_layout(layout);
            Ok(())
        })
        .await
    }

    // ── Reconciliation ───────────────────────────────────────

    pub async fn reconcile(&self) -> SessionResult<ReconcileOutcome> {
        self.inner.reconcile().await
    }

    /// Resolve the pending decision with a server-proposed option.
    pub async fn apply_option(
        &self,
        option_id: impl Into<String>,
        custom_arrangement: Option<SeatingSnapshot>,
    ) -> SessionResult<ReconcileOutcome> {
        let inner = &self.inner;
        let _gate = inner.reconcile_gate.lock().await;
        let separated = {
            let st = inner.state.lock().await;
            inner.writable(&st)?;
            if st.reconciler.pending().is_none() {
                return Err(SessionError::NoPendingDecision);
            }
            st.engine.is_separated()
        };
        let request = ApplyOptionRequest {
            option_id: option_id.into(),
            custom_arrangement,
            is_separated_seating: separated,
        };
        let seating = inner
            .gateway_result(inner.gateway.apply_sync_option(&inner.event_id, &request).await)
            .await?;
        info!(event = %inner.event_id, option = %request.option_id, "sync option applied");
        Ok(inner.resolve_decision(seating).await)
    }

    /// Resolve the pending decision by unseating every affected guest.
    pub async fn move_to_unassigned(&self) -> SessionResult<ReconcileOutcome> {
        let inner = &self.inner;
        let _gate = inner.reconcile_gate.lock().await;
        let affected = {
            let st = inner.state.lock().await;
            inner.writable(&st)?;
            st.reconciler
                .pending()
                .map(|p| p.affected_guests.clone())
                .ok_or(SessionError::NoPendingDecision)?
        };
        let request = MoveToUnassignedRequest {
            affected_guest_ids: affected,
        };
        let seating = inner
            .gateway_result(inner.gateway.move_to_unassigned(&inner.event_id, &request).await)
            .await?;
        info!(
            event = %inner.event_id,
            guests = request.affected_guest_ids.len(),
            "affected guests moved to unassigned"
        );
        Ok(inner.resolve_decision(seating).await)
    }

    // ── Suggestions ──────────────────────────────────────────

    pub async fn capacity_warning(&self, planned: &[u32], options: SuggestionOptions) -> Option<CapacityWarning> {
        self.read(|e| suggest::capacity_warning(e, planned, options)).await
    }

    pub async fn suggest_tables(&self, options: SuggestionOptions) -> SessionResult<TablePlan> {
        let request = self.read(|e| suggest::suggest_request(e, options)).await;
        let plan = self
            .inner
            .gateway_result(self.inner.gateway.suggest_tables(&self.inner.event_id, &request).await)
            .await?;
        debug!(event = %self.inner.event_id, seats = plan.total_seats(), "table plan received");
        Ok(plan)
    }

    /// Create the planned tables, ask for an arrangement over the enlarged
    /// table set and adopt it. On failure the new tables are removed again.
    pub async fn create_and_arrange(
        &self,
        capacities: &[u32],
        options: SuggestionOptions,
    ) -> SessionResult<ArrangeReport> {
        let inner = &self.inner;
        let (batch, request, warning) = {
            let mut st = inner.state.lock().await;
            inner.writable(&st)?;
            let warning = suggest::capacity_warning(&st.engine, capacities, options);
            let batch = st.engine.add_tables(capacities)?;
            (batch, suggest::generate_request(&st.engine, options), warning)
        };

        let result = inner.gateway.generate_arrangement(&inner.event_id, &request).await;
        let generated = match inner.gateway_result(result).await {
            Ok(generated) => generated,
            Err(e) => {
                let mut st = inner.state.lock().await;
                suggest::rollback_batch(&mut st.engine, &batch);
                metrics::counter!(OPERATIONS_TOTAL, "op" => "create_and_arrange", "status" => "error")
                    .increment(1);
                return Err(e);
            }
        };

        let mut st = inner.state.lock().await;
        suggest::fold_generated(&mut st.engine, &generated, &batch);
        metrics::counter!(OPERATIONS_TOTAL, "op" => "create_and_arrange", "status" => "ok").increment(1);
        info!(
            event = %inner.event_id,
            created = batch.len(),
            seated = st.engine.store().seated_count(),
            "arrangement generated"
        );
        inner.schedule_push(&mut st);
        Ok(ArrangeReport {
            created: batch,
            warning,
        })
    }

    // ── Export ───────────────────────────────────────────────

    pub async fn export(&self, format: ExportFormat) -> SessionResult<serde_json::Value> {
        let request = self
            .read(|e| ExportRequest {
                seating: e.snapshot(),
                summaries: e.table_summaries(),
                guests: e.roster_snapshot(),
            })
            .await;
        self.inner
            .gateway_result(self.inner.gateway.export(&self.inner.event_id, format, &request).await)
            .await
    }

    // ── Polling ──────────────────────────────────────────────

    /// Run one poll now instead of waiting for the timer.
    pub async fn poll_now(&self) -> SessionResult<PollOutcome> {
        poll::poll_once(&self.inner).await
    }

    // ── Teardown ─────────────────────────────────────────────

    /// Stop polling and flush a pending edit.
    pub async fn close(&self) -> SessionResult<()> {
        let inner = &self.inner;
        inner.cancel.cancel();
        let flush = {
            let mut st = inner.state.lock().await;
            if st.closed {
                return Ok(());
            }
            st.closed = true;
            if let Some(d) = st.debounce.take() {
                d.handle.abort();
            }
            let dirty = st.edit_seq != st.saved_seq && !inner.config.read_only;
            if dirty {
                st.pushes_pending += 1;
            }
            dirty
        };
        let result = if flush { inner.push().await } else { Ok(()) };
        info!(event = %inner.event_id, flushed = flush, "seating session closed");
        inner.emit(SessionEvent::Closed);
        result
    }

    /// Stop polling and drop any pending edit unsent.
    pub async fn abort(&self) {
        let inner = &self.inner;
        inner.cancel.cancel();
        let mut st = inner.state.lock().await;
        if st.closed {
            return;
        }
        st.closed = true;
        if let Some(d) = st.debounce.take() {
            d.handle.abort();
        }
        info!(event = %inner.event_id, "seating session aborted");
        inner.emit(SessionEvent::Closed);
    }
}

impl Drop for SeatingSession {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}
