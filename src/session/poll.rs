use std::sync::Arc;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::model::Ms;
use crate::notify::SessionEvent;
use crate::observability::POLLS_TOTAL;

use super::{SessionError, SessionInner, SessionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing newer than what we last saw or pushed.
    Unchanged,
    /// A newer snapshot exists but a local edit is pending; ours wins.
    SkippedPendingEdit,
    Replaced { updated_at: Ms },
}

impl PollOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PollOutcome::Unchanged => "unchanged",
            PollOutcome::SkippedPendingEdit => "skipped",
            PollOutcome::Replaced { .. } => "replaced",
        }
    }
}

/// Background task that adopts newer remote snapshots until the session is
/// cancelled.
pub(super) async fn run_poller(inner: Arc<SessionInner>) {
    let period = inner.config.poll_interval;
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        match poll_once(&inner).await {
            Ok(outcome) => {
                metrics::counter!(POLLS_TOTAL, "outcome" => outcome.label()).increment(1);
            }
            Err(SessionError::AuthExpired) => break,
            Err(e) => {
                metrics::counter!(POLLS_TOTAL, "outcome" => "error").increment(1);
                warn!(event = %inner.event_id, "poll failed: {e}");
            }
        }
    }
    debug!(event = %inner.event_id, "poller stopped");
}

pub(super) async fn poll_once(inner: &Arc<SessionInner>) -> SessionResult<PollOutcome> {
    let remote = inner
        .gateway_result(inner.gateway.fetch_snapshot(&inner.event_id).await)
        .await?;
    let Some(remote) = remote else {
        return Ok(PollOutcome::Unchanged);
    };
    let Some(updated_at) = remote.updated_at else {
        return Ok(PollOutcome::Unchanged);
    };

    {
        let mut st = inner.state.lock().await;
        if st.closed || st.last_seen.is_some_and(|seen| updated_at <= seen) {
            return Ok(PollOutcome::Unchanged);
        }
        if st.has_pending_edit() {
            debug!(event = %inner.event_id, updated_at, "remote snapshot newer, local edit pending");
            return Ok(PollOutcome::SkippedPendingEdit);
        }
        st.engine.load_snapshot(&remote);
        if remote.guest_fingerprint.is_some() {
            st.reconciler.set_fingerprint(remote.guest_fingerprint.clone());
        }
        st.last_seen = Some(updated_at);
        // Anything unsent was overwritten.
        st.saved_seq = st.edit_seq;
        info!(event = %inner.event_id, updated_at, "remote snapshot applied");
    }
    inner.emit(SessionEvent::RemoteApplied { updated_at });

    if !inner.config.read_only
        && let Err(e) = inner.reconcile().await
    {
        warn!(event = %inner.event_id, "reconciliation after remote change failed: {e}");
    }
    Ok(PollOutcome::Replaced { updated_at })
}
