use std::sync::Arc;

use tracing::info;

use seatplan::config::SessionConfig;
use seatplan::gateway::HttpGateway;
use seatplan::notify::SessionEvent;
use seatplan::session::SessionManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("SEATPLAN_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    seatplan::observability::init(metrics_port)?;

    if std::env::var("SEATPLAN_API_URL").is_err() {
        return Err("SEATPLAN_API_URL is required".into());
    }
    let event_id = std::env::var("SEATPLAN_EVENT_ID").map_err(|_| "SEATPLAN_EVENT_ID is required")?;
    let config = SessionConfig::from_env();

    info!("seatplan session daemon");
    info!("  api: {}", config.base_url);
    info!("  event: {event_id}");
    info!("  debounce: {:?}, poll: {:?}", config.debounce, config.poll_interval);
    info!("  read_only: {}", config.read_only);
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    let gateway = Arc::new(HttpGateway::new(&config)?);
    let manager = SessionManager::new(gateway, config);

    // Subscribe before opening so the initial reconciliation is visible.
    let mut events = manager.subscribe(&event_id)?;
    let session = manager.open(&event_id).await?;
    let stats = session.stats().await;
    info!(
        "loaded {} tables, {}/{} seats filled, {} over capacity",
        stats.tables, stats.seated, stats.needed, stats.over_capacity_tables
    );

    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(SessionEvent::AuthExpired { redirect_after_ms }) => {
                    tracing::error!("authentication expired, re-authenticate within {redirect_after_ms}ms");
                    break;
                }
                Ok(SessionEvent::DecisionRequired { decision }) => {
                    tracing::warn!(
                        "decision required for {} guests: {}",
                        decision.affected_guests.len(),
                        decision.message
                    );
                }
                Ok(event) => info!(?event, "session event"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("dropped {n} session events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = &mut shutdown => {
                info!("shutdown signal received, closing sessions");
                break;
            }
        }
    }

    manager.close_all().await;
    info!("seatplan stopped");
    Ok(())
}
