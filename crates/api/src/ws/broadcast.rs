//! Periodic broadcast engine.
//!
//! One engine per process, shared by every connection. Each tick
//! fetches fresh telemetry through the [`TelemetrySource`], runs the
//! two evaluators and fans the resulting payload triple out to every
//! connection still in live mode, then sends a keepalive ping to all
//! connections. Per-connection send failures remove that connection
//! only; fetch or serialization failures are logged and the engine
//! proceeds to the next tick.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::Message;
use chrono::NaiveDate;
use remanet_core::maintenance::{self, MaintenanceThresholds};
use remanet_core::protocol::{CombinedData, Heartbeat, MaintenancePayload, NotificationsPayload};
use remanet_core::telemetry::MicChannel;
use remanet_core::thresholds::{self, AlertThresholds};
use remanet_db::TelemetrySource;
use tokio::sync::mpsc::error::SendError;
use tokio_util::sync::CancellationToken;

use crate::ws::registry::{WsRegistry, WsSender};

/// The serialized payload triple sent to live connections, in its
/// fixed delivery order: combined data, notifications, maintenance.
type FrameTriple = [String; 3];

/// Drives the periodic broadcast cycle.
///
/// Two states: idle (no periodic task) and running. [`start`] and
/// [`stop`] are both idempotent, so any number of connection events
/// may attempt to ensure the engine is active without spawning
/// duplicate timers. The handle is cheaply cloneable; all clones
/// control the same engine.
///
/// [`start`]: Broadcaster::start
/// [`stop`]: Broadcaster::stop
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Arc<WsRegistry>,
    source: Arc<dyn TelemetrySource>,
    alert_thresholds: AlertThresholds,
    maintenance_thresholds: MaintenanceThresholds,
    interval: Duration,
    /// Cancellation token of the running tick loop; `None` when idle.
    running: Mutex<Option<CancellationToken>>,
}

impl Broadcaster {
    /// Create an idle engine.
    pub fn new(
        registry: Arc<WsRegistry>,
        source: Arc<dyn TelemetrySource>,
        alert_thresholds: AlertThresholds,
        maintenance_thresholds: MaintenanceThresholds,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                source,
                alert_thresholds,
                maintenance_thresholds,
                interval,
                running: Mutex::new(None),
            }),
        }
    }

    /// Start the periodic task; the first tick fires after one
    /// interval. No-op if the engine is already running.
    pub fn start(&self) {
        let mut running = self.inner.running.lock().expect("broadcaster lock poisoned");
        if let Some(token) = running.as_ref() {
            if !token.is_cancelled() {
                return;
            }
        }

        let token = CancellationToken::new();
        *running = Some(token.clone());

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run(token).await;
        });
        tracing::info!(interval = ?self.inner.interval, "Broadcast engine started");
    }

    /// Cancel the pending tick and return to idle. In-flight sends
    /// from the current tick complete naturally. No-op when idle.
    pub fn stop(&self) {
        let mut running = self.inner.running.lock().expect("broadcaster lock poisoned");
        if let Some(token) = running.take() {
            token.cancel();
            tracing::info!("Broadcast engine stopped");
        }
    }

    /// Whether the periodic task is currently active.
    pub fn is_running(&self) -> bool {
        self.inner
            .running
            .lock()
            .expect("broadcaster lock poisoned")
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Execute one broadcast cycle.
    ///
    /// Public so tests can drive the engine without waiting on the
    /// timer.
    pub async fn tick(&self) {
        self.inner.tick().await;
    }
}

impl Inner {
    /// The tick loop, cancelled via `token`.
    async fn run(self: Arc<Self>, token: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        // The first interval tick completes immediately; consume it so
        // the first broadcast happens one interval after start().
        interval.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => self.tick().await,
            }
        }
    }

    /// One broadcast cycle.
    async fn tick(&self) {
        // With no live connections there is nothing to fetch.
        if !self.registry.live_connections().await.is_empty() {
            match build_frames(
                self.source.as_ref(),
                &self.alert_thresholds,
                &self.maintenance_thresholds,
                None,
            )
            .await
            {
                Ok(frames) => {
                    // Re-read the snapshot at send time: a connection may
                    // have filtered itself (or disconnected) while the
                    // fetch was in flight.
                    for (conn_id, sender) in self.registry.live_connections().await {
                        if send_frames(&sender, &frames).is_err() {
                            tracing::warn!(%conn_id, "Send failed, unregistering connection");
                            self.registry.unregister(conn_id).await;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Broadcast tick failed to build payloads");
                }
            }
        }

        // Keepalive goes to every connection, filtered ones included.
        let ping = match serde_json::to_string(&Heartbeat::ping_now()) {
            Ok(ping) => ping,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize keepalive ping");
                return;
            }
        };
        for (conn_id, sender) in self.registry.all_connections().await {
            if sender.send(Message::Text(ping.clone().into())).is_err() {
                tracing::warn!(%conn_id, "Keepalive failed, unregistering connection");
                self.registry.unregister(conn_id).await;
            }
        }
    }
}

/// Fetch, evaluate and serialize one payload triple for the given
/// filter.
///
/// Shared between the periodic tick (filter `None`) and the one-shot
/// push a connection receives on connect or after a filter update.
pub async fn build_frames(
    source: &dyn TelemetrySource,
    alert_thresholds: &AlertThresholds,
    maintenance_thresholds: &MaintenanceThresholds,
    filter_date: Option<NaiveDate>,
) -> Result<FrameTriple, serde_json::Error> {
    let cold_spray = source.fetch_cold_spray(filter_date).await;
    let micro_0 = source.fetch_microphone(MicChannel::Micro0, filter_date).await;
    let micro_1 = source.fetch_microphone(MicChannel::Micro1, filter_date).await;

    let notifications = thresholds::evaluate(&cold_spray, alert_thresholds);
    let maintenance_required =
        maintenance::maintenance_required(&cold_spray, maintenance_thresholds);

    let combined = serde_json::to_string(&CombinedData {
        cold_spray,
        micro_0,
        micro_1,
    })?;
    let notifications = serde_json::to_string(&NotificationsPayload { notifications })?;
    let maintenance = serde_json::to_string(&MaintenancePayload {
        maintenance_required,
    })?;

    Ok([combined, notifications, maintenance])
}

/// Queue the payload triple on one connection's channel, preserving
/// the combined → notifications → maintenance order.
///
/// An error means the connection's receive loop is gone; the caller
/// unregisters it.
pub fn send_frames(sender: &WsSender, frames: &FrameTriple) -> Result<(), SendError<Message>> {
    for frame in frames {
        sender.send(Message::Text(frame.clone().into()))?;
    }
    Ok(())
}

/// One-shot fetch-evaluate-send cycle scoped to a single connection.
///
/// Returns `false` when the connection could not be served (send
/// channel closed or serialization failure).
pub async fn push_snapshot(
    source: &dyn TelemetrySource,
    alert_thresholds: &AlertThresholds,
    maintenance_thresholds: &MaintenanceThresholds,
    filter_date: Option<NaiveDate>,
    sender: &WsSender,
) -> bool {
    match build_frames(source, alert_thresholds, maintenance_thresholds, filter_date).await {
        Ok(frames) => send_frames(sender, &frames).is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build one-shot payloads");
            false
        }
    }
}
