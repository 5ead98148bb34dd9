//! Tests for the broadcast engine and the one-shot push path.
//!
//! A mock `TelemetrySource` with a fetch counter stands in for the
//! database so ticks can be driven directly, without timers or
//! sockets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::Message;
use chrono::{NaiveDate, Utc};
use remanet_api::ws::broadcast::push_snapshot;
use remanet_api::ws::{Broadcaster, WsRegistry};
use remanet_core::maintenance::MaintenanceThresholds;
use remanet_core::telemetry::{AudioSample, MicChannel, Reading};
use remanet_core::thresholds::AlertThresholds;
use remanet_db::TelemetrySource;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

/// Telemetry source serving a fixed batch, counting cold-spray
/// fetches and remembering the last filter it was asked for.
struct MockSource {
    cold_spray: Vec<Reading>,
    fetch_count: AtomicUsize,
    last_filter: Mutex<Option<Option<NaiveDate>>>,
}

impl MockSource {
    fn new(cold_spray: Vec<Reading>) -> Self {
        Self {
            cold_spray,
            fetch_count: AtomicUsize::new(0),
            last_filter: Mutex::new(None),
        }
    }

    fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    fn last_filter(&self) -> Option<Option<NaiveDate>> {
        *self.last_filter.lock().unwrap()
    }
}

#[async_trait]
impl TelemetrySource for MockSource {
    async fn fetch_cold_spray(&self, filter_date: Option<NaiveDate>) -> Vec<Reading> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        *self.last_filter.lock().unwrap() = Some(filter_date);
        self.cold_spray.clone()
    }

    async fn fetch_microphone(
        &self,
        channel: MicChannel,
        _filter_date: Option<NaiveDate>,
    ) -> Vec<AudioSample> {
        vec![AudioSample {
            timestamp: Utc::now(),
            data: "AACAPw==".into(),
            mic_id: channel,
        }]
    }
}

fn reading(t_gun: f64) -> Reading {
    Reading {
        time: Utc::now(),
        t_gun,
        p_gun: 1.0,
        q_pg_n2: 1.0,
        v_particule: 1.0,
        q_cg_pf1: 1.0,
        q_cg_pf2: 1.0,
    }
}

fn limits() -> (AlertThresholds, MaintenanceThresholds) {
    (
        AlertThresholds {
            t_gun: 10.0,
            p_gun: 10.0,
            q_pg_n2: 10.0,
            v_particule: 10.0,
        },
        MaintenanceThresholds {
            t_gun: 10.0,
            p_gun: 10.0,
            q_pg_n2: 10.0,
            v_particule: 10.0,
        },
    )
}

fn build(registry: &Arc<WsRegistry>, source: &Arc<MockSource>) -> Broadcaster {
    let (alert, maintenance) = limits();
    Broadcaster::new(
        Arc::clone(registry),
        Arc::clone(source) as Arc<dyn TelemetrySource>,
        alert,
        maintenance,
        Duration::from_secs(3600),
    )
}

/// Drain everything currently queued on a connection channel.
fn drain(rx: &mut UnboundedReceiver<Message>) -> Vec<serde_json::Value> {
    let mut frames = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let Message::Text(text) = msg {
            frames.push(serde_json::from_str(text.as_str()).expect("frame should be JSON"));
        }
    }
    frames
}

// ---------------------------------------------------------------------------
// Test: a tick with zero live connections performs no fetch and sends
// nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tick_with_no_connections_skips_fetch() {
    let registry = Arc::new(WsRegistry::new());
    let source = Arc::new(MockSource::new(vec![reading(1.0)]));
    let broadcaster = build(&registry, &source);

    broadcaster.tick().await;

    assert_eq!(source.fetches(), 0);
}

// ---------------------------------------------------------------------------
// Test: with only filtered connections no fetch happens, but the
// keepalive ping still goes out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tick_with_only_filtered_connections_skips_fetch_but_pings() {
    let registry = Arc::new(WsRegistry::new());
    let source = Arc::new(MockSource::new(vec![reading(1.0)]));
    let broadcaster = build(&registry, &source);

    let conn_id = Uuid::new_v4();
    let mut rx = registry.register(conn_id).await.unwrap();
    registry
        .set_filter(conn_id, Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
        .await
        .unwrap();

    broadcaster.tick().await;

    assert_eq!(source.fetches(), 0);

    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "ping");
    assert!(frames[0]["timestamp"].is_string());
}

// ---------------------------------------------------------------------------
// Test: the payload triple goes only to live connections, in order,
// and every connection gets a ping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tick_sends_triple_to_live_and_ping_to_all() {
    let registry = Arc::new(WsRegistry::new());
    let source = Arc::new(MockSource::new(vec![reading(11.5)]));
    let broadcaster = build(&registry, &source);

    let live_id = Uuid::new_v4();
    let filtered_id = Uuid::new_v4();
    let mut live_rx = registry.register(live_id).await.unwrap();
    let mut filtered_rx = registry.register(filtered_id).await.unwrap();
    registry
        .set_filter(filtered_id, Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
        .await
        .unwrap();

    broadcaster.tick().await;

    assert_eq!(source.fetches(), 1);
    // Periodic ticks always use the live window.
    assert_eq!(source.last_filter(), Some(None));

    // Live connection: combined, notifications, maintenance, ping.
    let frames = drain(&mut live_rx);
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[0]["cold_spray"][0]["T_gun"], 11.5);
    assert_eq!(frames[0]["micro_0"][0]["mic_id"], "micro_0");
    assert_eq!(frames[0]["micro_1"][0]["mic_id"], "micro_1");
    assert_eq!(frames[1]["notifications"][0]["parameter"], "T_gun");
    assert_eq!(frames[2]["maintenance_required"], true);
    assert_eq!(frames[3]["type"], "ping");

    // Filtered connection: keepalive only.
    let frames = drain(&mut filtered_rx);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "ping");
}

// ---------------------------------------------------------------------------
// Test: a clean batch produces an empty notifications payload and no
// maintenance signal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clean_batch_broadcasts_no_violations() {
    let registry = Arc::new(WsRegistry::new());
    let source = Arc::new(MockSource::new(vec![reading(1.0), reading(2.0)]));
    let broadcaster = build(&registry, &source);

    let mut rx = registry.register(Uuid::new_v4()).await.unwrap();

    broadcaster.tick().await;

    let frames = drain(&mut rx);
    assert_eq!(frames[1]["notifications"].as_array().unwrap().len(), 0);
    assert_eq!(frames[2]["maintenance_required"], false);
}

// ---------------------------------------------------------------------------
// Test: a send failure removes only the offending connection; others
// are still served in the same tick
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_failure_removes_only_the_offending_connection() {
    let registry = Arc::new(WsRegistry::new());
    let source = Arc::new(MockSource::new(vec![reading(1.0)]));
    let broadcaster = build(&registry, &source);

    let failing_id = Uuid::new_v4();
    let healthy_id = Uuid::new_v4();
    let failing_rx = registry.register(failing_id).await.unwrap();
    let mut healthy_rx = registry.register(healthy_id).await.unwrap();

    // Dropping the receiver makes every send on this channel fail.
    drop(failing_rx);

    broadcaster.tick().await;

    assert_eq!(registry.connection_count().await, 1);
    assert!(registry.sender_of(failing_id).await.is_none());

    let frames = drain(&mut healthy_rx);
    assert_eq!(frames.len(), 4);
    assert!(frames[0]["cold_spray"].is_array());
    assert_eq!(frames[3]["type"], "ping");
}

// ---------------------------------------------------------------------------
// Test: start() and stop() are idempotent state transitions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_and_stop_are_idempotent() {
    let registry = Arc::new(WsRegistry::new());
    let source = Arc::new(MockSource::new(vec![]));
    let broadcaster = build(&registry, &source);

    assert!(!broadcaster.is_running());

    broadcaster.start();
    broadcaster.start();
    assert!(broadcaster.is_running());

    broadcaster.stop();
    assert!(!broadcaster.is_running());
    broadcaster.stop();
    assert!(!broadcaster.is_running());

    // The engine can be restarted after a stop.
    broadcaster.start();
    assert!(broadcaster.is_running());
    broadcaster.stop();
}

// ---------------------------------------------------------------------------
// Test: a one-shot push uses the connection's new filter and delivers
// the triple immediately, independent of the tick timer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_shot_push_uses_the_requested_filter() {
    let registry = Arc::new(WsRegistry::new());
    let source = Arc::new(MockSource::new(vec![reading(3.0)]));
    let (alert, maintenance) = limits();

    let conn_id = Uuid::new_v4();
    let mut rx = registry.register(conn_id).await.unwrap();
    let filter = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    registry.set_filter(conn_id, Some(filter)).await.unwrap();

    let sender = registry.sender_of(conn_id).await.unwrap();
    let delivered = push_snapshot(
        source.as_ref(),
        &alert,
        &maintenance,
        Some(filter),
        &sender,
    )
    .await;

    assert!(delivered);
    assert_eq!(source.last_filter(), Some(Some(filter)));

    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 3);
    assert!(frames[0]["cold_spray"].is_array());
    assert!(frames[1]["notifications"].is_array());
    assert!(frames[2]["maintenance_required"].is_boolean());
}

// ---------------------------------------------------------------------------
// Test: a one-shot push to a closed channel reports failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_shot_push_to_closed_channel_fails() {
    let registry = Arc::new(WsRegistry::new());
    let source = Arc::new(MockSource::new(vec![]));
    let (alert, maintenance) = limits();

    let conn_id = Uuid::new_v4();
    let rx = registry.register(conn_id).await.unwrap();
    let sender = registry.sender_of(conn_id).await.unwrap();
    drop(rx);

    let delivered = push_snapshot(source.as_ref(), &alert, &maintenance, None, &sender).await;

    assert!(!delivered);
}
