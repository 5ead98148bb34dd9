use std::sync::Arc;

use remanet_db::{DbPool, TelemetrySource};

use crate::config::ServerConfig;
use crate::ws::{Broadcaster, WsRegistry};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection registry.
    pub registry: Arc<WsRegistry>,
    /// Telemetry read source with synthetic fallback.
    pub source: Arc<dyn TelemetrySource>,
    /// Periodic broadcast engine.
    pub broadcaster: Broadcaster,
}
