//! Remanet domain logic.
//!
//! Pure types and functions shared by the API server, the persistence
//! layer and the ingestion tool: cold-spray readings, microphone
//! samples, the WebSocket wire protocol, threshold alerting, the
//! predictive-maintenance check and synthetic fallback data. No I/O
//! happens in this crate.

pub mod maintenance;
pub mod protocol;
pub mod synth;
pub mod telemetry;
pub mod thresholds;
pub mod types;
