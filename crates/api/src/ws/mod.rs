//! WebSocket infrastructure: connection registry, periodic broadcast
//! engine and the per-connection upgrade handler.

pub mod broadcast;
pub mod handler;
pub mod registry;

pub use broadcast::Broadcaster;
pub use handler::ws_handler;
pub use registry::{RegistryError, WsRegistry};
