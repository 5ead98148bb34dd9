//! HTTP route modules.

pub mod data;
pub mod health;
