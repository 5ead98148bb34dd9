//! Threshold evaluation for cold-spray readings.
//!
//! Pure logic, no I/O. The caller fetches the batch and supplies the
//! configured limits; this module only decides which notifications to
//! emit.

use serde::Serialize;

use crate::telemetry::Reading;
use crate::types::Timestamp;

/// Severity of a threshold violation. Currently only warnings are
/// produced; the enum leaves room for an escalation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Warning,
}

/// A single threshold violation, generated fresh per evaluation and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Severity marker, serialized as `type`.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Wire name of the exceeded field (`T_gun`, `P_gun`, ...).
    pub parameter: &'static str,
    /// The observed value that triggered the notification.
    pub value: f64,
    /// The configured limit that was exceeded.
    pub threshold: f64,
    /// Timestamp of the offending reading.
    pub timestamp: Timestamp,
    /// Human-readable description.
    pub message: String,
}

/// Alert limits for the four monitored cold-spray fields.
///
/// Distinct from [`MaintenanceThresholds`](crate::maintenance::MaintenanceThresholds);
/// the two sets are configured independently.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertThresholds {
    pub t_gun: f64,
    pub p_gun: f64,
    pub q_pg_n2: f64,
    pub v_particule: f64,
}

/// Evaluate a batch of readings against the alert limits.
///
/// Readings are visited in input order and, within a reading, the
/// monitored fields are checked in the fixed order `T_gun`, `P_gun`,
/// `Q_PG_N2`, `V_Particule`. Every strict exceedance produces one
/// [`Notification`]; repeated violations across readings are not
/// deduplicated.
pub fn evaluate(readings: &[Reading], limits: &AlertThresholds) -> Vec<Notification> {
    let mut notifications = Vec::new();

    for reading in readings {
        check_field("T_gun", reading.t_gun, limits.t_gun, reading.time, &mut notifications);
        check_field("P_gun", reading.p_gun, limits.p_gun, reading.time, &mut notifications);
        check_field("Q_PG_N2", reading.q_pg_n2, limits.q_pg_n2, reading.time, &mut notifications);
        check_field(
            "V_Particule",
            reading.v_particule,
            limits.v_particule,
            reading.time,
            &mut notifications,
        );
    }

    notifications
}

/// Emit a warning notification if `value` strictly exceeds `limit`.
fn check_field(
    parameter: &'static str,
    value: f64,
    limit: f64,
    timestamp: Timestamp,
    out: &mut Vec<Notification>,
) {
    if value > limit {
        out.push(Notification {
            kind: NotificationKind::Warning,
            parameter,
            value,
            threshold: limit,
            timestamp,
            message: format!("{parameter} exceeded maximum threshold: {value} > {limit}"),
        });
    }
}
