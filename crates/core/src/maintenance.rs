//! Predictive-maintenance check.
//!
//! A stateless, instantaneous decision over the most recent reading of
//! the current batch. This is deliberately not a trend detector: no
//! history is kept between cycles.

use crate::telemetry::Reading;

/// Maintenance limits for the four monitored cold-spray fields.
///
/// A separate set from [`AlertThresholds`](crate::thresholds::AlertThresholds);
/// exceeding an alert limit does not imply a maintenance signal or
/// vice versa.
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceThresholds {
    pub t_gun: f64,
    pub p_gun: f64,
    pub q_pg_n2: f64,
    pub v_particule: f64,
}

/// Decide whether maintenance is required based on the latest reading
/// of the batch.
///
/// Returns `false` for an empty batch. Otherwise only the last (most
/// recent) reading is inspected: `true` iff any monitored field
/// strictly exceeds its maintenance limit.
pub fn maintenance_required(readings: &[Reading], limits: &MaintenanceThresholds) -> bool {
    let Some(latest) = readings.last() else {
        return false;
    };

    latest.t_gun > limits.t_gun
        || latest.p_gun > limits.p_gun
        || latest.q_pg_n2 > limits.q_pg_n2
        || latest.v_particule > limits.v_particule
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn limits() -> MaintenanceThresholds {
        MaintenanceThresholds {
            t_gun: 10.0,
            p_gun: 10.0,
            q_pg_n2: 10.0,
            v_particule: 10.0,
        }
    }

    fn reading(t_gun: f64) -> Reading {
        Reading {
            time: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            t_gun,
            p_gun: 0.0,
            q_pg_n2: 0.0,
            v_particule: 0.0,
            q_cg_pf1: 0.0,
            q_cg_pf2: 0.0,
        }
    }

    #[test]
    fn empty_batch_is_false() {
        assert!(!maintenance_required(&[], &limits()));
    }

    #[test]
    fn only_the_last_reading_matters() {
        // Violations in earlier readings are ignored.
        let early_violation = vec![reading(99.0), reading(1.0)];
        assert!(!maintenance_required(&early_violation, &limits()));

        // Two batches identical except for non-last readings agree.
        let a = vec![reading(1.0), reading(11.0)];
        let b = vec![reading(50.0), reading(2.0), reading(11.0)];
        assert_eq!(
            maintenance_required(&a, &limits()),
            maintenance_required(&b, &limits())
        );
    }

    #[test]
    fn any_exceeded_field_triggers_the_signal() {
        let mut r = reading(0.0);
        r.v_particule = 10.5;
        assert!(maintenance_required(&[r], &limits()));
    }

    #[test]
    fn at_the_limit_is_not_a_violation() {
        assert!(!maintenance_required(&[reading(10.0)], &limits()));
    }

    #[test]
    fn maintenance_limits_are_independent_of_alert_limits() {
        // A reading past the alert limit but under the maintenance
        // limit must not trigger the signal.
        let loose = MaintenanceThresholds {
            t_gun: 100.0,
            p_gun: 100.0,
            q_pg_n2: 100.0,
            v_particule: 100.0,
        };
        assert!(!maintenance_required(&[reading(50.0)], &loose));
    }
}
