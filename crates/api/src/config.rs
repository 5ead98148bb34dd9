use std::time::Duration;

use remanet_core::maintenance::MaintenanceThresholds;
use remanet_core::thresholds::AlertThresholds;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In
/// production, override via environment variables. The threshold
/// defaults (10.0 across the board) are sample placeholders, not a
/// production calibration; operators are expected to supply real
/// limits per installation.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    /// Empty means "allow any origin" (dashboard development default).
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Interval between broadcast ticks (default: 1s).
    pub broadcast_interval: Duration,
    /// Alert limits for the threshold evaluator.
    pub alert_thresholds: AlertThresholds,
    /// Independent limits for the maintenance check.
    pub maintenance_thresholds: MaintenanceThresholds,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                             | Default   |
    /// |-------------------------------------|-----------|
    /// | `HOST`                              | `0.0.0.0` |
    /// | `PORT`                              | `8000`    |
    /// | `CORS_ORIGINS`                      | (any)     |
    /// | `REQUEST_TIMEOUT_SECS`              | `30`      |
    /// | `BROADCAST_INTERVAL_SECS`           | `1`       |
    /// | `MAX_T_GUN`                         | `10.0`    |
    /// | `MAX_P_GUN`                         | `10.0`    |
    /// | `MAX_Q_PG_N2`                       | `10.0`    |
    /// | `MAX_V_PARTICULE`                   | `10.0`    |
    /// | `T_GUN_MAINTENANCE_THRESHOLD`       | `10.0`    |
    /// | `P_GUN_MAINTENANCE_THRESHOLD`       | `10.0`    |
    /// | `Q_PG_N2_MAINTENANCE_THRESHOLD`     | `10.0`    |
    /// | `V_PARTICULE_MAINTENANCE_THRESHOLD` | `10.0`    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let broadcast_interval_secs: u64 = std::env::var("BROADCAST_INTERVAL_SECS")
            .unwrap_or_else(|_| "1".into())
            .parse()
            .expect("BROADCAST_INTERVAL_SECS must be a valid u64");

        let alert_thresholds = AlertThresholds {
            t_gun: env_f64("MAX_T_GUN"),
            p_gun: env_f64("MAX_P_GUN"),
            q_pg_n2: env_f64("MAX_Q_PG_N2"),
            v_particule: env_f64("MAX_V_PARTICULE"),
        };

        let maintenance_thresholds = MaintenanceThresholds {
            t_gun: env_f64("T_GUN_MAINTENANCE_THRESHOLD"),
            p_gun: env_f64("P_GUN_MAINTENANCE_THRESHOLD"),
            q_pg_n2: env_f64("Q_PG_N2_MAINTENANCE_THRESHOLD"),
            v_particule: env_f64("V_PARTICULE_MAINTENANCE_THRESHOLD"),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            broadcast_interval: Duration::from_secs(broadcast_interval_secs),
            alert_thresholds,
            maintenance_thresholds,
        }
    }
}

/// Sample placeholder limit used when a threshold variable is unset.
const DEFAULT_THRESHOLD: f64 = 10.0;

fn env_f64(name: &str) -> f64 {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid f64")),
        Err(_) => DEFAULT_THRESHOLD,
    }
}
