//! The read abstraction consumed by the broadcast engine.
//!
//! [`TelemetrySource`] is infallible by contract: storage errors and
//! empty windows fall back to synthetic data inside the adapter, so
//! downstream components never observe a storage failure as a hard
//! error. This trades freshness for availability, which is the right
//! call for a live dashboard.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use remanet_core::synth;
use remanet_core::telemetry::{AudioSample, MicChannel, Reading};
use remanet_core::types::Timestamp;

use crate::repositories::{ColdSprayRepo, MicrophoneRepo};
use crate::DbPool;

/// Lookback for the live (unfiltered) query window.
const LIVE_WINDOW_SECS: i64 = 3600;

/// Uniform read interface over persisted sensor batches.
///
/// `filter_date = Some(d)` selects `[d 00:00, d+1 00:00)`; `None`
/// selects the sliding live window of the last hour. Results are
/// ascending by time.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch a cold-spray batch (at most 5000 readings).
    async fn fetch_cold_spray(&self, filter_date: Option<NaiveDate>) -> Vec<Reading>;

    /// Fetch waveform snapshots for one microphone channel (at most 10).
    async fn fetch_microphone(
        &self,
        channel: MicChannel,
        filter_date: Option<NaiveDate>,
    ) -> Vec<AudioSample>;
}

/// Compute the query window for an optional date filter.
///
/// Returns `(start, end)` where `end = None` means unbounded.
pub fn query_window(filter_date: Option<NaiveDate>) -> (Timestamp, Option<Timestamp>) {
    match filter_date {
        Some(date) => {
            let start = date.and_time(NaiveTime::MIN).and_utc();
            let end = start + chrono::Duration::days(1);
            (start, Some(end))
        }
        None => (
            Utc::now() - chrono::Duration::seconds(LIVE_WINDOW_SECS),
            None,
        ),
    }
}

/// Postgres-backed [`TelemetrySource`] with synthetic fallback.
pub struct PgTelemetrySource {
    pool: DbPool,
}

impl PgTelemetrySource {
    /// Create a source reading from the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TelemetrySource for PgTelemetrySource {
    async fn fetch_cold_spray(&self, filter_date: Option<NaiveDate>) -> Vec<Reading> {
        let (start, end) = query_window(filter_date);

        let rows = match ColdSprayRepo::fetch_window(&self.pool, start, end).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "Cold-spray query failed, using sample data");
                return synth::sample_cold_spray();
            }
        };

        if rows.is_empty() {
            tracing::debug!(?filter_date, "No cold-spray rows in window, using sample data");
            return synth::sample_cold_spray();
        }

        tracing::debug!(count = rows.len(), "Retrieved cold-spray readings");
        rows.into_iter().map(Reading::from).collect()
    }

    async fn fetch_microphone(
        &self,
        channel: MicChannel,
        filter_date: Option<NaiveDate>,
    ) -> Vec<AudioSample> {
        let (start, end) = query_window(filter_date);

        let rows = match MicrophoneRepo::fetch_window(&self.pool, channel, start, end).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, %channel, "Microphone query failed, using sample data");
                return vec![synth::sample_waveform(channel)];
            }
        };

        if rows.is_empty() {
            tracing::debug!(%channel, ?filter_date, "No microphone rows in window, using sample data");
            return vec![synth::sample_waveform(channel)];
        }

        tracing::debug!(count = rows.len(), %channel, "Retrieved microphone samples");
        rows.into_iter().map(|r| r.into_sample(channel)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtered_window_covers_one_calendar_day() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let (start, end) = query_window(Some(date));

        assert_eq!(start.to_rfc3339(), "2024-01-15T00:00:00+00:00");
        assert_eq!(end.unwrap().to_rfc3339(), "2024-01-16T00:00:00+00:00");
    }

    #[test]
    fn live_window_looks_back_one_hour_unbounded() {
        let before = Utc::now() - chrono::Duration::seconds(LIVE_WINDOW_SECS);
        let (start, end) = query_window(None);
        let after = Utc::now() - chrono::Duration::seconds(LIVE_WINDOW_SECS);

        assert!(start >= before && start <= after);
        assert!(end.is_none());
    }
}
