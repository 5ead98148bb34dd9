//! Repository for the microphone tables (`micro_0`, `micro_1`).

use remanet_core::telemetry::MicChannel;
use remanet_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::MicrophoneRow;

/// Maximum samples returned by one window fetch per channel.
pub const FETCH_LIMIT: i64 = 10;

/// Provides query operations for microphone waveform snapshots.
///
/// The table name comes from [`MicChannel::table_name`], a closed
/// enum, so interpolating it into the query text is safe.
pub struct MicrophoneRepo;

impl MicrophoneRepo {
    /// Fetch samples in `[start, end)` (or `[start, ∞)` when `end` is
    /// `None`), ascending by time, capped at [`FETCH_LIMIT`].
    pub async fn fetch_window(
        pool: &PgPool,
        channel: MicChannel,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> Result<Vec<MicrophoneRow>, sqlx::Error> {
        let table = channel.table_name();
        match end {
            Some(end) => {
                let query = format!(
                    "SELECT timestamp, data FROM {table} \
                     WHERE timestamp >= $1 AND timestamp < $2 \
                     ORDER BY timestamp ASC LIMIT {FETCH_LIMIT}"
                );
                sqlx::query_as::<_, MicrophoneRow>(&query)
                    .bind(start)
                    .bind(end)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT timestamp, data FROM {table} \
                     WHERE timestamp >= $1 \
                     ORDER BY timestamp ASC LIMIT {FETCH_LIMIT}"
                );
                sqlx::query_as::<_, MicrophoneRow>(&query)
                    .bind(start)
                    .fetch_all(pool)
                    .await
            }
        }
    }
}
