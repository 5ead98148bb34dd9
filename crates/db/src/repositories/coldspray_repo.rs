//! Repository for the `coldspray` table (append-only time-series).

use remanet_core::telemetry::Reading;
use remanet_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::ColdSprayRow;

/// Maximum rows returned by one window fetch.
pub const FETCH_LIMIT: i64 = 5000;

/// Rows per INSERT statement.
///
/// Postgres caps one Bind message at 65535 parameters; at 7 columns
/// per row that allows at most 9362 rows, while a full day of 1 Hz
/// readings is 86400. 1000 rows (7000 parameters) stays well clear of
/// the ceiling.
pub const INSERT_CHUNK_ROWS: usize = 1000;

/// Column list for `coldspray` SELECT queries.
const COLUMNS: &str = "time, t_gun, p_gun, q_pg_n2, v_particule, q_cg_pf1, q_cg_pf2";

/// Provides query operations for cold-spray readings.
pub struct ColdSprayRepo;

impl ColdSprayRepo {
    /// Fetch rows in `[start, end)` (or `[start, ∞)` when `end` is
    /// `None`), ascending by time, capped at [`FETCH_LIMIT`].
    pub async fn fetch_window(
        pool: &PgPool,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> Result<Vec<ColdSprayRow>, sqlx::Error> {
        match end {
            Some(end) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM coldspray \
                     WHERE time >= $1 AND time < $2 \
                     ORDER BY time ASC LIMIT {FETCH_LIMIT}"
                );
                sqlx::query_as::<_, ColdSprayRow>(&query)
                    .bind(start)
                    .bind(end)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM coldspray \
                     WHERE time >= $1 \
                     ORDER BY time ASC LIMIT {FETCH_LIMIT}"
                );
                sqlx::query_as::<_, ColdSprayRow>(&query)
                    .bind(start)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Batch-insert readings from the offline ingestion tool.
    ///
    /// Splits the batch into multi-row INSERTs of at most
    /// [`INSERT_CHUNK_ROWS`] rows each, so a full-day export never
    /// exceeds the Postgres bind-parameter limit.
    pub async fn insert_batch(pool: &PgPool, readings: &[Reading]) -> Result<(), sqlx::Error> {
        for chunk in readings.chunks(INSERT_CHUNK_ROWS) {
            Self::insert_chunk(pool, chunk).await?;
        }
        Ok(())
    }

    /// Insert one chunk with a single multi-row INSERT.
    async fn insert_chunk(pool: &PgPool, readings: &[Reading]) -> Result<(), sqlx::Error> {
        let query = build_insert_query(readings.len());

        let mut q = sqlx::query(&query);
        for r in readings {
            q = q
                .bind(r.time)
                .bind(r.t_gun)
                .bind(r.p_gun)
                .bind(r.q_pg_n2)
                .bind(r.v_particule)
                .bind(r.q_cg_pf1)
                .bind(r.q_cg_pf2);
        }
        q.execute(pool).await?;
        Ok(())
    }
}

/// Build the multi-row INSERT text for `rows` readings.
fn build_insert_query(rows: usize) -> String {
    let mut query = String::from(
        "INSERT INTO coldspray \
         (time, t_gun, p_gun, q_pg_n2, v_particule, q_cg_pf1, q_cg_pf2) VALUES ",
    );

    let mut param_idx = 1u32;
    for i in 0..rows {
        if i > 0 {
            query.push_str(", ");
        }
        query.push('(');
        for j in 0..7 {
            if j > 0 {
                query.push_str(", ");
            }
            query.push('$');
            query.push_str(&param_idx.to_string());
            param_idx += 1;
        }
        query.push(')');
    }

    query
}
