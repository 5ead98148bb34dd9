//! Row types mapping storage columns onto domain types.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use remanet_core::telemetry::{AudioSample, MicChannel, Reading};
use remanet_core::types::Timestamp;
use sqlx::FromRow;

/// One row of the `coldspray` table.
///
/// `v_particule` and `q_cg_pf2` are nullable in storage (older CSV
/// exports did not carry them) and normalize to `0.0` on conversion.
#[derive(Debug, Clone, FromRow)]
pub struct ColdSprayRow {
    pub time: Timestamp,
    pub t_gun: f64,
    pub p_gun: f64,
    pub q_pg_n2: f64,
    pub v_particule: Option<f64>,
    pub q_cg_pf1: f64,
    pub q_cg_pf2: Option<f64>,
}

impl From<ColdSprayRow> for Reading {
    fn from(row: ColdSprayRow) -> Self {
        Reading {
            time: row.time,
            t_gun: row.t_gun,
            p_gun: row.p_gun,
            q_pg_n2: row.q_pg_n2,
            v_particule: row.v_particule.unwrap_or(0.0),
            q_cg_pf1: row.q_cg_pf1,
            q_cg_pf2: row.q_cg_pf2.unwrap_or(0.0),
        }
    }
}

/// One row of a microphone table (`micro_0` / `micro_1`).
///
/// `data` holds the raw little-endian f32 waveform; it is base64
/// encoded on conversion to match the wire contract.
#[derive(Debug, Clone, FromRow)]
pub struct MicrophoneRow {
    pub timestamp: Timestamp,
    pub data: Vec<u8>,
}

impl MicrophoneRow {
    /// Convert into a wire-shaped sample for the given channel.
    pub fn into_sample(self, channel: MicChannel) -> AudioSample {
        AudioSample {
            timestamp: self.timestamp,
            data: STANDARD.encode(&self.data),
            mic_id: channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn null_optionals_normalize_to_zero() {
        let row = ColdSprayRow {
            time: Utc::now(),
            t_gun: 1.0,
            p_gun: 2.0,
            q_pg_n2: 3.0,
            v_particule: None,
            q_cg_pf1: 4.0,
            q_cg_pf2: None,
        };

        let reading = Reading::from(row);
        assert_eq!(reading.v_particule, 0.0);
        assert_eq!(reading.q_cg_pf2, 0.0);
        assert_eq!(reading.q_cg_pf1, 4.0);
    }

    #[test]
    fn microphone_row_encodes_payload_as_base64() {
        let row = MicrophoneRow {
            timestamp: Utc::now(),
            data: vec![0, 0, 128, 63], // 1.0f32 little-endian
        };

        let sample = row.into_sample(MicChannel::Micro0);
        assert_eq!(sample.mic_id, MicChannel::Micro0);
        assert_eq!(sample.data, "AACAPw==");
    }
}
