//! Sensor record types: cold-spray readings and microphone samples.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// One timestamped record from the cold-spray sensor group.
///
/// Field names on the wire follow the dashboard's JSON contract
/// (`T_gun`, `P_gun`, ...), which differs in casing from the storage
/// column names. `v_particule` and `q_cg_pf2` may be absent in
/// storage and are normalized to `0.0` at the read boundary, so a
/// `Reading` always carries concrete values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// When the record was captured (serialized as ISO-8601 text).
    #[serde(rename = "Time")]
    pub time: Timestamp,
    /// Gun temperature.
    #[serde(rename = "T_gun")]
    pub t_gun: f64,
    /// Gun pressure.
    #[serde(rename = "P_gun")]
    pub p_gun: f64,
    /// Nitrogen process-gas flow rate.
    #[serde(rename = "Q_PG_N2")]
    pub q_pg_n2: f64,
    /// Particle velocity.
    #[serde(rename = "V_Particule")]
    pub v_particule: f64,
    /// Powder feeder 1 carrier-gas flow rate.
    #[serde(rename = "Q_CG_PF1")]
    pub q_cg_pf1: f64,
    /// Powder feeder 2 carrier-gas flow rate.
    #[serde(rename = "Q_CG_PF2")]
    pub q_cg_pf2: f64,
}

/// The fixed set of microphone channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MicChannel {
    #[serde(rename = "micro_0")]
    Micro0,
    #[serde(rename = "micro_1")]
    Micro1,
}

impl MicChannel {
    /// Storage collection / table name for this channel.
    pub fn table_name(self) -> &'static str {
        match self {
            MicChannel::Micro0 => "micro_0",
            MicChannel::Micro1 => "micro_1",
        }
    }
}

impl std::fmt::Display for MicChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// One timestamped waveform snapshot from a microphone channel.
///
/// `data` is base64 text of raw little-endian 32-bit float samples,
/// matching the shape stored by the acquisition pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSample {
    /// When the snapshot was captured (serialized as ISO-8601 text).
    pub timestamp: Timestamp,
    /// Base64-encoded little-endian f32 waveform.
    pub data: String,
    /// Which microphone produced the snapshot.
    pub mic_id: MicChannel,
}
