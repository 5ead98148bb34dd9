//! Synthetic fallback data.
//!
//! When storage is unreachable or a query window comes back empty, the
//! data source substitutes generated batches so the dashboard keeps
//! rendering instead of surfacing a storage failure. Sensor values
//! follow a small per-field pattern around a common baseline; audio is
//! a multi-harmonic waveform with noise, byte-serialized exactly like
//! real samples (little-endian f32, base64).

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::telemetry::{AudioSample, MicChannel, Reading};

/// Number of cold-spray points in a generated batch.
pub const SAMPLE_READING_COUNT: usize = 50;

/// Number of f32 points in a generated waveform.
pub const SAMPLE_WAVEFORM_POINTS: usize = 100;

/// Baseline around which all generated sensor values oscillate.
const BASELINE: f64 = 45.0;

/// Standard deviation of the additive waveform noise.
const WAVEFORM_NOISE_STD: f64 = 0.05;

/// Generate a batch of [`SAMPLE_READING_COUNT`] cold-spray readings at
/// one-second spacing, ending at the current time.
pub fn sample_cold_spray() -> Vec<Reading> {
    let mut rng = rand::rng();
    let count = SAMPLE_READING_COUNT;
    let start = Utc::now() - chrono::Duration::seconds(count as i64);

    (0..count)
        .map(|i| Reading {
            time: start + chrono::Duration::seconds(i as i64),
            t_gun: BASELINE + rng.random_range(-5.0..5.0) + (i % 10) as f64,
            p_gun: BASELINE + rng.random_range(-3.0..3.0) + (i % 5) as f64,
            q_pg_n2: BASELINE + rng.random_range(-2.0..2.0) + (i % 7) as f64,
            v_particule: BASELINE + rng.random_range(-2.0..2.0) + (i % 7) as f64,
            q_cg_pf1: BASELINE + rng.random_range(-1.0..1.0) + (i % 3) as f64,
            q_cg_pf2: BASELINE + rng.random_range(-1.0..1.0) + (i % 3) as f64,
        })
        .collect()
}

/// Generate one waveform snapshot for the given microphone channel.
///
/// The waveform is a base sine of random frequency (10-20 Hz) and
/// amplitude (0.5-1.0) with second and third harmonics at 0.3 and 0.15
/// amplitude plus gaussian noise, encoded like a stored sample.
pub fn sample_waveform(channel: MicChannel) -> AudioSample {
    let mut rng = rand::rng();
    let noise = Normal::new(0.0, WAVEFORM_NOISE_STD).expect("valid std dev");

    let frequency: f64 = rng.random_range(10.0..20.0);
    let amplitude: f64 = rng.random_range(0.5..1.0);

    let mut bytes = Vec::with_capacity(SAMPLE_WAVEFORM_POINTS * 4);
    for i in 0..SAMPLE_WAVEFORM_POINTS {
        let t = i as f64 / (SAMPLE_WAVEFORM_POINTS - 1) as f64;
        let phase = std::f64::consts::TAU * frequency * t;
        let value = amplitude * phase.sin()
            + 0.3 * (2.0 * phase).sin()
            + 0.15 * (3.0 * phase).sin()
            + noise.sample(&mut rng);
        bytes.extend_from_slice(&(value as f32).to_le_bytes());
    }

    AudioSample {
        timestamp: Utc::now(),
        data: STANDARD.encode(&bytes),
        mic_id: channel,
    }
}
