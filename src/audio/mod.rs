//! Audio ingestion: compressed or raw audio bytes in, mono PCM out.
//!
//! Decodes whatever symphonia can probe, downmixes to mono by averaging
//! channels, and resamples to the reference rate. The engine itself never
//! sees bytes, only the PCM produced here.

mod decode;
mod resample;

use anyhow::Result;

/// Sample rate every clip is normalized to before fingerprinting.
pub const REFERENCE_RATE: u32 = 44_100;

/// A decoded, downmixed, rate-normalized clip.
pub struct AudioClip {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
}

/// Decode `bytes` into a mono clip at [`REFERENCE_RATE`].
pub fn ingest(bytes: &[u8]) -> Result<AudioClip> {
    let decoded = decode::decode_audio(bytes)?;
    let mono = decode::to_mono(&decoded.samples, decoded.channels);
    let resampled = resample::resample(&mono, decoded.sample_rate, REFERENCE_RATE)?;

    Ok(AudioClip {
        samples: resampled.iter().map(|&s| f64::from(s)).collect(),
        sample_rate: REFERENCE_RATE,
    })
}
