//! Per-frame peak picking.
//!
//! Selects the loudest bins of every spectrogram frame above a
//! low-frequency floor. Pure top-k per frame, no local-maximum test: the
//! cap keeps peak density bounded and temporal coverage even, where a
//! neighborhood test would leave sustained tones with empty frames.

use std::cmp::Ordering;

use super::EngineConfig;

/// One spectral peak: frame index, frequency bin, dB magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub frame: usize,
    pub bin: usize,
    pub magnitude: f32,
}

/// Pick the `peaks_per_frame` loudest bins of each frame, considering only
/// bins at or above `min_freq_bin`. Frames with fewer eligible bins emit
/// what they have. The result is sorted by `(frame, bin)`.
pub fn find_peaks(spectrogram: &[Vec<f32>], config: &EngineConfig) -> Vec<Peak> {
    let mut peaks = Vec::new();

    for (t, frame) in spectrogram.iter().enumerate() {
        if frame.len() <= config.min_freq_bin {
            continue;
        }

        let mut bins: Vec<(f32, usize)> = frame[config.min_freq_bin..]
            .iter()
            .enumerate()
            .map(|(i, &mag)| (mag, i + config.min_freq_bin))
            .collect();

        if bins.len() > config.peaks_per_frame {
            // partial selection; order among the kept bins is arbitrary
            bins.select_nth_unstable_by(config.peaks_per_frame, |a, b| {
                b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal)
            });
            bins.truncate(config.peaks_per_frame);
        }

        peaks.extend(bins.into_iter().map(|(magnitude, bin)| Peak {
            frame: t,
            bin,
            magnitude,
        }));
    }

    peaks.sort_by(|a, b| (a.frame, a.bin).cmp(&(b.frame, b.bin)));
    peaks
}
