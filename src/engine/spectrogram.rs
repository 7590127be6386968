//! Log-magnitude STFT.
//!
//! Turns a mono PCM buffer into a time-frequency matrix: Hann-windowed
//! frames of `window_size` samples every `hop_size` samples, transformed
//! with a forward FFT and converted to decibels.

use std::f64::consts::PI;

use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use super::EngineConfig;

/// Floor added to the magnitude before taking the log, so silence maps to
/// a finite dB value instead of -inf.
const DB_EPSILON: f64 = 1e-9;

/// Compute the dB spectrogram of `pcm`.
///
/// Frame `t` covers samples `[t * hop, t * hop + window)`; only full
/// windows are taken, so a buffer shorter than one window yields an empty
/// spectrogram. Each frame holds `window_size / 2` bins (the real-to-complex
/// transform's top bin is dropped).
pub fn compute_spectrogram(pcm: &[f64], config: &EngineConfig) -> Vec<Vec<f32>> {
    let window_size = config.window_size;
    let hop = config.hop_size;
    if pcm.len() < window_size {
        return Vec::new();
    }

    let num_frames = (pcm.len() - window_size) / hop + 1;
    let bins = window_size / 2;
    let window = hann_window(window_size);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(window_size);

    (0..num_frames)
        .into_par_iter()
        .map(|t| {
            let start = t * hop;
            let mut buffer: Vec<Complex<f64>> = pcm[start..start + window_size]
                .iter()
                .zip(window.iter())
                .map(|(&sample, &coeff)| Complex { re: sample * coeff, im: 0.0 })
                .collect();

            fft.process(&mut buffer);

            buffer[..bins]
                .iter()
                .map(|c| {
                    let mag = (c.re * c.re + c.im * c.im).sqrt();
                    (20.0 * (mag + DB_EPSILON).log10()) as f32
                })
                .collect()
        })
        .collect()
}

fn hann_window(size: usize) -> Vec<f64> {
    let n = (size - 1) as f64;
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n).cos())
        .collect()
}
