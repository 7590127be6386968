//! Sinc resampling to the reference rate.

use anyhow::{Context, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

const CHUNK_SIZE: usize = 1024;

/// Resample a mono buffer from `input_rate` to `output_rate`. Equal rates
/// pass through unchanged. The tail is zero-padded up to one chunk.
pub fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        return Ok(input.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        oversampling_factor: 64,
        interpolation: SincInterpolationType::Linear,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(output_rate) / f64::from(input_rate),
        2.0,
        params,
        CHUNK_SIZE,
        1,
    )
    .context("failed to construct resampler")?;

    let estimated = input.len() as u64 * u64::from(output_rate) / u64::from(input_rate);
    let mut output = Vec::with_capacity(estimated as usize + CHUNK_SIZE);

    let mut position = 0;
    while position + CHUNK_SIZE <= input.len() {
        let chunk = vec![input[position..position + CHUNK_SIZE].to_vec()];
        let result = resampler.process(&chunk, None).context("resampling failed")?;
        output.extend_from_slice(&result[0]);
        position += CHUNK_SIZE;
    }

    let remaining = input.len() - position;
    if remaining > 0 {
        let mut padded = vec![0.0; CHUNK_SIZE];
        padded[..remaining].copy_from_slice(&input[position..]);
        let result = resampler
            .process(&[padded], None)
            .context("resampling failed")?;
        output.extend_from_slice(&result[0]);
    }

    Ok(output)
}
