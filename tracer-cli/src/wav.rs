use anyhow::{Context, Result, bail};
use hound::{SampleFormat, WavReader};
use std::path::Path;

/// Reads a WAV file and mixes it down to mono samples in [-1, 1].
///
/// # Returns
/// * `Ok((samples, sample_rate))`
/// * `Err(e)` - File missing, unreadable or in an unsupported sample format
pub fn read_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("decoding float samples")?,
        (SampleFormat::Int, bits @ 8..=32) => {
            let scale = 1.0 / (1_i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .context("decoding integer samples")?
        }
        (format, bits) => bail!("unsupported WAV format: {format:?} at {bits} bits"),
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    log::info!(
        "[WAV] {}: {} Hz, {} channel(s), {} samples",
        path.display(),
        spec.sample_rate,
        channels,
        interleaved.len() / channels
    );
    Ok((mono, spec.sample_rate))
}
