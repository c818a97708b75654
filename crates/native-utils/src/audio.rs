use crate::AudioError;
use std::io::Cursor;
use std::path::Path;

/// Converts a slice of f32 samples to a vector of i16 samples.
pub fn convert_f32_to_i16(pcm32: &[f32]) -> Vec<i16> {
    pcm32
        .iter()
        .map(|&sample| (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Averages interleaved frames down to one channel.
pub fn downmix_to_mono(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Encodes mono PCM16 samples as an in-memory WAV file.
pub fn encode_wav(pcm16: &[i16], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    if pcm16.is_empty() {
        return Err(AudioError::Empty);
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut buffer, spec)?;
        for &sample in pcm16 {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(buffer.into_inner())
}

/// Checks that `bytes` is a WAV file with at least one sample and returns
/// its duration in seconds.
pub fn validate_wav(bytes: &[u8]) -> Result<f32, AudioError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let frames = reader.duration();
    if frames == 0 {
        return Err(AudioError::Empty);
    }
    Ok(frames as f32 / spec.sample_rate as f32)
}

/// Reads a WAV file for upload, rejecting anything that is not a non-empty WAV.
pub fn load_wav(path: &Path) -> Result<Vec<u8>, AudioError> {
    let bytes = std::fs::read(path)?;
    let seconds = validate_wav(&bytes)?;
    tracing::debug!(
        "Loaded {} ({} bytes, {:.1}s).",
        path.display(),
        bytes.len(),
        seconds
    );
    Ok(bytes)
}
