use crate::AudioError;
use crate::audio::{convert_f32_to_i16, downmix_to_mono, encode_wav};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::mpsc;

/// Captures microphone input until [`Recorder::finish`] is called.
///
/// The cpal callback runs on its own thread and hands sample blocks over a
/// channel. `Stream` is not `Send`, so a recorder stays on the thread that
/// started it.
pub struct Recorder {
    stream: Stream,
    rx: mpsc::Receiver<Vec<f32>>,
    channels: u16,
    sample_rate: u32,
}

impl Recorder {
    pub fn start(device: &Device) -> Result<Self, AudioError> {
        let supported = device
            .default_input_config()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        let config: StreamConfig = supported.config();
        let (tx, rx) = mpsc::channel();

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(device, &config, tx),
            SampleFormat::I16 => build_stream::<i16>(device, &config, tx),
            SampleFormat::U16 => build_stream::<u16>(device, &config, tx),
            other => {
                return Err(AudioError::Device(format!(
                    "unsupported sample format {other:?}"
                )));
            }
        }
        .map_err(|e| AudioError::Device(e.to_string()))?;
        stream
            .play()
            .map_err(|e| AudioError::Device(e.to_string()))?;

        tracing::info!(
            "Recording from {} ({}ch, {}hz).",
            device.name().unwrap_or_default(),
            config.channels,
            config.sample_rate.0
        );
        Ok(Self {
            stream,
            rx,
            channels: config.channels,
            sample_rate: config.sample_rate.0,
        })
    }

    /// Stops capturing and returns everything recorded as a mono WAV file.
    pub fn finish(self) -> Result<Vec<u8>, AudioError> {
        let Self {
            stream,
            rx,
            channels,
            sample_rate,
        } = self;
        // Dropping the stream closes the callback's sender.
        drop(stream);
        blocks_to_wav(rx.into_iter(), channels, sample_rate)
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    tx: mpsc::Sender<Vec<f32>>,
) -> Result<Stream, cpal::BuildStreamError>
where
    T: cpal::Sample + cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let block: Vec<f32> = data.iter().map(|&s| cpal::Sample::from_sample(s)).collect();
            // The receiver is gone once the recorder finished; drop late blocks.
            let _ = tx.send(block);
        },
        |err| tracing::warn!("Audio stream error: {}", err),
        None,
    )
}

fn blocks_to_wav(
    blocks: impl Iterator<Item = Vec<f32>>,
    channels: u16,
    sample_rate: u32,
) -> Result<Vec<u8>, AudioError> {
    let interleaved: Vec<f32> = blocks.flatten().collect();
    let mono = downmix_to_mono(&interleaved, channels);
    tracing::debug!(
        "Captured {} frames ({:.1}s).",
        mono.len(),
        mono.len() as f32 / sample_rate as f32
    );
    encode_wav(&convert_f32_to_i16(&mono), sample_rate)
}
