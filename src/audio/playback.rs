//! Audio playback to speakers

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Plays synthesized speech on the default output device
///
/// TTS collaborators hand back WAV (espeak) or MP3 (API providers); both
/// are decoded to f32 samples and played at the clip's own sample rate.
pub struct AudioPlayback;

impl AudioPlayback {
    /// Create a playback instance, verifying an output device exists
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        host.default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;
        Ok(Self)
    }

    /// Play a WAV clip
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    #[allow(clippy::unused_async)]
    pub async fn play_wav(&self, wav_data: &[u8]) -> Result<()> {
        let (samples, sample_rate) = decode_wav(wav_data)?;
        self.play_samples_blocking(samples, sample_rate)
    }

    /// Play an MP3 clip
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    #[allow(clippy::unused_async)]
    pub async fn play_mp3(&self, mp3_data: &[u8]) -> Result<()> {
        let (samples, sample_rate) = decode_mp3(mp3_data)?;
        self.play_samples_blocking(samples, sample_rate)
    }

    /// Play raw f32 samples at the given rate
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    #[allow(clippy::unused_async)]
    pub async fn play(&self, samples: Vec<f32>, sample_rate: u32) -> Result<()> {
        self.play_samples_blocking(samples, sample_rate)
    }

    /// Play samples in a blocking manner, returning when the clip finishes
    fn play_samples_blocking(&self, samples: Vec<f32>, sample_rate: u32) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device".to_string()))?;

        let config = output_config(&device, sample_rate)?;
        let channels = config.channels as usize;

        let sample_count = samples.len();
        let queue = Arc::new(Mutex::new((samples, 0usize, false)));
        let queue_writer = Arc::clone(&queue);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut state) = queue_writer.lock() else {
                        return;
                    };
                    let (samples, pos, finished) = &mut *state;

                    for frame in data.chunks_mut(channels) {
                        let sample = if *pos < samples.len() {
                            let s = samples[*pos];
                            *pos += 1;
                            s
                        } else {
                            *finished = true;
                            0.0
                        };

                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Poll for completion, bounded by the clip length plus slack
        let duration_ms = (sample_count as u64 * 1000) / u64::from(sample_rate);
        let deadline = std::time::Instant::now()
            + std::time::Duration::from_millis(duration_ms + 500);

        loop {
            let finished = queue.lock().map(|state| state.2).unwrap_or(true);
            if finished || std::time::Instant::now() > deadline {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        // Let the device drain before tearing the stream down
        std::thread::sleep(std::time::Duration::from_millis(100));

        drop(stream);
        tracing::debug!(samples = sample_count, sample_rate, "playback complete");

        Ok(())
    }
}

/// Find an output configuration at the clip's sample rate, mono preferred
fn output_config(device: &cpal::Device, sample_rate: u32) -> Result<StreamConfig> {
    let supported = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(sample_rate)
                && c.max_sample_rate() >= SampleRate(sample_rate)
        })
        .or_else(|| {
            device.supported_output_configs().ok()?.find(|c| {
                c.channels() == 2
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            })
        })
        .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

    Ok(supported.with_sample_rate(SampleRate(sample_rate)).config())
}

/// Decode WAV bytes to f32 samples, averaging channels to mono
fn decode_wav(wav_data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::new(Cursor::new(wav_data))
        .map_err(|e| Error::Audio(e.to_string()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / 32768.0))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(e.to_string()))?,
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(e.to_string()))?,
    };

    let samples = if channels == 1 {
        raw
    } else {
        raw.chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok((samples, spec.sample_rate))
}

/// Decode MP3 bytes to f32 samples, averaging stereo to mono
fn decode_mp3(mp3_data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = 0u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                #[allow(clippy::cast_sign_loss)]
                {
                    sample_rate = frame.sample_rate.max(0) as u32;
                }

                if frame.channels == 2 {
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right =
                            f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    if sample_rate == 0 {
        return Err(Error::Audio("empty MP3 stream".to_string()));
    }

    Ok((samples, sample_rate))
}
