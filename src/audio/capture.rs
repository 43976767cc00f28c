//! Microphone capture

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream};

use crate::audio::source::{AudioFrame, FrameSource};
use crate::config::AudioConfig;
use crate::{Error, Result};

/// Frame source backed by the default input device
///
/// A cpal stream pushes PCM16 samples into a shared buffer; `read_frame`
/// drains it in fixed-size blocks, blocking until a full frame is
/// available. Stream faults reported by cpal surface on the next read as
/// an error rather than being treated as silence.
pub struct MicSource {
    // Held so the capture stream stays alive for the source's lifetime
    _stream: Stream,
    buffer: Arc<Mutex<Vec<i16>>>,
    fault: Arc<Mutex<Option<String>>>,
    frame_samples: usize,
    sample_rate: u32,
}

impl MicSource {
    /// Open the default input device and start capturing
    ///
    /// # Errors
    ///
    /// Returns error if no input device is available or the stream cannot
    /// be built at the configured rate
    pub fn start(config: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(config.sample_rate)
                    && c.max_sample_rate() >= SampleRate(config.sample_rate)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let stream_config = supported_config
            .with_sample_rate(SampleRate(config.sample_rate))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = config.sample_rate,
            channels = stream_config.channels,
            "audio capture initialized"
        );

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let fault = Arc::new(Mutex::new(None));

        let buffer_writer = Arc::clone(&buffer);
        let fault_writer = Arc::clone(&fault);

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer_writer.lock() {
                        buf.extend(data.iter().map(|&s| {
                            #[allow(clippy::cast_possible_truncation)]
                            let sample = (s * 32767.0).clamp(-32768.0, 32767.0) as i16;
                            sample
                        }));
                    }
                },
                move |err| {
                    tracing::error!(error = %err, "audio capture error");
                    if let Ok(mut fault) = fault_writer.lock() {
                        *fault = Some(err.to_string());
                    }
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            buffer,
            fault,
            frame_samples: config.frame_samples,
            sample_rate: config.sample_rate,
        })
    }

    /// Discard any buffered samples
    pub fn clear(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    /// Take the pending stream fault, if one was reported
    fn take_fault(&self) -> Option<String> {
        self.fault.lock().ok().and_then(|mut fault| fault.take())
    }
}

impl FrameSource for MicSource {
    fn read_frame(&mut self) -> Result<Option<AudioFrame>> {
        loop {
            if let Some(fault) = self.take_fault() {
                return Err(Error::Audio(fault));
            }

            {
                let mut buf = self
                    .buffer
                    .lock()
                    .map_err(|_| Error::Audio("capture buffer poisoned".to_string()))?;

                if buf.len() >= self.frame_samples {
                    let frame: Vec<i16> = buf.drain(..self.frame_samples).collect();
                    return Ok(Some(AudioFrame::new(frame)));
                }
            }

            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
