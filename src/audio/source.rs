//! Frame sources feeding the endpoint detector

use std::path::Path;

use crate::{Error, Result};

/// A fixed-size block of PCM16 mono samples
#[derive(Debug, Clone)]
pub struct AudioFrame {
    samples: Vec<i16>,
}

impl AudioFrame {
    /// Wrap a block of samples
    #[must_use]
    pub const fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// The frame's samples
    #[must_use]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of samples in the frame
    #[must_use]
    pub const fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the frame holds no samples
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Root-mean-square amplitude of the frame's samples
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }

        let sum_squares: f64 = self
            .samples
            .iter()
            .map(|&s| f64::from(s) * f64::from(s))
            .sum();
        (sum_squares / self.samples.len() as f64).sqrt() as f32
    }
}

/// Abstracts where live audio frames come from
///
/// Implementations block until a full frame is available. A read failure is
/// a device/stream fault and must surface as an error; it is never silence.
pub trait FrameSource {
    /// Read the next frame, or `None` when the stream is exhausted
    ///
    /// # Errors
    ///
    /// Returns error on hardware or stream failure
    fn read_frame(&mut self) -> Result<Option<AudioFrame>>;

    /// Sample rate of the frames this source yields
    fn sample_rate(&self) -> u32;
}

/// Frame source backed by a WAV file
///
/// Used for offline runs and tests; yields the file's samples in fixed-size
/// frames, with a short final frame if the file length is not a multiple of
/// the frame size.
pub struct WavFileSource {
    samples: std::vec::IntoIter<i16>,
    frame_samples: usize,
    sample_rate: u32,
}

impl WavFileSource {
    /// Open a PCM16 mono WAV file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not 16-bit mono PCM
    pub fn open(path: &Path, frame_samples: usize) -> Result<Self> {
        let mut reader =
            hound::WavReader::open(path).map_err(|e| Error::Audio(e.to_string()))?;
        let spec = reader.spec();

        if spec.channels != 1 || spec.bits_per_sample != 16 {
            return Err(Error::Audio(format!(
                "expected 16-bit mono WAV, got {} channels at {} bits",
                spec.channels, spec.bits_per_sample
            )));
        }

        let samples = reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Audio(e.to_string()))?;

        Ok(Self {
            samples: samples.into_iter(),
            frame_samples,
            sample_rate: spec.sample_rate,
        })
    }
}

impl FrameSource for WavFileSource {
    fn read_frame(&mut self) -> Result<Option<AudioFrame>> {
        let frame: Vec<i16> = self.samples.by_ref().take(self.frame_samples).collect();
        if frame.is_empty() {
            return Ok(None);
        }
        Ok(Some(AudioFrame::new(frame)))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
