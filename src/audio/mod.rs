//! Audio capture, endpoint detection, and playback
//!
//! - **source**: frame abstraction over microphones and WAV files
//! - **endpoint**: voice-activity-gated utterance recording
//! - **capture**: cpal-backed microphone frame source
//! - **playback**: speaker output for synthesized replies

mod capture;
mod endpoint;
mod playback;
mod source;

pub use capture::MicSource;
pub use endpoint::{DetectorState, EndpointDetector, EnergyVad, Utterance, VadStrategy};
pub use playback::AudioPlayback;
pub use source::{AudioFrame, FrameSource, WavFileSource};
