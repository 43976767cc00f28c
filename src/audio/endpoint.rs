//! Utterance endpoint detection
//!
//! Consumes a live frame stream and decides in real time when speech starts
//! and ends, emitting a bounded utterance buffer. Decouples "how audio
//! arrives" (the [`FrameSource`]) from "is someone speaking" (the
//! [`VadStrategy`]).

use std::time::{Duration, Instant};

use crate::audio::source::{AudioFrame, FrameSource};
use crate::{Error, Result};

/// Decides whether a single frame contains speech
///
/// The detector's state machine is independent of the decision rule, so a
/// learned VAD can replace the energy heuristic without touching it.
pub trait VadStrategy: Send {
    /// True when the frame looks like speech
    fn is_speech(&self, frame: &AudioFrame) -> bool;
}

/// Energy-based VAD comparing a frame's RMS amplitude against a fixed
/// threshold
///
/// Thresholds are tuned configuration, not an adaptive noise floor.
pub struct EnergyVad {
    threshold: f32,
}

impl EnergyVad {
    /// Create an energy VAD with the given RMS threshold
    #[must_use]
    pub const fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl VadStrategy for EnergyVad {
    fn is_speech(&self, frame: &AudioFrame) -> bool {
        frame.rms() > self.threshold
    }
}

/// State of the endpoint detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// No speech observed yet
    Idle,
    /// Speech observed, still accumulating
    Speaking,
    /// Utterance sealed; terminal for this invocation
    Done,
}

/// A bounded span of captured audio judged to contain one spoken turn
///
/// Created at speech onset, sealed at the silence window or the listen
/// timeout, and consumed exactly once by the transcription collaborator.
#[derive(Debug)]
pub struct Utterance {
    frames: Vec<AudioFrame>,
    sample_rate: u32,
}

impl Utterance {
    fn new(frames: Vec<AudioFrame>, sample_rate: u32) -> Self {
        Self {
            frames,
            sample_rate,
        }
    }

    /// Number of frames in the utterance
    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Total number of samples across all frames
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.frames.iter().map(AudioFrame::len).sum()
    }

    /// Wall-clock length of the captured audio
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_micros(
            (self.sample_count() as u64 * 1_000_000) / u64::from(self.sample_rate),
        )
    }

    /// Sample rate the audio was captured at
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Seal the utterance into a WAV byte buffer for the STT collaborator
    ///
    /// # Errors
    ///
    /// Returns error if WAV encoding fails
    pub fn into_wav(self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| Error::Audio(e.to_string()))?;

            for frame in &self.frames {
                for &sample in frame.samples() {
                    writer
                        .write_sample(sample)
                        .map_err(|e| Error::Audio(e.to_string()))?;
                }
            }

            writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
        }

        Ok(cursor.into_inner())
    }
}

/// Converts a raw frame stream into discrete utterances
///
/// One call to [`EndpointDetector::detect`] handles one listening turn:
/// it blocks on the source until an utterance is sealed or the listen
/// timeout passes, never longer than the timeout plus one frame read.
pub struct EndpointDetector {
    vad: Box<dyn VadStrategy>,
    silence_frames: usize,
    listen_timeout: Duration,
    state: DetectorState,
}

impl EndpointDetector {
    /// Create a detector with the given VAD strategy
    ///
    /// `silence_frames` is the consecutive low-energy frame count that ends
    /// an utterance; callers derive it from a configured duration so its
    /// real-time meaning does not drift with frame size (see
    /// `AudioConfig::silence_frames`).
    #[must_use]
    pub fn new(
        vad: Box<dyn VadStrategy>,
        silence_frames: usize,
        listen_timeout: Duration,
    ) -> Self {
        Self {
            vad,
            silence_frames,
            listen_timeout,
            state: DetectorState::Idle,
        }
    }

    /// Current state of the most recent invocation
    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }

    /// Consume frames until one utterance is sealed or the timeout passes
    ///
    /// Returns `Ok(None)` when no speech was observed before the timeout
    /// (or before the stream ended); the caller decides whether to
    /// reprompt. A sealed utterance contains the frames from speech onset
    /// through the last energetic frame plus the trailing low-energy run
    /// up to the silence window; frames before onset are discarded.
    ///
    /// # Errors
    ///
    /// Returns error when the frame source fails; a device fault is never
    /// conflated with silence.
    pub fn detect(&mut self, source: &mut dyn FrameSource) -> Result<Option<Utterance>> {
        let started = Instant::now();
        let mut frames: Vec<AudioFrame> = Vec::new();
        let mut silence_run = 0usize;
        self.state = DetectorState::Idle;

        loop {
            if started.elapsed() >= self.listen_timeout {
                return Ok(self.seal(frames, source.sample_rate(), "listen timeout"));
            }

            let Some(frame) = source.read_frame()? else {
                return Ok(self.seal(frames, source.sample_rate(), "stream ended"));
            };

            let is_speech = self.vad.is_speech(&frame);

            match self.state {
                DetectorState::Idle => {
                    if is_speech {
                        tracing::trace!(rms = frame.rms(), "speech onset");
                        self.state = DetectorState::Speaking;
                        frames.push(frame);
                    }
                }
                DetectorState::Speaking => {
                    if is_speech {
                        silence_run = 0;
                        frames.push(frame);
                    } else {
                        silence_run += 1;
                        if silence_run > self.silence_frames {
                            return Ok(self.seal(
                                frames,
                                source.sample_rate(),
                                "silence window",
                            ));
                        }
                        frames.push(frame);
                    }
                }
                DetectorState::Done => {
                    // Reset at entry makes this unreachable, but a fresh
                    // invocation must never observe a stale terminal state.
                    self.state = DetectorState::Idle;
                }
            }
        }
    }

    /// Seal the accumulated frames, or report no speech
    fn seal(
        &mut self,
        frames: Vec<AudioFrame>,
        sample_rate: u32,
        reason: &str,
    ) -> Option<Utterance> {
        self.state = DetectorState::Done;

        if frames.is_empty() {
            tracing::debug!(reason, "no speech detected");
            return None;
        }

        let utterance = Utterance::new(frames, sample_rate);
        tracing::debug!(
            reason,
            frames = utterance.frame_count(),
            duration_ms = utterance.duration().as_millis(),
            "utterance sealed"
        );
        Some(utterance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frame source replaying a fixed script, then reporting exhaustion
    struct ScriptedSource {
        frames: std::vec::IntoIter<Vec<i16>>,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Vec<i16>>) -> Self {
            Self {
                frames: frames.into_iter(),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn read_frame(&mut self) -> Result<Option<AudioFrame>> {
            Ok(self.frames.next().map(AudioFrame::new))
        }

        fn sample_rate(&self) -> u32 {
            16_000
        }
    }

    /// Frame source that fails on the first read
    struct BrokenSource;

    impl FrameSource for BrokenSource {
        fn read_frame(&mut self) -> Result<Option<AudioFrame>> {
            Err(Error::Audio("device unplugged".to_string()))
        }

        fn sample_rate(&self) -> u32 {
            16_000
        }
    }

    fn loud_frame() -> Vec<i16> {
        vec![3000; 64]
    }

    fn quiet_frame() -> Vec<i16> {
        vec![0; 64]
    }

    fn detector(silence_frames: usize) -> EndpointDetector {
        EndpointDetector::new(
            Box::new(EnergyVad::new(500.0)),
            silence_frames,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn all_silence_yields_none() {
        let mut source = ScriptedSource::new(vec![quiet_frame(); 20]);
        let mut det = detector(3);

        let result = det.detect(&mut source).unwrap();
        assert!(result.is_none());
        assert_eq!(det.state(), DetectorState::Done);
    }

    #[test]
    fn zero_timeout_yields_none_immediately() {
        let mut source = ScriptedSource::new(vec![loud_frame(); 20]);
        let mut det = EndpointDetector::new(
            Box::new(EnergyVad::new(500.0)),
            3,
            Duration::ZERO,
        );

        assert!(det.detect(&mut source).unwrap().is_none());
    }

    #[test]
    fn speech_then_silence_seals_at_boundary() {
        // 5 energetic frames, then plenty of silence with a window of 3:
        // the utterance keeps the speech plus exactly 3 trailing low frames.
        let mut script = vec![loud_frame(); 5];
        script.extend(vec![quiet_frame(); 10]);
        let mut source = ScriptedSource::new(script);
        let mut det = detector(3);

        let utterance = det.detect(&mut source).unwrap().unwrap();
        assert_eq!(utterance.frame_count(), 5 + 3);
    }

    #[test]
    fn leading_silence_is_discarded() {
        let mut script = vec![quiet_frame(); 4];
        script.extend(vec![loud_frame(); 2]);
        script.extend(vec![quiet_frame(); 10]);
        let mut source = ScriptedSource::new(script);
        let mut det = detector(2);

        let utterance = det.detect(&mut source).unwrap().unwrap();
        assert_eq!(utterance.frame_count(), 2 + 2);
    }

    #[test]
    fn silence_gap_within_window_does_not_split() {
        // A 2-frame gap under a 3-frame window keeps one utterance going
        let mut script = vec![loud_frame(); 2];
        script.extend(vec![quiet_frame(); 2]);
        script.extend(vec![loud_frame(); 2]);
        script.extend(vec![quiet_frame(); 10]);
        let mut source = ScriptedSource::new(script);
        let mut det = detector(3);

        let utterance = det.detect(&mut source).unwrap().unwrap();
        assert_eq!(utterance.frame_count(), 2 + 2 + 2 + 3);
    }

    #[test]
    fn stream_end_mid_speech_seals_partial_utterance() {
        let mut source = ScriptedSource::new(vec![loud_frame(); 4]);
        let mut det = detector(3);

        let utterance = det.detect(&mut source).unwrap().unwrap();
        assert_eq!(utterance.frame_count(), 4);
    }

    #[test]
    fn source_failure_propagates() {
        let mut det = detector(3);
        let err = det.detect(&mut BrokenSource).unwrap_err();
        assert!(matches!(err, Error::Audio(_)));
    }

    #[test]
    fn utterance_seals_to_wav() {
        let mut script = vec![loud_frame(); 3];
        script.extend(vec![quiet_frame(); 5]);
        let mut source = ScriptedSource::new(script);
        let mut det = detector(2);

        let utterance = det.detect(&mut source).unwrap().unwrap();
        let expected_samples = utterance.sample_count();
        let wav = utterance.into_wav().unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte header plus two bytes per sample
        assert_eq!(wav.len(), 44 + expected_samples * 2);
    }

    #[test]
    fn frames_are_not_mutated_by_detection() {
        let frame = AudioFrame::new(loud_frame());
        let before = frame.samples().to_vec();
        let vad = EnergyVad::new(500.0);
        assert!(vad.is_speech(&frame));
        assert_eq!(frame.samples(), &before[..]);
    }
}
