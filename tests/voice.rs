//! Endpoint detection integration tests
//!
//! Exercise the recording state machine on synthetic audio without
//! requiring hardware.

use std::time::Duration;

use aria_assistant::audio::{
    DetectorState, EndpointDetector, EnergyVad, VadStrategy, WavFileSource,
};
use aria_assistant::config::AudioConfig;
use aria_assistant::AudioFrame;

mod common;
use common::VecSource;

const SAMPLE_RATE: u32 = 16_000;
const FRAME_SAMPLES: usize = 1024;

/// Chunk a sample stream into detector-sized frames
fn frames_of(samples: &[i16]) -> Vec<Vec<i16>> {
    samples
        .chunks(FRAME_SAMPLES)
        .map(<[i16]>::to_vec)
        .collect()
}

/// Generate sine wave samples at the given peak amplitude
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn sine_samples(frequency: f32, duration_secs: f32, amplitude: i16) -> Vec<i16> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let value = (2.0 * std::f32::consts::PI * frequency * t).sin();
            (value * f32::from(amplitude)) as i16
        })
        .collect()
}

/// Generate silence
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn silence_samples(duration_secs: f32) -> Vec<i16> {
    vec![0; (SAMPLE_RATE as f32 * duration_secs) as usize]
}

fn detector(silence_frames: usize) -> EndpointDetector {
    EndpointDetector::new(
        Box::new(EnergyVad::new(500.0)),
        silence_frames,
        Duration::from_secs(10),
    )
}

#[test]
fn sine_speech_followed_by_silence_yields_an_utterance() {
    let mut samples = sine_samples(440.0, 0.5, 8000);
    samples.extend(silence_samples(1.5));

    let mut source = VecSource::new(frames_of(&samples), SAMPLE_RATE);
    let mut det = detector(4);

    let utterance = det.detect(&mut source).unwrap().unwrap();
    assert_eq!(det.state(), DetectorState::Done);

    // 0.5 s of speech at 64 ms per frame is 7-8 frames, plus the 4-frame
    // silence window
    let speech_frames = (SAMPLE_RATE as usize / 2).div_ceil(FRAME_SAMPLES);
    assert_eq!(utterance.frame_count(), speech_frames + 4);
}

#[test]
fn pure_silence_yields_none() {
    let samples = silence_samples(2.0);
    let mut source = VecSource::new(frames_of(&samples), SAMPLE_RATE);
    let mut det = detector(4);

    assert!(det.detect(&mut source).unwrap().is_none());
}

#[test]
fn detector_is_reusable_across_turns() {
    let mut first = sine_samples(440.0, 0.3, 8000);
    first.extend(silence_samples(1.0));

    let mut second = sine_samples(300.0, 0.4, 8000);
    second.extend(silence_samples(1.0));

    let mut det = detector(3);

    let mut source = VecSource::new(frames_of(&first), SAMPLE_RATE);
    assert!(det.detect(&mut source).unwrap().is_some());

    let mut source = VecSource::new(frames_of(&second), SAMPLE_RATE);
    assert!(det.detect(&mut source).unwrap().is_some());
}

#[test]
fn utterance_duration_tracks_sample_count() {
    let mut samples = sine_samples(440.0, 0.5, 8000);
    samples.extend(silence_samples(1.0));

    let mut source = VecSource::new(frames_of(&samples), SAMPLE_RATE);
    let mut det = detector(2);

    let utterance = det.detect(&mut source).unwrap().unwrap();
    let expected_ms =
        (utterance.sample_count() as u64 * 1000) / u64::from(SAMPLE_RATE);
    assert_eq!(utterance.duration().as_millis(), u128::from(expected_ms));
}

#[test]
fn sealed_wav_parses_back_with_hound() {
    let mut samples = sine_samples(440.0, 0.25, 8000);
    samples.extend(silence_samples(1.0));

    let mut source = VecSource::new(frames_of(&samples), SAMPLE_RATE);
    let mut det = detector(2);

    let utterance = det.detect(&mut source).unwrap().unwrap();
    let sample_count = utterance.sample_count();
    let wav = utterance.into_wav().unwrap();

    let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.samples::<i16>().count(), sample_count);
}

#[test]
fn wav_file_source_feeds_the_detector() {
    // Write a speech-then-silence clip to disk, then run the full
    // file-backed path: WavFileSource -> EndpointDetector -> WAV bytes
    let path = std::env::temp_dir().join(format!("aria-voice-test-{}.wav", std::process::id()));

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for s in sine_samples(440.0, 0.5, 8000) {
        writer.write_sample(s).unwrap();
    }
    for s in silence_samples(1.5) {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();

    let mut source = WavFileSource::open(&path, FRAME_SAMPLES).unwrap();
    let mut det = detector(4);

    let utterance = det.detect(&mut source).unwrap().unwrap();
    assert!(utterance.frame_count() > 0);
    assert_eq!(utterance.sample_rate(), SAMPLE_RATE);

    let _ = std::fs::remove_file(path);
}

#[test]
fn energy_vad_separates_speech_from_noise_floor() {
    let vad = EnergyVad::new(500.0);

    let speech = AudioFrame::new(sine_samples(440.0, 0.064, 8000));
    assert!(vad.is_speech(&speech));

    // Low-level noise stays under the threshold
    let noise = AudioFrame::new(vec![50; FRAME_SAMPLES]);
    assert!(!vad.is_speech(&noise));
}

#[test]
fn config_silence_window_drives_the_detector() {
    // An 800 ms window at 64 ms frames is 12 frames; a 13-frame gap ends
    // the utterance, a 10-frame gap does not.
    let audio = AudioConfig::default();
    assert_eq!(audio.silence_frames(), 12);

    let loud = vec![8000_i16; FRAME_SAMPLES];
    let quiet = vec![0_i16; FRAME_SAMPLES];

    let mut frames = vec![loud.clone(); 3];
    frames.extend(vec![quiet.clone(); 10]);
    frames.extend(vec![loud; 2]);
    frames.extend(vec![quiet; 20]);

    let mut source = VecSource::new(frames, SAMPLE_RATE);
    let mut det = EndpointDetector::new(
        Box::new(EnergyVad::new(audio.energy_threshold)),
        audio.silence_frames(),
        Duration::from_secs(10),
    );

    let utterance = det.detect(&mut source).unwrap().unwrap();
    // Survives the 10-frame gap, seals after the speech resumes and the
    // full 12-frame window elapses
    assert_eq!(utterance.frame_count(), 3 + 10 + 2 + 12);
}
