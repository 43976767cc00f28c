//! Aria - voice assistant pipeline
//!
//! This library provides the core of a voice-interaction pipeline:
//! - Endpoint detection (voice-activity-gated streaming recording)
//! - Semantic intent classification over a phrase catalog
//! - Rule-based entity extraction
//! - Response routing to skill handlers
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    Audio front end                    │
//! │   MicSource │ EndpointDetector │ Utterance (WAV)     │
//! └──────────────────────┬───────────────────────────────┘
//!                        │ SpeechToText
//! ┌──────────────────────▼───────────────────────────────┐
//! │                      NLP core                         │
//! │   IntentClassifier │ EntityExtractor                  │
//! └──────────────────────┬───────────────────────────────┘
//!                        │
//! ┌──────────────────────▼───────────────────────────────┐
//! │                  ResponseRouter                       │
//! │   canned │ search │ reminders │ smart home │ weather │
//! └──────────────────────┬───────────────────────────────┘
//!                        │ TextToSpeech → AudioPlayback
//! ```

pub mod assistant;
pub mod audio;
pub mod config;
pub mod error;
pub mod nlp;
pub mod router;
pub mod skills;
pub mod stt;
pub mod tts;

pub use assistant::{Assistant, Exchange};
pub use audio::{
    AudioFrame, AudioPlayback, DetectorState, EndpointDetector, EnergyVad, FrameSource,
    MicSource, Utterance, VadStrategy, WavFileSource,
};
pub use config::Config;
pub use error::{Error, Result};
pub use nlp::{
    Classification, Entities, EntityExtractor, HashEmbedder, Intent, IntentCatalog,
    IntentClassifier, TextEmbedder, cosine_similarity,
};
pub use router::{ResponseRouter, truncate_at_paragraph};
pub use skills::{
    CannedResponses, ReminderStore, SkillHandler, SmartHome, WeatherSkill, WebSearch,
};
pub use stt::SpeechToText;
pub use tts::{SpeechAudio, TextToSpeech};
