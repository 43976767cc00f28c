//! Error types for the Aria assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the assistant pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device or stream error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Embedding model error
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Skill handler error
    #[error("skill error: {0}")]
    Skill(String),

    /// Web search error
    #[error("search error: {0}")]
    Search(String),

    /// Weather lookup error
    #[error("weather error: {0}")]
    Weather(String),

    /// Reminder storage error
    #[error("reminder error: {0}")]
    Reminder(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
