//! Configuration management for the Aria assistant

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Assistant configuration
///
/// Loaded from a TOML file (see [`Config::load`]), with API keys
/// overridable through `ARIA_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Audio capture and endpoint detection
    pub audio: AudioConfig,

    /// Intent classification and routing
    pub nlp: NlpConfig,

    /// Speech-to-text collaborator
    pub stt: SttConfig,

    /// Text-to-speech collaborator
    pub tts: TtsConfig,

    /// Web search collaborator
    pub search: SearchConfig,

    /// Weather collaborator
    pub weather: WeatherConfig,

    /// Path to data directory (reminder store, model cache)
    pub data_dir: PathBuf,
}

/// Audio capture and voice-activity configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    /// Capture sample rate in Hz (16 kHz for speech)
    pub sample_rate: u32,

    /// Samples per frame handed to the endpoint detector
    pub frame_samples: usize,

    /// RMS energy over a frame's 16-bit samples above which the frame
    /// counts as speech
    pub energy_threshold: f32,

    /// Silence window that ends an utterance, in milliseconds.
    ///
    /// The detector converts this to a consecutive low-energy frame count
    /// using the frame duration (`frame_samples` / `sample_rate`), so the
    /// real-time meaning stays fixed when the frame size changes.
    pub silence_ms: u64,

    /// Hard cap on a single listening turn, in seconds
    pub listen_timeout_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            frame_samples: 1024,
            energy_threshold: 500.0,
            silence_ms: 800,
            listen_timeout_secs: 15,
        }
    }
}

impl AudioConfig {
    /// Duration of one frame at the configured rate
    #[must_use]
    pub const fn frame_duration(&self) -> Duration {
        Duration::from_micros(
            (self.frame_samples as u64 * 1_000_000) / self.sample_rate as u64,
        )
    }

    /// Silence window expressed as a consecutive low-energy frame count
    #[must_use]
    pub fn silence_frames(&self) -> usize {
        let frame_ms = self.frame_duration().as_millis().max(1);
        usize::try_from((u128::from(self.silence_ms) / frame_ms).max(1)).unwrap_or(1)
    }

    /// Hard cap on a single listening turn
    #[must_use]
    pub const fn listen_timeout(&self) -> Duration {
        Duration::from_secs(self.listen_timeout_secs)
    }
}

/// Intent classification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NlpConfig {
    /// Minimum cosine similarity for a classification to stick;
    /// below this the intent is reported as unknown
    pub confidence_threshold: f32,

    /// Cap on search responses handed back to the user, in characters
    pub search_truncate_chars: usize,

    /// Directory holding the ONNX sentence encoder and its tokenizer
    /// (`model.onnx` + `tokenizer.json`); only read with the `onnx` feature
    pub model_dir: Option<PathBuf>,
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.4,
            search_truncate_chars: 300,
            model_dir: None,
        }
    }
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SttConfig {
    /// Provider: "whisper" or "deepgram"
    pub provider: String,

    /// Model identifier (e.g. "whisper-1", "nova-2")
    pub model: String,

    /// API key; `ARIA_STT_API_KEY` overrides
    pub api_key: Option<String>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            provider: "whisper".to_string(),
            model: "whisper-1".to_string(),
            api_key: None,
        }
    }
}

/// Text-to-speech configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TtsConfig {
    /// Provider: "openai" or "espeak" (offline subprocess)
    pub provider: String,

    /// Voice identifier for API providers
    pub voice: String,

    /// Speed multiplier for API providers (0.25 to 4.0)
    pub speed: f32,

    /// Speaking rate in words per minute for espeak
    pub espeak_rate: u32,

    /// API key; `ARIA_TTS_API_KEY` overrides
    pub api_key: Option<String>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: "espeak".to_string(),
            voice: "alloy".to_string(),
            speed: 1.0,
            espeak_rate: 175,
            api_key: None,
        }
    }
}

/// Web search configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Provider: "wikipedia" or "duckduckgo" (both keyless)
    pub provider: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: "wikipedia".to_string(),
        }
    }
}

/// Weather configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    /// Provider: "openweather" (needs API key) or "wttr" (keyless)
    pub provider: String,

    /// API key for OpenWeatherMap; `ARIA_OPENWEATHER_API_KEY` overrides
    pub api_key: Option<String>,

    /// City used when the user names none
    pub default_city: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            provider: "wttr".to_string(),
            api_key: None,
            default_city: "London".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            nlp: NlpConfig::default(),
            stt: SttConfig::default(),
            tts: TtsConfig::default(),
            search: SearchConfig::default(),
            weather: WeatherConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults
    ///
    /// With no explicit path, reads `config.toml` from the platform config
    /// directory if present. API keys from `ARIA_*` environment variables
    /// override file values.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit path cannot be read or the file fails
    /// to parse
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .map_err(|e| Error::Config(format!("{}: {e}", p.display())))?;
                toml::from_str(&raw)?
            }
            None => {
                let default_path = config_file_path();
                if default_path.is_file() {
                    let raw = std::fs::read_to_string(&default_path)?;
                    toml::from_str(&raw)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env();
        config.validate()?;

        tracing::debug!(
            sample_rate = config.audio.sample_rate,
            silence_frames = config.audio.silence_frames(),
            confidence_threshold = config.nlp.confidence_threshold,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Path to the reminder store file
    #[must_use]
    pub fn reminders_path(&self) -> PathBuf {
        self.data_dir.join("reminders.json")
    }

    /// Apply environment variable overrides for secrets
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("ARIA_STT_API_KEY") {
            self.stt.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("ARIA_TTS_API_KEY") {
            self.tts.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("ARIA_OPENWEATHER_API_KEY") {
            self.weather.api_key = Some(key);
        }
    }

    /// Reject configurations the pipeline cannot run with
    fn validate(&self) -> Result<()> {
        if self.audio.frame_samples == 0 {
            return Err(Error::Config("audio.frame_samples must be non-zero".to_string()));
        }
        if self.audio.sample_rate == 0 {
            return Err(Error::Config("audio.sample_rate must be non-zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.nlp.confidence_threshold) {
            return Err(Error::Config(
                "nlp.confidence_threshold must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config file location (`~/.config/aria/config.toml` on Linux)
fn config_file_path() -> PathBuf {
    directories::ProjectDirs::from("dev", "omni", "aria").map_or_else(
        || PathBuf::from("config.toml"),
        |d| d.config_dir().join("config.toml"),
    )
}

/// Default data directory, created on first use by the reminder store
fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "omni", "aria").map_or_else(
        || PathBuf::from(".aria"),
        |d| d.data_dir().to_path_buf(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.sample_rate, 16_000);
        assert!((config.nlp.confidence_threshold - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn silence_window_converts_to_frames() {
        let audio = AudioConfig::default();
        // 1024 samples at 16 kHz = 64 ms per frame; 800 ms / 64 ms = 12 frames
        assert_eq!(audio.frame_duration().as_millis(), 64);
        assert_eq!(audio.silence_frames(), 12);
    }

    #[test]
    fn silence_frames_tracks_frame_size() {
        let mut audio = AudioConfig::default();
        audio.frame_samples = 512;
        // Halving the frame size doubles the frame count for the same window
        assert_eq!(audio.silence_frames(), 25);
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [audio]
            energy_threshold = 350.0

            [weather]
            provider = "openweather"
            default_city = "Paris"
            "#,
        )
        .unwrap();

        assert!((config.audio.energy_threshold - 350.0).abs() < f32::EPSILON);
        assert_eq!(config.weather.default_city, "Paris");
        // Untouched sections keep their defaults
        assert_eq!(config.audio.sample_rate, 16_000);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.nlp.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
