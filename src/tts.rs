//! Text-to-speech collaborator
//!
//! Providers: the OpenAI speech API (MP3 out) and an offline espeak
//! subprocess (WAV out). Decoding and playback live in the audio module.

use crate::config::TtsConfig;
use crate::{Error, Result};

/// Synthesized speech, tagged with its container format
pub enum SpeechAudio {
    Wav(Vec<u8>),
    Mp3(Vec<u8>),
}

/// TTS provider backend
enum TtsProvider {
    OpenAi {
        api_key: String,
        voice: String,
        speed: f32,
    },
    Espeak {
        rate: u32,
    },
}

/// Synthesizes speech from response text
pub struct TextToSpeech {
    client: reqwest::Client,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the provider is unknown or a required API key is
    /// missing
    pub fn from_config(config: &TtsConfig) -> Result<Self> {
        let provider = match config.provider.as_str() {
            "openai" => {
                let api_key = config
                    .api_key
                    .clone()
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| {
                        Error::Config("TTS API key required (set ARIA_TTS_API_KEY)".to_string())
                    })?;
                TtsProvider::OpenAi {
                    api_key,
                    voice: config.voice.clone(),
                    speed: config.speed,
                }
            }
            "espeak" => TtsProvider::Espeak {
                rate: config.espeak_rate,
            },
            other => {
                return Err(Error::Config(format!("unknown TTS provider: {other}")));
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            provider,
        })
    }

    /// Synthesize text to speech audio
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<SpeechAudio> {
        match &self.provider {
            TtsProvider::OpenAi {
                api_key,
                voice,
                speed,
            } => self.synthesize_openai(api_key, voice, *speed, text).await,
            TtsProvider::Espeak { rate } => synthesize_espeak(*rate, text).await,
        }
    }

    async fn synthesize_openai(
        &self,
        api_key: &str,
        voice: &str,
        speed: f32,
        text: &str,
    ) -> Result<SpeechAudio> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: "tts-1",
            input: text,
            voice,
            speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(bytes = audio.len(), "speech synthesized");
        Ok(SpeechAudio::Mp3(audio.to_vec()))
    }
}

/// Synthesize with the espeak subprocess, capturing WAV from stdout
async fn synthesize_espeak(rate: u32, text: &str) -> Result<SpeechAudio> {
    let output = tokio::process::Command::new("espeak")
        .arg("-s")
        .arg(rate.to_string())
        .arg("--stdout")
        .arg(text)
        .output()
        .await
        .map_err(|e| Error::Tts(format!("espeak not available: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Tts(format!("espeak failed: {stderr}")));
    }

    tracing::debug!(bytes = output.stdout.len(), "speech synthesized");
    Ok(SpeechAudio::Wav(output.stdout))
}
