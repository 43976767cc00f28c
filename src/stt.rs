//! Speech-to-text collaborator
//!
//! The pipeline treats transcription as an opaque function from utterance
//! bytes to text; an empty transcript means "no speech recognized".

use crate::config::SttConfig;
use crate::{Error, Result};

/// Response from the OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from the Deepgram transcription API
#[derive(serde::Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(serde::Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(serde::Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(serde::Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// STT provider backend
#[derive(Clone, Copy, Debug)]
enum SttProvider {
    Whisper,
    Deepgram,
}

/// Transcribes sealed utterances to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
    provider: SttProvider,
}

impl SpeechToText {
    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the provider is unknown or the API key is missing
    pub fn from_config(config: &SttConfig) -> Result<Self> {
        let provider = match config.provider.as_str() {
            "whisper" => SttProvider::Whisper,
            "deepgram" => SttProvider::Deepgram,
            other => {
                return Err(Error::Config(format!("unknown STT provider: {other}")));
            }
        };

        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::Config("STT API key required (set ARIA_STT_API_KEY)".to_string())
            })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            provider,
        })
    }

    /// Transcribe WAV audio to text
    ///
    /// The returned text is trimmed; empty output signals that no speech
    /// was recognized.
    ///
    /// # Errors
    ///
    /// Returns error if the transcription request fails
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let text = match self.provider {
            SttProvider::Whisper => self.transcribe_whisper(audio).await?,
            SttProvider::Deepgram => self.transcribe_deepgram(audio).await?,
        };
        Ok(text.trim().to_string())
    }

    async fn transcribe_whisper(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("utterance.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;
        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }

    async fn transcribe_deepgram(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Deepgram transcription");

        let url = format!(
            "https://api.deepgram.com/v1/listen?model={}&punctuate=true",
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let result: DeepgramResponse = response.json().await?;

        let transcript = result
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .unwrap_or_default();

        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}
