//! The conversation driver
//!
//! Ties the pipeline together: capture, endpoint detection, transcription,
//! classification, entity extraction, routing, and spoken replies.

use std::sync::Arc;

use crate::audio::{AudioPlayback, EndpointDetector, EnergyVad, MicSource};
use crate::config::Config;
use crate::nlp::{
    Entities, EntityExtractor, Intent, IntentClassifier, default_embedder,
};
use crate::router::ResponseRouter;
use crate::skills::{
    CannedResponses, ReminderStore, SkillHandler, SmartHome, WeatherSkill, WebSearch,
};
use crate::stt::SpeechToText;
use crate::tts::{SpeechAudio, TextToSpeech};
use crate::{Error, Result};

/// One processed utterance: what was understood and what was answered
#[derive(Debug, Clone)]
pub struct Exchange {
    pub intent: Intent,
    pub confidence: f32,
    pub entities: Entities,
    pub response: String,
}

/// The assembled assistant
///
/// Construction wires the NLP core and skills without touching audio
/// hardware; [`Assistant::run`] opens the microphone and speakers.
pub struct Assistant {
    config: Config,
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    router: ResponseRouter,
}

impl Assistant {
    /// Wire up the pipeline from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a component cannot be built (bad provider name,
    /// missing API key, unreadable reminder store, embedding model
    /// failure)
    pub fn new(config: Config) -> Result<Self> {
        let embedder = default_embedder(&config.nlp)?;
        let classifier = IntentClassifier::new(embedder, config.nlp.confidence_threshold)?;

        let search: Arc<dyn SkillHandler> = match config.search.provider.as_str() {
            "wikipedia" => Arc::new(WebSearch::new_wikipedia()),
            "duckduckgo" => Arc::new(WebSearch::new_duckduckgo()),
            other => {
                return Err(Error::Config(format!("unknown search provider: {other}")));
            }
        };

        let weather: Arc<dyn SkillHandler> = match config.weather.provider.as_str() {
            "wttr" => Arc::new(WeatherSkill::new_wttr(config.weather.default_city.clone())),
            "openweather" => {
                let api_key = config.weather.api_key.clone().ok_or_else(|| {
                    Error::Config(
                        "weather.api_key required for the openweather provider".to_string(),
                    )
                })?;
                Arc::new(WeatherSkill::new_openweather(
                    api_key,
                    config.weather.default_city.clone(),
                )?)
            }
            other => {
                return Err(Error::Config(format!("unknown weather provider: {other}")));
            }
        };

        let reminders = Arc::new(ReminderStore::open(config.reminders_path())?);
        tracing::info!(reminders = reminders.count(), "reminder store ready");

        let router = ResponseRouter::new(
            CannedResponses::new(),
            search,
            reminders,
            Arc::new(SmartHome::new()),
            weather,
            config.nlp.search_truncate_chars,
        );

        Ok(Self {
            config,
            classifier,
            extractor: EntityExtractor::new(),
            router,
        })
    }

    /// Classify, extract, and route one text utterance
    ///
    /// # Errors
    ///
    /// Returns error if the embedding model fails; routing itself never
    /// fails
    pub async fn respond(&self, text: &str) -> Result<Exchange> {
        let classification = self.classifier.classify(text)?;
        let entities = self.extractor.extract(text, &classification.intent);

        tracing::info!(
            intent = %classification.intent,
            confidence = classification.confidence,
            "processing utterance"
        );

        let response = self
            .router
            .route(&classification.intent, &entities, text)
            .await;

        Ok(Exchange {
            intent: classification.intent,
            confidence: classification.confidence,
            entities,
            response,
        })
    }

    /// The intent classifier, for runtime example registration
    #[must_use]
    pub const fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Run the voice loop until the user says goodbye
    ///
    /// # Errors
    ///
    /// Returns error on audio hardware failure or a frame-source fault;
    /// per-utterance collaborator failures are spoken as apologies and the
    /// loop continues
    #[allow(clippy::future_not_send)]
    pub async fn run(&self) -> Result<()> {
        let stt = SpeechToText::from_config(&self.config.stt)?;
        let tts = TextToSpeech::from_config(&self.config.tts)?;
        let playback = AudioPlayback::new()?;
        let mut mic = MicSource::start(&self.config.audio)?;

        let mut detector = EndpointDetector::new(
            Box::new(EnergyVad::new(self.config.audio.energy_threshold)),
            self.config.audio.silence_frames(),
            self.config.audio.listen_timeout(),
        );

        let greeting = "Hello! I'm Aria, your voice assistant. How can I help you today?";
        println!("{greeting}");
        speak(&tts, &playback, greeting).await;

        let mut exchanges = 0_u64;

        loop {
            mic.clear();
            tracing::info!("listening");

            // A source fault is fatal; silence is not
            let Some(utterance) = detector.detect(&mut mic)? else {
                let reprompt = "I didn't catch that. Please try again.";
                println!("{reprompt}");
                speak(&tts, &playback, reprompt).await;
                continue;
            };

            let wav = utterance.into_wav()?;
            let text = match stt.transcribe(&wav).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "transcription failed");
                    speak(&tts, &playback, "Sorry, I had trouble hearing that.").await;
                    continue;
                }
            };

            if text.is_empty() {
                let reprompt = "I didn't catch that. Please try again.";
                println!("{reprompt}");
                speak(&tts, &playback, reprompt).await;
                continue;
            }

            exchanges += 1;
            println!("You: {text}");

            let exchange = match self.respond(&text).await {
                Ok(exchange) => exchange,
                Err(e) => {
                    tracing::error!(error = %e, "failed to process utterance");
                    speak(&tts, &playback, "Sorry, something went wrong. Please try again.")
                        .await;
                    continue;
                }
            };

            println!("Aria: {}", exchange.response);
            speak(&tts, &playback, &exchange.response).await;

            // The router only produces text; ending the loop is ours
            if exchange.intent == Intent::Goodbye {
                break;
            }
        }

        tracing::info!(exchanges, "assistant stopped");
        Ok(())
    }
}

/// Speak a reply, degrading to text-only output on TTS failure
async fn speak(tts: &TextToSpeech, playback: &AudioPlayback, text: &str) {
    let played = match tts.synthesize(text).await {
        Ok(SpeechAudio::Wav(bytes)) => playback.play_wav(&bytes).await,
        Ok(SpeechAudio::Mp3(bytes)) => playback.play_mp3(&bytes).await,
        Err(e) => {
            tracing::warn!(error = %e, "TTS failed; reply shown as text only");
            return;
        }
    };

    if let Err(e) = played {
        tracing::warn!(error = %e, "playback failed");
    }
}
