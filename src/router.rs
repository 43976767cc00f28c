//! Response routing
//!
//! The single dispatch table from `(intent, entities)` to response text,
//! including the fallback and truncation policy. Collaborator failures
//! stop here: the router always hands back something speakable.

use std::sync::Arc;

use crate::nlp::{Entities, Intent};
use crate::skills::{CannedResponses, SkillHandler};

/// Apology used when a collaborator fails or returns malformed data
const APOLOGY: &str = "Sorry, I ran into a problem handling that. Please try again.";

/// Routes classified intents to skill handlers
pub struct ResponseRouter {
    canned: CannedResponses,
    search: Arc<dyn SkillHandler>,
    reminders: Arc<dyn SkillHandler>,
    smart_home: Arc<dyn SkillHandler>,
    weather: Arc<dyn SkillHandler>,
    truncate_chars: usize,
}

impl ResponseRouter {
    /// Build a router over the given skill handlers
    #[must_use]
    pub fn new(
        canned: CannedResponses,
        search: Arc<dyn SkillHandler>,
        reminders: Arc<dyn SkillHandler>,
        smart_home: Arc<dyn SkillHandler>,
        weather: Arc<dyn SkillHandler>,
        truncate_chars: usize,
    ) -> Self {
        Self {
            canned,
            search,
            reminders,
            smart_home,
            weather,
            truncate_chars,
        }
    }

    /// Route one utterance to a response
    ///
    /// Never fails and never returns an empty string; every completed
    /// utterance gets some reply. The caller owns loop termination on
    /// `goodbye` — this only produces the text.
    pub async fn route(&self, intent: &Intent, entities: &Entities, raw_text: &str) -> String {
        tracing::debug!(intent = %intent, "routing");

        match intent {
            Intent::Greet
            | Intent::Goodbye
            | Intent::HowAreYou
            | Intent::Thank
            | Intent::Name
            | Intent::Help
            | Intent::Joke
            | Intent::Time
            | Intent::Date => self
                .canned
                .generate(intent)
                .unwrap_or_else(|| self.canned.fallback()),

            Intent::WebSearch => self.dispatch_search(entities, raw_text).await,

            Intent::ReminderSet => {
                // Missing reminder text becomes a clarifying question, not
                // a collaborator call
                if entities
                    .reminder_text
                    .as_deref()
                    .is_none_or(|text| text.trim().is_empty())
                {
                    return "What would you like me to remind you about?".to_string();
                }
                self.delegate(&self.reminders, intent, entities, raw_text)
                    .await
            }

            Intent::ReminderList => {
                self.delegate(&self.reminders, intent, entities, raw_text)
                    .await
            }

            Intent::LightOn | Intent::LightOff | Intent::DeviceStatus => {
                self.delegate(&self.smart_home, intent, entities, raw_text)
                    .await
            }

            Intent::TemperatureSet => {
                if entities.number.is_none() {
                    return "What temperature would you like to set?".to_string();
                }
                self.delegate(&self.smart_home, intent, entities, raw_text)
                    .await
            }

            Intent::Weather | Intent::WeatherCity => {
                self.delegate(&self.weather, intent, entities, raw_text)
                    .await
            }

            Intent::Unknown if entities.likely_search => {
                // Question-shaped input upgrades to a search
                tracing::debug!("question pattern detected, treating as web search");
                self.dispatch_search(entities, raw_text).await
            }

            Intent::Unknown | Intent::Custom(_) => {
                // Offer to search when extraction found a plausible query
                if let Some(query) = entities.query.as_deref().filter(|q| !q.trim().is_empty()) {
                    return format!(
                        "I'm not sure what you're asking, but I can search for information. \
                         Would you like me to search for '{query}'?"
                    );
                }
                self.canned.fallback()
            }
        }
    }

    /// Delegate to the search handler and apply the truncation cap
    async fn dispatch_search(&self, entities: &Entities, raw_text: &str) -> String {
        let response = self
            .delegate(&self.search, &Intent::WebSearch, entities, raw_text)
            .await;
        truncate_at_paragraph(&response, self.truncate_chars)
    }

    /// Call a handler, converting failures into the apology response
    async fn delegate(
        &self,
        handler: &Arc<dyn SkillHandler>,
        intent: &Intent,
        entities: &Entities,
        raw_text: &str,
    ) -> String {
        match handler.handle(intent, entities, raw_text).await {
            Ok(response) if !response.trim().is_empty() => response,
            Ok(_) => {
                tracing::warn!(intent = %intent, "skill returned empty response");
                APOLOGY.to_string()
            }
            Err(e) => {
                tracing::warn!(intent = %intent, error = %e, "skill failed");
                APOLOGY.to_string()
            }
        }
    }
}

/// Truncate a response to the cap, preferring a paragraph boundary
///
/// If a paragraph break (double newline) falls within the first `cap`
/// characters, the text is cut there; otherwise it is cut at exactly `cap`
/// characters. Text within the cap passes through untouched.
#[must_use]
pub fn truncate_at_paragraph(text: &str, cap: usize) -> String {
    let Some((cap_bytes, _)) = text.char_indices().nth(cap) else {
        // Fewer than `cap` characters
        return text.to_string();
    };

    text[..cap_bytes].find("\n\n").map_or_else(
        || text[..cap_bytes].to_string(),
        |boundary| text[..boundary].to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_passes_through() {
        let text = "short answer";
        assert_eq!(truncate_at_paragraph(text, 300), text);
    }

    #[test]
    fn text_at_exactly_the_cap_passes_through() {
        let text = "x".repeat(300);
        assert_eq!(truncate_at_paragraph(&text, 300), text);
    }

    #[test]
    fn long_text_with_paragraph_break_cuts_at_the_break() {
        let mut text = "a".repeat(120);
        text.push_str("\n\n");
        text.push_str(&"b".repeat(378));
        assert_eq!(text.len(), 500);

        let truncated = truncate_at_paragraph(&text, 300);
        assert_eq!(truncated.len(), 120);
        assert_eq!(truncated, "a".repeat(120));
    }

    #[test]
    fn long_text_without_break_cuts_at_the_cap() {
        let text = "c".repeat(500);
        let truncated = truncate_at_paragraph(&text, 300);
        assert_eq!(truncated.len(), 300);
    }

    #[test]
    fn break_beyond_the_cap_is_ignored() {
        let mut text = "a".repeat(350);
        text.push_str("\n\n");
        text.push_str(&"b".repeat(148));

        let truncated = truncate_at_paragraph(&text, 300);
        assert_eq!(truncated.len(), 300);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "é".repeat(400);
        let truncated = truncate_at_paragraph(&text, 300);
        assert_eq!(truncated.chars().count(), 300);
    }
}
