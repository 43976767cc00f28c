//! Entity extraction conditioned on the classified intent
//!
//! Deterministic pattern and keyword rules, no ML. Rules are registered in
//! a table and each rule owns its own intent gate; slots gated on an
//! intent are left absent for every other intent, since several skills
//! treat "slot absent" differently from "slot present but empty".

use std::sync::LazyLock;

use regex::Regex;

use crate::nlp::intent::Intent;

/// Structured slots pulled out of one utterance
///
/// `None` means "not found"; gated slots stay `None` under non-gating
/// intents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entities {
    /// Room name, matched against the fixed room list
    pub room: Option<String>,

    /// First contiguous digit run in the text
    pub number: Option<i64>,

    /// Search query with boilerplate phrases stripped
    pub query: Option<String>,

    /// Set when the intent was unknown but the text looks like a question;
    /// the router uses it to upgrade the effective intent to a search
    pub likely_search: bool,

    /// City name (weather intents only)
    pub city: Option<String>,

    /// Whether the user asked about upcoming weather (weather intents
    /// only; `Some(false)` when no forward-looking keyword is present)
    pub forecast: Option<bool>,

    /// What to be reminded about (`reminder_set` only; always populated
    /// for that intent)
    pub reminder_text: Option<String>,
}

/// One extraction rule: reads the text, writes its slots
type Rule = fn(&RuleInput<'_>, &mut Entities);

/// Shared per-extraction context handed to every rule
struct RuleInput<'a> {
    text: &'a str,
    lower: String,
    intent: &'a Intent,
}

/// Ordered rule table; order only matters for readability since slots are
/// independent
const RULES: &[Rule] = &[
    room_rule,
    number_rule,
    query_rule,
    weather_rule,
    reminder_rule,
];

/// Pulls structured slots out of raw text
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityExtractor;

impl EntityExtractor {
    /// Create an extractor
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Extract all applicable slots for the given intent
    #[must_use]
    pub fn extract(&self, text: &str, intent: &Intent) -> Entities {
        let input = RuleInput {
            text,
            lower: text.to_lowercase(),
            intent,
        };

        let mut entities = Entities::default();
        for rule in RULES {
            rule(&input, &mut entities);
        }

        tracing::trace!(intent = %intent, ?entities, "entities extracted");
        entities
    }
}

/// Rooms the smart-home simulation knows about
const ROOMS: &[&str] = &["living room", "bedroom", "kitchen", "bathroom", "garage"];

fn room_rule(input: &RuleInput<'_>, entities: &mut Entities) {
    entities.room = ROOMS
        .iter()
        .find(|room| input.lower.contains(*room))
        .map(|room| (*room).to_string());
}

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("number pattern is valid"));

fn number_rule(input: &RuleInput<'_>, entities: &mut Entities) {
    entities.number = NUMBER_RE
        .find(input.text)
        .and_then(|m| m.as_str().parse::<i64>().ok());
}

/// Substrings whose presence marks the text as a question
const QUESTION_MARKERS: &[&str] = &[
    "what",
    "who",
    "where",
    "when",
    "why",
    "how",
    "tell me about",
    "search",
];

/// Boilerplate search phrases stripped from queries, longest-first so the
/// alternation prefers the longer match at a shared position
static SEARCH_BOILERPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:search for|look up|find|what is|who is|tell me about|google|search|what are|who are|where is|when is|why is|how is)\b",
    )
    .expect("boilerplate pattern is valid")
});

fn query_rule(input: &RuleInput<'_>, entities: &mut Entities) {
    let is_question = QUESTION_MARKERS
        .iter()
        .any(|marker| input.lower.contains(marker));

    let gated_in = matches!(input.intent, Intent::WebSearch | Intent::Unknown) || is_question;
    if !gated_in {
        return;
    }

    let query = SEARCH_BOILERPLATE_RE
        .replace_all(input.text, "")
        .trim()
        .to_string();
    entities.query = Some(query);

    if is_question && *input.intent == Intent::Unknown {
        entities.likely_search = true;
    }
}

/// Fixed gazetteer for weather city matching
const CITIES: &[&str] = &[
    "mohali",
    "chandigarh",
    "delhi",
    "mumbai",
    "bangalore",
    "hyderabad",
    "chennai",
    "kolkata",
    "pune",
    "ahmedabad",
    "jaipur",
    "lucknow",
    "kanpur",
    "nagpur",
    "indore",
    "paris",
    "london",
    "new york",
    "tokyo",
    "beijing",
    "sydney",
    "toronto",
    "berlin",
    "madrid",
    "rome",
];

/// Keywords marking a forward-looking weather request
const FORECAST_KEYWORDS: &[&str] = &[
    "tomorrow",
    "forecast",
    "next",
    "week",
    "coming",
    "three day",
    "3 day",
    "weekly",
    "upcoming",
    "future",
];

fn weather_rule(input: &RuleInput<'_>, entities: &mut Entities) {
    if !input.intent.is_weather() {
        return;
    }

    entities.city = CITIES
        .iter()
        .find(|city| input.lower.contains(*city))
        .map(|city| title_case(city));

    entities.forecast = Some(
        FORECAST_KEYWORDS
            .iter()
            .any(|keyword| input.lower.contains(keyword)),
    );
}

/// Phrases introducing a reminder, longest-first
static REMINDER_INTRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:don't let me forget to|remind me to|reminder to|remember to|remind me)\b")
        .expect("reminder pattern is valid")
});

fn reminder_rule(input: &RuleInput<'_>, entities: &mut Entities) {
    if *input.intent != Intent::ReminderSet {
        return;
    }

    // Fall back to the whole text so this slot is always populated for
    // the gating intent; the downstream handler is never blocked.
    entities.reminder_text = Some(
        REMINDER_INTRO_RE
            .find(input.text)
            .map_or(input.text, |m| input.text[m.end()..].trim_start())
            .trim()
            .to_string(),
    );
}

/// Uppercase the first letter of each word ("new york" -> "New York")
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str, intent: &Intent) -> Entities {
        EntityExtractor::new().extract(text, intent)
    }

    #[test]
    fn room_from_light_command() {
        let entities = extract("turn on the bedroom light", &Intent::LightOn);
        assert_eq!(entities.room.as_deref(), Some("bedroom"));
        assert_eq!(entities.number, None);
        assert_eq!(entities.query, None);
    }

    #[test]
    fn multiword_room_matches() {
        let entities = extract("lights off in the living room please", &Intent::LightOff);
        assert_eq!(entities.room.as_deref(), Some("living room"));
    }

    #[test]
    fn number_from_temperature_command() {
        let entities = extract("set temperature to 72", &Intent::TemperatureSet);
        assert_eq!(entities.number, Some(72));
        assert_eq!(entities.room, None);
    }

    #[test]
    fn first_number_wins() {
        let entities = extract("set it to 21 or maybe 23", &Intent::TemperatureSet);
        assert_eq!(entities.number, Some(21));
    }

    #[test]
    fn query_strips_boilerplate() {
        let entities = extract("search for rust tutorials", &Intent::WebSearch);
        assert_eq!(entities.query.as_deref(), Some("rust tutorials"));
        assert!(!entities.likely_search);
    }

    #[test]
    fn query_stripping_is_case_insensitive() {
        let entities = extract("What is the Eiffel Tower", &Intent::WebSearch);
        assert_eq!(entities.query.as_deref(), Some("the Eiffel Tower"));
    }

    #[test]
    fn unknown_question_sets_likely_search() {
        let entities = extract("who invented the telephone", &Intent::Unknown);
        assert!(entities.likely_search);
        assert_eq!(entities.query.as_deref(), Some("who invented the telephone"));
    }

    #[test]
    fn unknown_without_question_has_no_search_flag() {
        let entities = extract("blorp fizzle", &Intent::Unknown);
        assert!(!entities.likely_search);
        // Unknown intent still computes the query slot
        assert_eq!(entities.query.as_deref(), Some("blorp fizzle"));
    }

    #[test]
    fn query_absent_for_non_search_statements() {
        let entities = extract("turn on the light", &Intent::LightOn);
        assert_eq!(entities.query, None);
        assert!(!entities.likely_search);
    }

    #[test]
    fn city_and_forecast_for_weather_intent() {
        let entities = extract("what's the weather in new york tomorrow", &Intent::Weather);
        assert_eq!(entities.city.as_deref(), Some("New York"));
        assert_eq!(entities.forecast, Some(true));
    }

    #[test]
    fn forecast_defaults_to_false_under_weather() {
        let entities = extract("what's the weather in paris", &Intent::WeatherCity);
        assert_eq!(entities.city.as_deref(), Some("Paris"));
        assert_eq!(entities.forecast, Some(false));
    }

    #[test]
    fn weather_slots_absent_for_other_intents() {
        // "paris" and "tomorrow" are present, but the gate is the intent
        let entities = extract("remind me to call paris tomorrow", &Intent::ReminderSet);
        assert_eq!(entities.city, None);
        assert_eq!(entities.forecast, None);
    }

    #[test]
    fn reminder_text_after_introducing_phrase() {
        let entities = extract("remind me to buy milk", &Intent::ReminderSet);
        assert_eq!(entities.reminder_text.as_deref(), Some("buy milk"));
    }

    #[test]
    fn reminder_text_prefers_longest_phrase() {
        let entities = extract("don't let me forget to water the plants", &Intent::ReminderSet);
        assert_eq!(entities.reminder_text.as_deref(), Some("water the plants"));
    }

    #[test]
    fn reminder_text_falls_back_to_whole_input() {
        let entities = extract("buy milk", &Intent::ReminderSet);
        assert_eq!(entities.reminder_text.as_deref(), Some("buy milk"));
    }

    #[test]
    fn reminder_text_absent_for_other_intents() {
        let entities = extract("remind me to buy milk", &Intent::WebSearch);
        assert_eq!(entities.reminder_text, None);
    }

    #[test]
    fn title_case_handles_multiword_names() {
        assert_eq!(title_case("new york"), "New York");
        assert_eq!(title_case("paris"), "Paris");
    }
}
