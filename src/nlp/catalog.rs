//! The intent catalog: labeled example phrases per intent

use crate::nlp::intent::Intent;

/// One intent and its example phrases, in registration order
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub intent: Intent,
    pub phrases: Vec<String>,
}

/// Mapping from intent to an ordered set of example phrases
///
/// Iteration order is insertion order; the classifier's first-wins
/// tie-break depends on it staying stable.
#[derive(Debug, Clone, Default)]
pub struct IntentCatalog {
    entries: Vec<CatalogEntry>,
}

impl IntentCatalog {
    /// Create an empty catalog
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The built-in catalog covering every routed intent
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (intent, phrases) in BUILTIN_EXAMPLES {
            catalog.add(intent.clone(), phrases.iter().map(ToString::to_string));
        }
        catalog
    }

    /// Append phrases to an existing intent, or register a new intent
    pub fn add<I>(&mut self, intent: Intent, phrases: I)
    where
        I: IntoIterator<Item = String>,
    {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.intent == intent) {
            entry.phrases.extend(phrases);
        } else {
            self.entries.push(CatalogEntry {
                intent,
                phrases: phrases.into_iter().collect(),
            });
        }
    }

    /// Iterate entries in stable registration order
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Phrases registered for an intent, if any
    #[must_use]
    pub fn phrases(&self, intent: &Intent) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| &e.intent == intent)
            .map(|e| e.phrases.as_slice())
    }

    /// Number of registered intents
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no intents
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Example phrases for every built-in intent
const BUILTIN_EXAMPLES: &[(Intent, &[&str])] = &[
    (
        Intent::Greet,
        &[
            "hello",
            "hi",
            "hey",
            "good morning",
            "good afternoon",
            "good evening",
            "greetings",
            "howdy",
            "what's up",
            "yo",
        ],
    ),
    (
        Intent::Goodbye,
        &[
            "bye",
            "goodbye",
            "see you",
            "farewell",
            "take care",
            "see you later",
            "catch you later",
            "gotta go",
            "bye bye",
        ],
    ),
    (
        Intent::HowAreYou,
        &[
            "how are you",
            "how are you doing",
            "how do you feel",
            "are you ok",
            "what's up with you",
            "how's it going",
        ],
    ),
    (
        Intent::Thank,
        &[
            "thank you",
            "thanks",
            "thank you very much",
            "thanks a lot",
            "appreciate it",
            "cheers",
            "thx",
        ],
    ),
    (
        Intent::Time,
        &[
            "what time is it",
            "current time",
            "tell me the time",
            "what's the time",
            "time please",
            "do you have the time",
        ],
    ),
    (
        Intent::Date,
        &[
            "what's the date",
            "what day is it",
            "tell me the date",
            "what's today's date",
            "current date",
        ],
    ),
    (
        Intent::Joke,
        &[
            "tell me a joke",
            "make me laugh",
            "say something funny",
            "do you know any jokes",
            "joke please",
            "tell a joke",
        ],
    ),
    (
        Intent::Name,
        &[
            "what's your name",
            "who are you",
            "your name please",
            "what should I call you",
            "introduce yourself",
            "tell me your name",
        ],
    ),
    (
        Intent::Help,
        &[
            "help me",
            "what can you do",
            "your capabilities",
            "how do you work",
            "what are your features",
            "help",
        ],
    ),
    (
        Intent::WebSearch,
        &[
            "search for",
            "look up",
            "find information about",
            "google",
            "search the web",
            "what is",
            "who is",
            "tell me about",
            "search wikipedia",
        ],
    ),
    (
        Intent::ReminderSet,
        &[
            "remind me",
            "set a reminder",
            "create reminder",
            "don't let me forget",
            "reminder to",
            "remember to",
        ],
    ),
    (
        Intent::ReminderList,
        &[
            "list reminders",
            "show reminders",
            "what are my reminders",
            "do I have any reminders",
            "my reminders",
        ],
    ),
    (
        Intent::LightOn,
        &[
            "turn on the light",
            "turn on light",
            "lights on",
            "switch on the light",
            "enable light",
            "light on",
            "turn the light on",
            "turn lights on",
            "switch lights on",
            "turn on living room light",
            "turn on bedroom light",
        ],
    ),
    (
        Intent::LightOff,
        &[
            "turn off the light",
            "turn off light",
            "lights off",
            "switch off the light",
            "disable light",
            "light off",
            "turn the light off",
            "turn lights off",
            "switch lights off",
            "turn off living room light",
            "turn off bedroom light",
        ],
    ),
    (
        Intent::TemperatureSet,
        &[
            "set temperature",
            "change temperature",
            "adjust temperature",
            "make it warmer",
            "make it cooler",
            "set thermostat",
        ],
    ),
    (
        Intent::DeviceStatus,
        &[
            "device status",
            "what's the status",
            "are lights on",
            "check devices",
            "home status",
            "show devices",
        ],
    ),
    (
        Intent::Weather,
        &[
            "what's the weather",
            "how's the weather",
            "is it raining",
            "will it rain today",
            "weather forecast",
            "temperature outside",
            "is it sunny",
            "weather today",
            "will it snow",
            "what's the temperature",
            "how hot is it",
            "how cold is it",
            "weather report",
            "current weather",
            "is it going to rain",
            "will it be sunny",
            "weather tomorrow",
            "three day forecast",
            "weekly weather",
        ],
    ),
    (
        Intent::WeatherCity,
        &[
            "weather in Paris",
            "temperature in London",
            "what's the weather in New York",
            "weather in Tokyo",
            "how's the weather in Berlin",
            "temperature in Mumbai",
        ],
    ),
];
