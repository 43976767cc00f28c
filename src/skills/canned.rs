//! Canned responses for conversational intents

use chrono::Local;
use rand::seq::SliceRandom;

use crate::nlp::Intent;

/// Fixed candidate responses per intent, with dynamic time/date
///
/// Selection among candidates is random, but a known intent always yields
/// a non-empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedResponses;

const GREET: &[&str] = &[
    "Hello! How can I help you today?",
    "Hi there! What can I do for you?",
    "Hey! Nice to hear from you!",
    "Greetings! How may I assist you?",
    "Hello! I'm here to help!",
];

const GOODBYE: &[&str] = &[
    "Goodbye! Have a great day!",
    "See you later! Take care!",
    "Bye! Come back soon!",
    "Farewell! Stay safe!",
    "Take care! See you next time!",
];

const HOW_ARE_YOU: &[&str] = &[
    "I'm doing great, thank you for asking! How are you?",
    "I'm excellent! Always ready to help. How about you?",
    "I'm functioning perfectly! What can I do for you?",
    "I'm wonderful, thanks! How can I assist you today?",
];

const THANK: &[&str] = &[
    "You're welcome!",
    "Happy to help!",
    "My pleasure!",
    "Anytime!",
    "Glad I could help!",
];

const NAME: &[&str] = &[
    "I'm Aria, your voice assistant!",
    "You can call me Aria. I'm here to help!",
    "My name is Aria. Nice to meet you!",
    "I'm Aria, your personal assistant!",
];

const HELP: &[&str] = &[
    "I can help you with: conversations, web searches, setting reminders, and controlling smart home devices. Just ask!",
    "I can search the web, set reminders, control lights and temperature, and chat with you. What would you like to do?",
    "My capabilities include: answering questions, web searches, reminders, and smart home control. How can I help?",
];

const JOKE: &[&str] = &[
    "Why don't scientists trust atoms? Because they make up everything!",
    "What do you call a bear with no teeth? A gummy bear!",
    "Why did the scarecrow win an award? He was outstanding in his field!",
    "What do you call a fake noodle? An impasta!",
    "Why don't eggs tell jokes? They'd crack each other up!",
    "What did the ocean say to the beach? Nothing, it just waved!",
    "Why can't a bicycle stand on its own? It's two tired!",
];

const UNKNOWN: &[&str] = &[
    "I'm not sure I understood that. Could you rephrase?",
    "Sorry, I didn't quite catch that. Can you say it differently?",
    "I'm still learning. Could you try asking in another way?",
    "Hmm, I'm not sure about that. What else can I help with?",
    "I didn't understand that. Try asking me about the weather, time, or setting a reminder.",
];

impl CannedResponses {
    /// Create a canned-response generator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generate a response for a canned intent
    ///
    /// Returns `None` for intents this collaborator does not cover.
    #[must_use]
    pub fn generate(&self, intent: &Intent) -> Option<String> {
        let candidates = match intent {
            Intent::Greet => GREET,
            Intent::Goodbye => GOODBYE,
            Intent::HowAreYou => HOW_ARE_YOU,
            Intent::Thank => THANK,
            Intent::Name => NAME,
            Intent::Help => HELP,
            Intent::Joke => JOKE,
            Intent::Time => return Some(time_response()),
            Intent::Date => return Some(date_response()),
            _ => return None,
        };

        Some(pick(candidates))
    }

    /// The generic "didn't understand" fallback
    #[must_use]
    pub fn fallback(&self) -> String {
        pick(UNKNOWN)
    }
}

fn pick(candidates: &[&str]) -> String {
    candidates
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("I'm here!")
        .to_string()
}

/// Current time, spoken form
fn time_response() -> String {
    format!("The current time is {}", Local::now().format("%I:%M %p"))
}

/// Current date, spoken form
fn date_response() -> String {
    format!("Today is {}", Local::now().format("%A, %B %d, %Y"))
}
