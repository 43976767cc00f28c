//! The closed set of user intents

use std::fmt;

/// A user's communicative goal, decided by the classifier
///
/// The built-in variants form a closed set so routing can match
/// exhaustively; intents registered at runtime through the classifier's
/// `add_examples` surface as [`Intent::Custom`] and take the fallback
/// route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Intent {
    Greet,
    Goodbye,
    HowAreYou,
    Thank,
    Name,
    Help,
    Joke,
    Time,
    Date,
    WebSearch,
    ReminderSet,
    ReminderList,
    LightOn,
    LightOff,
    TemperatureSet,
    DeviceStatus,
    Weather,
    WeatherCity,
    /// Classification fell below the confidence threshold
    Unknown,
    /// Intent registered at runtime, unknown to the routing table
    Custom(String),
}

impl Intent {
    /// Stable wire/config name for the intent
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Greet => "greet",
            Self::Goodbye => "goodbye",
            Self::HowAreYou => "how_are_you",
            Self::Thank => "thank",
            Self::Name => "name",
            Self::Help => "help",
            Self::Joke => "joke",
            Self::Time => "time",
            Self::Date => "date",
            Self::WebSearch => "web_search",
            Self::ReminderSet => "reminder_set",
            Self::ReminderList => "reminder_list",
            Self::LightOn => "light_on",
            Self::LightOff => "light_off",
            Self::TemperatureSet => "temperature_set",
            Self::DeviceStatus => "device_status",
            Self::Weather => "weather",
            Self::WeatherCity => "weather_city",
            Self::Unknown => "unknown",
            Self::Custom(name) => name,
        }
    }

    /// Parse a stable name back into an intent
    ///
    /// Names outside the built-in set become [`Intent::Custom`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "greet" => Self::Greet,
            "goodbye" => Self::Goodbye,
            "how_are_you" => Self::HowAreYou,
            "thank" => Self::Thank,
            "name" => Self::Name,
            "help" => Self::Help,
            "joke" => Self::Joke,
            "time" => Self::Time,
            "date" => Self::Date,
            "web_search" => Self::WebSearch,
            "reminder_set" => Self::ReminderSet,
            "reminder_list" => Self::ReminderList,
            "light_on" => Self::LightOn,
            "light_off" => Self::LightOff,
            "temperature_set" => Self::TemperatureSet,
            "device_status" => Self::DeviceStatus,
            "weather" => Self::Weather,
            "weather_city" => Self::WeatherCity,
            "unknown" => Self::Unknown,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Whether this is one of the weather intents
    #[must_use]
    pub const fn is_weather(&self) -> bool {
        matches!(self, Self::Weather | Self::WeatherCity)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
