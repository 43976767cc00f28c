//! Weather skill
//!
//! Two interchangeable providers: OpenWeatherMap (API key) and wttr.in
//! (keyless). The skill, not the router, owns the default city and the
//! spoken formatting.

use async_trait::async_trait;
use serde::Deserialize;

use crate::nlp::{Entities, Intent};
use crate::skills::SkillHandler;
use crate::{Error, Result};

/// Weather provider backend
#[derive(Debug, Clone)]
pub enum WeatherProvider {
    /// OpenWeatherMap current-weather and forecast APIs
    OpenWeather { api_key: String },
    /// wttr.in JSON API, no key required
    Wttr,
}

/// Weather lookup skill
pub struct WeatherSkill {
    provider: WeatherProvider,
    client: reqwest::Client,
    default_city: String,
}

// OpenWeatherMap response shapes

#[derive(Deserialize)]
struct OwmCurrent {
    name: String,
    sys: OwmSys,
    main: OwmMain,
    weather: Vec<OwmCondition>,
    wind: OwmWind,
}

#[derive(Deserialize)]
struct OwmSys {
    #[serde(default)]
    country: String,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Deserialize)]
struct OwmForecast {
    list: Vec<OwmForecastEntry>,
    city: OwmForecastCity,
}

#[derive(Deserialize)]
struct OwmForecastEntry {
    main: OwmMain,
    weather: Vec<OwmCondition>,
}

#[derive(Deserialize)]
struct OwmForecastCity {
    name: String,
}

// wttr.in j1 response shapes (numbers arrive as strings)

#[derive(Deserialize)]
struct WttrReport {
    current_condition: Vec<WttrCurrent>,
    weather: Vec<WttrDay>,
}

#[derive(Deserialize)]
struct WttrCurrent {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    humidity: String,
    #[serde(rename = "weatherDesc")]
    weather_desc: Vec<WttrValue>,
}

#[derive(Deserialize)]
struct WttrDay {
    #[serde(rename = "maxtempC")]
    max_temp_c: String,
    #[serde(rename = "mintempC")]
    min_temp_c: String,
    hourly: Vec<WttrHour>,
}

#[derive(Deserialize)]
struct WttrHour {
    #[serde(rename = "weatherDesc")]
    weather_desc: Vec<WttrValue>,
}

#[derive(Deserialize)]
struct WttrValue {
    value: String,
}

impl WeatherSkill {
    /// Create a skill backed by OpenWeatherMap
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new_openweather(api_key: String, default_city: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenWeatherMap API key required for weather".to_string(),
            ));
        }

        Ok(Self {
            provider: WeatherProvider::OpenWeather { api_key },
            client: reqwest::Client::new(),
            default_city,
        })
    }

    /// Create a skill backed by wttr.in
    #[must_use]
    pub fn new_wttr(default_city: String) -> Self {
        Self {
            provider: WeatherProvider::Wttr,
            client: reqwest::Client::new(),
            default_city,
        }
    }

    /// Current conditions for a city, spoken form
    ///
    /// # Errors
    ///
    /// Returns error if the provider request fails
    pub async fn current(&self, city: &str) -> Result<String> {
        match &self.provider {
            WeatherProvider::OpenWeather { api_key } => self.owm_current(api_key, city).await,
            WeatherProvider::Wttr => self.wttr_report(city, false).await,
        }
    }

    /// Tomorrow's outlook for a city, spoken form
    ///
    /// # Errors
    ///
    /// Returns error if the provider request fails
    pub async fn forecast(&self, city: &str) -> Result<String> {
        match &self.provider {
            WeatherProvider::OpenWeather { api_key } => self.owm_forecast(api_key, city).await,
            WeatherProvider::Wttr => self.wttr_report(city, true).await,
        }
    }

    async fn owm_current(&self, api_key: &str, city: &str) -> Result<String> {
        let url = format!(
            "https://api.openweathermap.org/data/2.5/weather?q={}&appid={api_key}&units=metric",
            urlencoding::encode(city)
        );

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(city_not_found(city));
        }
        let response = response.error_for_status().map_err(Error::Http)?;
        let report: OwmCurrent = response.json().await?;

        Ok(format_owm_current(&report))
    }

    async fn owm_forecast(&self, api_key: &str, city: &str) -> Result<String> {
        let url = format!(
            "https://api.openweathermap.org/data/2.5/forecast?q={}&appid={api_key}&units=metric",
            urlencoding::encode(city)
        );

        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(city_not_found(city));
        }
        let response = response.error_for_status().map_err(Error::Http)?;
        let report: OwmForecast = response.json().await?;

        // Entries arrive in 3-hour steps; ~8 steps ahead is tomorrow
        let Some(entry) = report.list.get(8).or_else(|| report.list.last()) else {
            return Ok(city_not_found(city));
        };

        let description = entry
            .weather
            .first()
            .map_or("unsettled", |c| c.description.as_str());

        Ok(format!(
            "Tomorrow in {}, expect {description} with temperatures around {} degrees Celsius.",
            report.city.name,
            entry.main.temp.round()
        ))
    }

    async fn wttr_report(&self, city: &str, forecast: bool) -> Result<String> {
        let url = format!("https://wttr.in/{}?format=j1", urlencoding::encode(city));

        let response = self.client.get(&url).send().await?;
        let response = response.error_for_status().map_err(Error::Http)?;
        let report: WttrReport = response.json().await?;

        if forecast {
            // weather[0] is today; [1] is tomorrow when present
            let Some(day) = report.weather.get(1).or_else(|| report.weather.first()) else {
                return Ok(city_not_found(city));
            };
            let description = day
                .hourly
                .get(4)
                .and_then(|h| h.weather_desc.first())
                .map_or("unsettled weather", |d| d.value.as_str());

            return Ok(format!(
                "Tomorrow in {city}, expect {} with a high of {} and a low of {} degrees Celsius.",
                description.to_lowercase(),
                day.max_temp_c,
                day.min_temp_c
            ));
        }

        let Some(current) = report.current_condition.first() else {
            return Ok(city_not_found(city));
        };
        let description = current
            .weather_desc
            .first()
            .map_or("unsettled weather", |d| d.value.as_str());

        let mut response = format!(
            "In {city}, it's currently {} degrees Celsius with {}.",
            current.temp_c,
            description.to_lowercase()
        );

        if current.feels_like_c != current.temp_c {
            response.push_str(&format!(" It feels like {} degrees.", current.feels_like_c));
        }
        if let Ok(humidity) = current.humidity.parse::<u8>() {
            if humidity > 70 {
                response.push_str(&format!(" Humidity is quite high at {humidity} percent."));
            }
        }

        Ok(response)
    }

    /// The city used when the user names none
    #[must_use]
    pub fn default_city(&self) -> &str {
        &self.default_city
    }
}

/// Spoken form of an OpenWeatherMap current-conditions report
#[allow(clippy::cast_possible_truncation)]
fn format_owm_current(report: &OwmCurrent) -> String {
    let temp = report.main.temp.round() as i64;
    let feels_like = report.main.feels_like.round() as i64;
    let temp_min = report.main.temp_min.round() as i64;
    let temp_max = report.main.temp_max.round() as i64;
    let description = report
        .weather
        .first()
        .map_or("unsettled weather", |c| c.description.as_str());
    let wind_kmh = (report.wind.speed * 3.6).round() as i64;

    let mut response = format!(
        "In {}, {}, it's currently {temp} degrees Celsius with {description}.",
        report.name, report.sys.country
    );

    if (temp - feels_like).abs() > 2 {
        response.push_str(&format!(" It feels like {feels_like} degrees."));
    }
    if temp_max != temp || temp_min != temp {
        response.push_str(&format!(
            " Today's high is {temp_max} and low is {temp_min} degrees."
        ));
    }
    if report.main.humidity > 70 {
        response.push_str(&format!(
            " Humidity is quite high at {} percent.",
            report.main.humidity
        ));
    } else if report.main.humidity < 30 {
        response.push_str(&format!(
            " It's quite dry with {} percent humidity.",
            report.main.humidity
        ));
    }
    if wind_kmh > 20 {
        response.push_str(&format!(
            " It's windy with speeds of {wind_kmh} kilometers per hour."
        ));
    }

    response
}

fn city_not_found(city: &str) -> String {
    format!(
        "Sorry, I couldn't get weather information for {city}. Please check the city name or try again later."
    )
}

#[async_trait]
impl SkillHandler for WeatherSkill {
    async fn handle(
        &self,
        _intent: &Intent,
        entities: &Entities,
        _raw_text: &str,
    ) -> Result<String> {
        let city = entities
            .city
            .clone()
            .unwrap_or_else(|| self.default_city.clone());

        if entities.forecast == Some(true) {
            self.forecast(&city).await
        } else {
            self.current(&city).await
        }
    }
}
