//! Weather skill: OpenWeatherMap current conditions for `weather in <city>`.
//!
//! Only registered when a credential is configured; without one the input falls
//! through to the brain.

use parlor_core::{Reply, UtilityIntent, UtilitySkill};
use regex::Regex;
use serde_json::{Number, Value};

use crate::lookup::LookupError;

const SKILL_NAME: &str = "Weather";

/// Current conditions as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub description: String,
    pub temp: Number,
    pub feels_like: Option<Number>,
}

impl WeatherReport {
    pub fn reply(&self) -> Reply {
        match &self.feels_like {
            Some(feels) => format!(
                "Weather in {}: {}, {}°C (feels like {}°C).",
                self.city, self.description, self.temp, feels
            ),
            None => format!("Weather in {}: {}, {}°C.", self.city, self.description, self.temp),
        }
    }
}

/// Apology text for a failed weather lookup.
pub fn weather_apology(err: &LookupError, city: &str) -> Reply {
    match err {
        LookupError::NotFound { .. } | LookupError::NoContent => {
            format!("Sorry, I couldn't find weather for {}.", city)
        }
        LookupError::Timeout | LookupError::Transport(_) | LookupError::Decode(_) => {
            "I couldn't fetch the weather right now.".to_string()
        }
    }
}

/// Thin client for the current-weather endpoint (metric units).
pub struct WeatherClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// One request; success is decided by the body's `cod` field, not the HTTP status.
    pub async fn current(&self, city: &str) -> Result<WeatherReport, LookupError> {
        let body: Value = self
            .http
            .get(&self.endpoint)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await?
            .json()
            .await?;

        let cod = body.get("cod").cloned().unwrap_or(Value::Null);
        if !is_success_code(&cod) {
            return Err(LookupError::NotFound {
                status: cod.to_string(),
            });
        }

        let temp = body
            .pointer("/main/temp")
            .and_then(as_number)
            .ok_or_else(|| LookupError::Decode("missing main.temp".into()))?;
        let description = body
            .pointer("/weather/0/description")
            .and_then(Value::as_str)
            .ok_or_else(|| LookupError::Decode("missing weather[0].description".into()))?;
        let feels_like = body.pointer("/main/feels_like").and_then(as_number);

        Ok(WeatherReport {
            city: city.to_string(),
            description: description.to_string(),
            temp,
            feels_like,
        })
    }
}

fn as_number(v: &Value) -> Option<Number> {
    match v {
        Value::Number(n) => Some(n.clone()),
        _ => None,
    }
}

/// `cod` arrives as a number on success and often as a string on errors.
fn is_success_code(cod: &Value) -> bool {
    match cod {
        Value::Number(n) => n.as_i64() == Some(200),
        Value::String(s) => s.trim() == "200",
        _ => false,
    }
}

/// Like Python's `str.title()`: upper-case the first letter of each letter run.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

pub struct WeatherSkill {
    client: WeatherClient,
    pattern: Regex,
}

impl WeatherSkill {
    pub fn new(client: WeatherClient) -> Self {
        Self {
            client,
            pattern: Regex::new(r"weather\s+in\s+([a-zA-Z\s\-\.]+)$").expect("Invalid weather regex"),
        }
    }
}

#[async_trait::async_trait]
impl UtilitySkill for WeatherSkill {
    fn name(&self) -> &str {
        SKILL_NAME
    }

    fn recognize(&self, normalized: &str) -> Option<UtilityIntent> {
        let city = self.pattern.captures(normalized)?.get(1)?.as_str().trim();
        if city.is_empty() {
            return None;
        }
        Some(UtilityIntent::Weather {
            city: title_case(city),
        })
    }

    async fn answer(&self, intent: UtilityIntent) -> Reply {
        let city = match intent {
            UtilityIntent::Weather { city } => city,
            other => {
                tracing::warn!(target: "parlor::skills", skill = SKILL_NAME, intent = ?other, "Unexpected intent");
                return "I couldn't fetch the weather right now.".to_string();
            }
        };
        match self.client.current(&city).await {
            Ok(report) => report.reply(),
            Err(e) => {
                tracing::warn!(target: "parlor::skills", skill = SKILL_NAME, city = %city, error = %e, "Weather lookup failed");
                weather_apology(&e, &city)
            }
        }
    }
}
