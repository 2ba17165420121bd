//! Utility skills (clock, calendar, weather, wiki) and the default router.

pub use parlor_core::{IntentRouter, UtilitySkill};

mod clock;
mod lookup;
mod weather;
mod wiki;

pub use clock::{date_reply, time_reply, CalendarSkill, ClockSkill};
pub use lookup::{http_client, LookupError};
pub use weather::{weather_apology, WeatherClient, WeatherReport, WeatherSkill};
pub use wiki::{truncate_extract, wiki_apology, WikiClient, WikiSkill, EXTRACT_LIMIT};

use parlor_core::CoreConfig;
use std::sync::Arc;
use std::time::Duration;

/// Builds the router in its fixed precedence: Clock, Calendar, Weather, Wiki.
/// Weather is left out when no credential is configured.
pub fn default_router(config: &CoreConfig) -> Result<IntentRouter, LookupError> {
    let http = http_client(Duration::from_secs(config.lookup_timeout_secs))?;

    let mut router = IntentRouter::new();
    router.register(Arc::new(ClockSkill::new()));
    router.register(Arc::new(CalendarSkill::new()));
    match config.weather_api_key() {
        Some(key) => router.register(Arc::new(WeatherSkill::new(WeatherClient::new(
            http.clone(),
            config.weather_api_url.clone(),
            key,
        )))),
        None => tracing::info!(
            target: "parlor::skills",
            "No openweather_api_key configured; weather lookups disabled"
        ),
    }
    router.register(Arc::new(WikiSkill::new(WikiClient::new(
        http,
        config.wiki_api_url.clone(),
    ))));

    tracing::info!(target: "parlor::skills", routes = ?router.route_names(), "Utility router ready");
    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_core::UtilityIntent;

    fn config(key: Option<&str>) -> CoreConfig {
        CoreConfig {
            app_name: "Test".to_string(),
            port: 5000,
            aiml_dir: "./aiml".to_string(),
            brain_path: "./bot_brain.brn".to_string(),
            openweather_api_key: key.map(str::to_string),
            weather_api_url: "http://127.0.0.1:9/weather".to_string(),
            wiki_api_url: "http://127.0.0.1:9".to_string(),
            lookup_timeout_secs: 1,
            frontend_enabled: false,
            static_dir: "./static".to_string(),
        }
    }

    #[test]
    fn test_route_order_with_weather_key() {
        let router = default_router(&config(Some("k"))).unwrap();
        assert_eq!(router.route_names(), vec!["Clock", "Calendar", "Weather", "Wiki"]);
    }

    #[test]
    fn test_weather_gated_on_credential() {
        let router = default_router(&config(None)).unwrap();
        assert_eq!(router.route_names(), vec!["Clock", "Calendar", "Wiki"]);
        assert!(router.recognize("weather in Paris").is_none());

        let router = default_router(&config(Some(""))).unwrap();
        assert!(router.recognize("weather in Paris").is_none());
    }

    #[test]
    fn test_clock_beats_weather() {
        let router = default_router(&config(Some("k"))).unwrap();
        let (skill, intent) = router.recognize("time weather in paris").unwrap();
        assert_eq!(skill.name(), "Clock");
        assert_eq!(intent, UtilityIntent::Clock);
    }

    #[test]
    fn test_weather_recognized_with_key() {
        let router = default_router(&config(Some("k"))).unwrap();
        let (skill, intent) = router.recognize("Weather in paris").unwrap();
        assert_eq!(skill.name(), "Weather");
        assert_eq!(intent, UtilityIntent::Weather { city: "Paris".into() });
    }

    #[tokio::test]
    async fn test_clock_reply_end_to_end() {
        let router = default_router(&config(None)).unwrap();
        let reply = router.route("what time is it").await.unwrap();
        let shape = regex::Regex::new(r"^The time is \d\d:\d\d:\d\d\.$").unwrap();
        assert!(shape.is_match(&reply), "{reply}");
    }
}
