//! Shared types used across all Parlor crates.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Session id used when the caller does not supply one.
pub const DEFAULT_USER_ID: &str = "anon";

/// Reply returned when neither a utility skill nor the brain produced an answer.
pub const FALLBACK_REPLY: &str = "Sorry, I don't know that yet.";

/// Predicate key the pipeline binds to the caller's session id on every request.
pub const USER_ID_PREDICATE: &str = "userid";

/// A plain-text answer; the only value that crosses the system boundary.
pub type Reply = String;

/// A fixed-format request recognized without consulting the brain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UtilityIntent {
    /// Current wall-clock time.
    Clock,
    /// Today's date.
    Calendar,
    /// Current weather for a (title-cased) city.
    Weather { city: String },
    /// Encyclopedia summary for a topic.
    Encyclopedia { topic: String },
}

/// Global application configuration. Load from a JSON/TOML file and env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Display name (gateway logs and `/status`).
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Rule-source directory (AIML files).
    pub aiml_dir: String,
    /// Compiled brain cache file.
    pub brain_path: String,
    /// OpenWeatherMap credential. Absent or empty disables weather lookups.
    #[serde(default)]
    pub openweather_api_key: Option<String>,
    /// Current-weather endpoint.
    pub weather_api_url: String,
    /// Base of the Wikipedia REST API (`/page/summary/{topic}` is appended).
    pub wiki_api_url: String,
    /// Per-request timeout for both lookup clients.
    pub lookup_timeout_secs: u64,
    /// If true, `parlor-gateway` serves `static_dir/index.html` at `/`.
    #[serde(default)]
    pub frontend_enabled: bool,
    /// Directory holding the static chat page.
    pub static_dir: String,
}

impl CoreConfig {
    /// The weather credential, if one is configured and non-blank.
    pub fn weather_api_key(&self) -> Option<&str> {
        self.openweather_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Load config from file and environment. Precedence: env `PARLOR_CONFIG` path > `config.json` > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("PARLOR_CONFIG").unwrap_or_else(|_| "config.json".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load config from `path` (skipped when missing), then `PARLOR__*` environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("app_name", "Parlor")?
            .set_default("port", 5000_i64)?
            .set_default("aiml_dir", "./aiml")?
            .set_default("brain_path", "./bot_brain.brn")?
            .set_default(
                "weather_api_url",
                "http://api.openweathermap.org/data/2.5/weather",
            )?
            .set_default("wiki_api_url", "https://en.wikipedia.org/api/rest_v1")?
            .set_default("lookup_timeout_secs", 10_i64)?
            .set_default("frontend_enabled", false)?
            .set_default("static_dir", "./static")?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("PARLOR").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = CoreConfig::load_from(Path::new("./does-not-exist.json")).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.lookup_timeout_secs, 10);
        assert_eq!(config.brain_path, "./bot_brain.brn");
        assert!(!config.frontend_enabled);
    }

    #[test]
    fn test_json_file_supplies_weather_key() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "openweather_api_key": "abc123", "port": 8080 }}"#).unwrap();
        let config = CoreConfig::load_from(file.path()).unwrap();
        assert_eq!(config.weather_api_key(), Some("abc123"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_blank_weather_key_is_absent() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "openweather_api_key": "   " }}"#).unwrap();
        let config = CoreConfig::load_from(file.path()).unwrap();
        assert_eq!(config.weather_api_key(), None);
    }

    #[test]
    fn test_frontend_flag_read_by_its_own_name() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "frontend_enabled": true, "static_dir": "./web" }}"#).unwrap();
        let config = CoreConfig::load_from(file.path()).unwrap();
        assert!(config.frontend_enabled);
        assert_eq!(config.static_dir, "./web");
    }
}
