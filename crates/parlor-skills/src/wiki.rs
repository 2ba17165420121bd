//! Wiki skill: Wikipedia REST summary for `wiki <topic>` / `wikipedia <topic>`.

use parlor_core::{Reply, UtilityIntent, UtilitySkill};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;

use crate::lookup::LookupError;

const SKILL_NAME: &str = "Wiki";

/// Maximum number of extract characters kept in a reply.
pub const EXTRACT_LIMIT: usize = 600;

/// Escapes everything except unreserved characters and `/`.
const TOPIC_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// First [`EXTRACT_LIMIT`] characters, with `...` only when something was cut.
pub fn truncate_extract(extract: &str) -> String {
    match extract.char_indices().nth(EXTRACT_LIMIT) {
        Some((cut, _)) => format!("{}...", &extract[..cut]),
        None => extract.to_string(),
    }
}

/// Apology text for a failed summary lookup.
pub fn wiki_apology(err: &LookupError, topic: &str) -> Reply {
    match err {
        LookupError::NotFound { .. } | LookupError::NoContent => {
            format!("I couldn't find a summary for \"{}\".", topic)
        }
        LookupError::Timeout | LookupError::Transport(_) | LookupError::Decode(_) => {
            "I couldn't reach Wikipedia right now.".to_string()
        }
    }
}

/// Thin client for `{base}/page/summary/{topic}`.
pub struct WikiClient {
    http: reqwest::Client,
    base_url: String,
}

impl WikiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn summary_url(&self, topic: &str) -> String {
        format!(
            "{}/page/summary/{}",
            self.base_url.trim_end_matches('/'),
            utf8_percent_encode(topic, TOPIC_ESCAPE)
        )
    }

    /// One request; returns the (possibly truncated) extract.
    pub async fn summary(&self, topic: &str) -> Result<String, LookupError> {
        let response = self.http.get(self.summary_url(topic)).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(LookupError::NotFound {
                status: status.as_u16().to_string(),
            });
        }
        let body: Value = response.json().await?;
        body.get("extract")
            .and_then(Value::as_str)
            .filter(|extract| !extract.is_empty())
            .map(truncate_extract)
            .ok_or(LookupError::NoContent)
    }
}

pub struct WikiSkill {
    client: WikiClient,
    pattern: Regex,
}

impl WikiSkill {
    pub fn new(client: WikiClient) -> Self {
        Self {
            client,
            pattern: Regex::new(r"^(wiki|wikipedia)\s+(.+)$").expect("Invalid wiki regex"),
        }
    }
}

#[async_trait::async_trait]
impl UtilitySkill for WikiSkill {
    fn name(&self) -> &str {
        SKILL_NAME
    }

    fn recognize(&self, normalized: &str) -> Option<UtilityIntent> {
        let topic = self.pattern.captures(normalized)?.get(2)?.as_str().trim();
        Some(UtilityIntent::Encyclopedia {
            topic: topic.to_string(),
        })
    }

    async fn answer(&self, intent: UtilityIntent) -> Reply {
        let topic = match intent {
            UtilityIntent::Encyclopedia { topic } => topic,
            other => {
                tracing::warn!(target: "parlor::skills", skill = SKILL_NAME, intent = ?other, "Unexpected intent");
                return "I couldn't reach Wikipedia right now.".to_string();
            }
        };
        match self.client.summary(&topic).await {
            Ok(extract) => extract,
            Err(e) => {
                tracing::warn!(target: "parlor::skills", skill = SKILL_NAME, topic = %topic, error = %e, "Summary lookup failed");
                wiki_apology(&e, &topic)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::http_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn skill(base: String) -> WikiSkill {
        let http = http_client(Duration::from_secs(2)).unwrap();
        WikiSkill::new(WikiClient::new(http, base))
    }

    async fn serve_extract(server: &MockServer, topic_path: &str, extract: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/page/summary/{}", topic_path)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Topic",
                "extract": extract
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_truncate_extract_boundary() {
        let exact = "a".repeat(EXTRACT_LIMIT);
        assert_eq!(truncate_extract(&exact), exact);

        let long = "b".repeat(EXTRACT_LIMIT + 1);
        let cut = truncate_extract(&long);
        assert_eq!(cut.chars().count(), EXTRACT_LIMIT + 3);
        assert!(cut.ends_with("b..."));
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let long = "é".repeat(700);
        let cut = truncate_extract(&long);
        assert_eq!(cut.chars().count(), 603);
    }

    #[test]
    fn test_recognize_wiki_prefixes() {
        let skill = skill("http://unused.invalid".into());
        assert_eq!(
            skill.recognize("wiki albert einstein"),
            Some(UtilityIntent::Encyclopedia { topic: "albert einstein".into() })
        );
        assert_eq!(
            skill.recognize("wikipedia   rust (programming language)"),
            Some(UtilityIntent::Encyclopedia { topic: "rust (programming language)".into() })
        );
        assert_eq!(skill.recognize("tell me about wiki rust"), None);
        assert_eq!(skill.recognize("wiki"), None);
    }

    #[test]
    fn test_summary_url_escapes_topic() {
        let client = WikiClient::new(reqwest::Client::new(), "https://example.org/api/");
        assert_eq!(
            client.summary_url("ac/dc & friends"),
            "https://example.org/api/page/summary/ac/dc%20%26%20friends"
        );
    }

    #[tokio::test]
    async fn test_long_extract_is_truncated() {
        let server = MockServer::start().await;
        let extract = "x".repeat(900);
        serve_extract(&server, "albert%20einstein", &extract).await;

        let reply = skill(server.uri())
            .answer(UtilityIntent::Encyclopedia { topic: "albert einstein".into() })
            .await;
        assert_eq!(reply, format!("{}...", "x".repeat(600)));
        assert_eq!(reply.chars().count(), 603);
    }

    #[tokio::test]
    async fn test_short_extract_is_returned_whole() {
        let server = MockServer::start().await;
        serve_extract(&server, "rust", "Rust is a language.").await;
        let reply = skill(server.uri())
            .answer(UtilityIntent::Encyclopedia { topic: "rust".into() })
            .await;
        assert_eq!(reply, "Rust is a language.");
    }

    #[tokio::test]
    async fn test_empty_extract_is_not_found() {
        let server = MockServer::start().await;
        serve_extract(&server, "nothing", "").await;
        let reply = skill(server.uri())
            .answer(UtilityIntent::Encyclopedia { topic: "nothing".into() })
            .await;
        assert_eq!(reply, "I couldn't find a summary for \"nothing\".");
    }

    #[tokio::test]
    async fn test_missing_page_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let reply = skill(server.uri())
            .answer(UtilityIntent::Encyclopedia { topic: "zzqx".into() })
            .await;
        assert_eq!(reply, "I couldn't find a summary for \"zzqx\".");
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let reply = skill("http://127.0.0.1:9".into())
            .answer(UtilityIntent::Encyclopedia { topic: "rust".into() })
            .await;
        assert_eq!(reply, "I couldn't reach Wikipedia right now.");
    }
}
