use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AssistantConfigError, GenerationError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const INSTRUCTIONS: &str = "You are a disaster preparedness assistant for students in India. \
     Answer in at most four short sentences with practical safety steps. \
     If someone is in immediate danger, tell them to call 112.";

/// Free-text generator used for chat answers.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce an answer for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` on any failure; callers fall back to the
    /// keyword table.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteGeneratorConfig {
    pub base_url: Url,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl RemoteGeneratorConfig {
    /// Read `PREP_AI_*` variables. `Ok(None)` when no API key is set.
    ///
    /// # Errors
    ///
    /// Returns `AssistantConfigError` for an unparsable base URL or timeout.
    pub fn from_env() -> Result<Option<Self>, AssistantConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`RemoteGeneratorConfig::from_env`] with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns `AssistantConfigError` for an unparsable base URL or timeout.
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, AssistantConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(api_key) = lookup("PREP_AI_API_KEY").filter(|key| !key.trim().is_empty()) else {
            return Ok(None);
        };

        let raw_url = lookup("PREP_AI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let base_url = Url::parse(raw_url.trim())
            .map_err(|err| AssistantConfigError::InvalidBaseUrl(format!("{raw_url}: {err}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AssistantConfigError::InvalidBaseUrl(raw_url));
        }

        let model = lookup("PREP_AI_MODEL")
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.into());

        let timeout = match lookup("PREP_AI_TIMEOUT_SECS") {
            None => DEFAULT_TIMEOUT,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(AssistantConfigError::InvalidTimeout(raw)),
            },
        };

        Ok(Some(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            model,
            timeout,
        }))
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct RemoteGenerator {
    client: Client,
    config: RemoteGeneratorConfig,
}

impl RemoteGenerator {
    /// # Errors
    ///
    /// Returns `GenerationError::Http` if the HTTP client cannot be built.
    pub fn new(config: RemoteGeneratorConfig) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &RemoteGeneratorConfig {
        &self.config
    }
}

#[async_trait]
impl TextGenerator for RemoteGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let payload = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: INSTRUCTIONS,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Http(err)
                }
            })?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn missing_key_disables_remote() {
        assert_eq!(RemoteGeneratorConfig::from_lookup(lookup(&[])).unwrap(), None);
        let blank = lookup(&[("PREP_AI_API_KEY", "  ")]);
        assert_eq!(RemoteGeneratorConfig::from_lookup(blank).unwrap(), None);
    }

    #[test]
    fn defaults_apply() {
        let config = RemoteGeneratorConfig::from_lookup(lookup(&[("PREP_AI_API_KEY", "k")]))
            .unwrap()
            .unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(
            config.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_url = lookup(&[("PREP_AI_API_KEY", "k"), ("PREP_AI_BASE_URL", "not a url")]);
        assert!(matches!(
            RemoteGeneratorConfig::from_lookup(bad_url),
            Err(AssistantConfigError::InvalidBaseUrl(_))
        ));

        let ftp = lookup(&[("PREP_AI_API_KEY", "k"), ("PREP_AI_BASE_URL", "ftp://host")]);
        assert!(matches!(
            RemoteGeneratorConfig::from_lookup(ftp),
            Err(AssistantConfigError::InvalidBaseUrl(_))
        ));

        let zero = lookup(&[("PREP_AI_API_KEY", "k"), ("PREP_AI_TIMEOUT_SECS", "0")]);
        assert!(matches!(
            RemoteGeneratorConfig::from_lookup(zero),
            Err(AssistantConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn request_body_has_system_and_user_turns() {
        let payload = ChatRequest {
            model: "m",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: INSTRUCTIONS,
                },
                ChatMessage {
                    role: "user",
                    content: "flood?",
                },
            ],
            temperature: 0.2,
        };
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(body["model"], "m");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "flood?");

        let reply: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(reply.choices[0].message.content.is_none());
    }

    #[test]
    fn trailing_slash_is_normalised() {
        let config = RemoteGeneratorConfig::from_lookup(lookup(&[
            ("PREP_AI_API_KEY", "k"),
            ("PREP_AI_BASE_URL", "http://localhost:8080/v1/"),
            ("PREP_AI_MODEL", "local"),
            ("PREP_AI_TIMEOUT_SECS", "3"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(
            config.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(config.model, "local");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }
}
