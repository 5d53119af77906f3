//! Summaries from an OpenAI-compatible `/chat/completions` endpoint
//!
//! Works against api.openai.com as well as local servers speaking the same
//! protocol (Ollama, vLLM, LM Studio). Rate limits, 5xx answers, timeouts
//! and refused connections are retried with doubling delays.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cache::SummaryCache;
use super::prompts::{summary_prompt, Prompt};
use super::SummaryGenerator;
use crate::config::SummarySettings;
use crate::error::{Error, Result};
use crate::persona::PersonaRecord;

/// Hosts that refuse unauthenticated requests.
const HOSTS_REQUIRING_KEY: [&str; 1] = ["api.openai.com"];

/// Delay before the first retry; doubles after each further failure
const FIRST_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Reply,
}

#[derive(Deserialize)]
struct Reply {
    #[serde(default)]
    content: Option<String>,
}

impl Completion {
    /// Trimmed text of the first choice, if it has any
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

/// Outcome of one HTTP attempt that did not produce a summary
enum Failure {
    Transient(Error),
    Permanent(Error),
}

pub struct OpenAiSummaryGenerator {
    settings: SummarySettings,
    client: Client,
    cache: Option<SummaryCache>,
}

impl OpenAiSummaryGenerator {
    pub fn new(settings: SummarySettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Cannot build HTTP client: {}", e)))?;

        let cache = if settings.cache_enabled {
            Some(SummaryCache::new(&settings.cache_dir))
        } else {
            None
        };

        info!(
            base_url = %settings.base_url,
            model = %settings.model,
            cache = settings.cache_enabled,
            "Summary client ready"
        );

        Ok(Self {
            settings,
            client,
            cache,
        })
    }

    /// A key is mandatory for the hosted OpenAI API; local servers run without one.
    fn check_credentials(&self) -> Result<()> {
        if !self.settings.api_key.is_empty() {
            return Ok(());
        }
        let host = url::Url::parse(&self.settings.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        if HOSTS_REQUIRING_KEY.contains(&host.as_str()) {
            return Err(Error::SummaryGeneration(format!(
                "no API key configured for {} (set OPENAI_API_KEY)",
                host
            )));
        }
        Ok(())
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let body = CompletionBody {
            model: &self.settings.model,
            messages: [
                Message {
                    role: "system",
                    content: &prompt.system,
                },
                Message {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };
        let url = self.endpoint();

        let mut delay = FIRST_BACKOFF;
        let mut attempt = 0;
        loop {
            match self.send_once(&url, &body).await {
                Ok(text) => return Ok(text),
                Err(Failure::Permanent(e)) => return Err(e),
                Err(Failure::Transient(e)) if attempt >= self.settings.max_retries => return Err(e),
                Err(Failure::Transient(e)) => {
                    attempt += 1;
                    warn!(attempt, ?delay, error = %e, "Summary request failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    async fn send_once(&self, url: &str, body: &CompletionBody<'_>) -> std::result::Result<String, Failure> {
        let mut request = self.client.post(url).json(body);
        if !self.settings.api_key.is_empty() {
            request = request.bearer_auth(&self.settings.api_key);
        }

        let response = request.send().await.map_err(|e| {
            let error = Error::SummaryGeneration(format!("request to {} failed: {}", url, e));
            if e.is_timeout() || e.is_connect() {
                Failure::Transient(error)
            } else {
                Failure::Permanent(error)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let error = Error::SummaryGeneration(format!("{} answered {}: {}", url, status, detail));
            return Err(if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                Failure::Transient(error)
            } else {
                Failure::Permanent(error)
            });
        }

        let completion: Completion = response.json().await.map_err(|e| {
            Failure::Permanent(Error::SummaryGeneration(format!("unreadable completion: {}", e)))
        })?;
        debug!(url, "Completion received");
        completion
            .into_text()
            .ok_or_else(|| Failure::Permanent(Error::SummaryGeneration("completion had no text".to_string())))
    }
}

#[async_trait]
impl SummaryGenerator for OpenAiSummaryGenerator {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, persona: &PersonaRecord) -> Result<String> {
        let prompt = summary_prompt(persona);
        let key = SummaryCache::key(&self.settings.model, &prompt.system, &prompt.user);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key).await {
                return Ok(hit);
            }
        }

        self.check_credentials()?;
        let summary = self.complete(&prompt).await?;

        if let Some(cache) = &self.cache {
            cache.put(&key, &summary).await;
        }
        Ok(summary)
    }
}
