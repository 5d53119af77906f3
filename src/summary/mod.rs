//! CV summary generation.
//!
//! A [`SummaryGenerator`] turns a persona into a short professional
//! summary. The OpenAI-compatible client is the real backend; the
//! template backend produces the same deterministic text used when
//! generation fails.

mod cache;
#[cfg(test)]
pub mod mock;
mod openai;
mod prompts;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SummarySettings;
use crate::error::Result;
use crate::persona::PersonaRecord;

pub use cache::SummaryCache;
pub use openai::OpenAiSummaryGenerator;
pub use prompts::{fallback_summary, summary_prompt, Prompt, SYSTEM_MESSAGE};

/// Produces a summary for one persona.
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    async fn generate(&self, persona: &PersonaRecord) -> Result<String>;
}

/// Which backend writes summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryProvider {
    #[default]
    OpenAi,
    Template,
}

impl fmt::Display for SummaryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryProvider::OpenAi => f.write_str("openai"),
            SummaryProvider::Template => f.write_str("template"),
        }
    }
}

impl FromStr for SummaryProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(SummaryProvider::OpenAi),
            "template" => Ok(SummaryProvider::Template),
            other => Err(format!(
                "Unknown summary provider '{}'. Valid: openai, template",
                other
            )),
        }
    }
}

/// Offline backend: the per-language template text.
pub struct TemplateSummaryGenerator;

#[async_trait]
impl SummaryGenerator for TemplateSummaryGenerator {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn generate(&self, persona: &PersonaRecord) -> Result<String> {
        Ok(fallback_summary(persona))
    }
}

/// Build the configured backend.
pub fn build_generator(settings: &SummarySettings) -> Result<Arc<dyn SummaryGenerator>> {
    match settings.provider {
        SummaryProvider::OpenAi => Ok(Arc::new(OpenAiSummaryGenerator::new(settings.clone())?)),
        SummaryProvider::Template => Ok(Arc::new(TemplateSummaryGenerator)),
    }
}
