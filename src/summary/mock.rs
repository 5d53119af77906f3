//! Mock summary backend for tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::SummaryGenerator;
use crate::error::{Error, Result};
use crate::persona::PersonaRecord;

/// Configuration for mock backend behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Simulated latency per call
    pub latency: Duration,
    /// Fail every call
    pub fail: bool,
    /// Panic inside every call
    pub panic: bool,
    /// Fixed response text; defaults to the persona's full name
    pub fixed_response: Option<String>,
}

pub struct MockSummaryGenerator {
    config: MockConfig,
    calls: AtomicU32,
}

impl MockSummaryGenerator {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::new(MockConfig {
            fail: true,
            ..MockConfig::default()
        })
    }

    pub fn panicking() -> Self {
        Self::new(MockConfig {
            panic: true,
            ..MockConfig::default()
        })
    }

    pub fn slow(latency: Duration) -> Self {
        Self::new(MockConfig {
            latency,
            ..MockConfig::default()
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryGenerator for MockSummaryGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, persona: &PersonaRecord) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
        if self.config.panic {
            panic!("mock backend panicked for {}", persona.id());
        }
        if self.config.fail {
            return Err(Error::SummaryGeneration("mock failure".to_string()));
        }
        Ok(self
            .config
            .fixed_response
            .clone()
            .unwrap_or_else(|| format!("Summary for {}", persona.full_name())))
    }
}
