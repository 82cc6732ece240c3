//! Deterministic offline provider used by default and in tests.

use crate::ai::{AiError, AiProvider, AiResult, ContentKind};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub struct MockAiProvider {
    provider_id: String,
    latency: Duration,
    fail: bool,
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl MockAiProvider {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            latency: Duration::ZERO,
            fail: false,
        }
    }

    /// Simulated round-trip delay before every answer.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// A provider that always errors; useful to exercise fallback.
    pub fn failing(provider_id: impl Into<String>) -> Self {
        Self {
            fail: true,
            ..Self::new(provider_id)
        }
    }

    async fn respond(&self) -> AiResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.fail {
            return Err(AiError::Provider {
                provider_id: self.provider_id.clone(),
                message: "simulated outage".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    async fn generate_code(&self, prompt: &str) -> AiResult<String> {
        self.respond().await?;
        let escaped = prompt.replace('"', "\\\"");
        Ok(format!(
            "# Generated code for: {prompt}\n\
             class GeneratedClass:\n    \
                 def __init__(self):\n        \
                     self.prompt = \"{escaped}\"\n\n    \
                 def execute(self):\n        \
                     return f\"Executing: {{self.prompt}}\"\n"
        ))
    }

    async fn generate_content(&self, prompt: &str, kind: &ContentKind) -> AiResult<Value> {
        self.respond().await?;
        let content = match kind {
            ContentKind::Table => json!([
                ["ID", "Name", "Status"],
                ["1", format!("Item from {prompt}"), "Active"],
                ["2", "Another item", "Pending"],
            ]),
            ContentKind::Note => Value::String(format!(
                "Generated note:\n\n{prompt}\n\nThis is a mock response."
            )),
            other => Value::String(format!("Generated {}: {prompt}", other.as_str())),
        };
        Ok(content)
    }
}
