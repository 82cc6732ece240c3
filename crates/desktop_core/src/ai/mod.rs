//! AI content generation providers.
//!
//! # Responsibility
//! - Define the provider SPI used to generate item content.
//! - Offer a deterministic mock provider and an ordered fallback chain.
//!
//! # Invariants
//! - Providers hold no state shared with the persistence pipeline.
//! - A failing provider never stops the chain from trying the next one.

use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod chain;
pub mod mock;

pub use chain::ProviderChain;
pub use mock::MockAiProvider;

pub type AiResult<T> = Result<T, AiError>;

/// Kind of content requested from a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    Table,
    Note,
    Code,
    Other(String),
}

impl ContentKind {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" => Self::Table,
            "note" => Self::Note,
            "code" => Self::Code,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Table => "table",
            Self::Note => "note",
            Self::Code => "code",
            Self::Other(name) => name.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    /// One provider failed; the chain may still succeed with another.
    Provider { provider_id: String, message: String },
    /// Every provider of the chain failed.
    AllProvidersFailed { attempts: usize },
    NoProviders,
}

impl Display for AiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider {
                provider_id,
                message,
            } => write!(f, "provider `{provider_id}` failed: {message}"),
            Self::AllProvidersFailed { attempts } => {
                write!(f, "all {attempts} AI providers failed")
            }
            Self::NoProviders => write!(f, "no AI providers configured"),
        }
    }
}

impl Error for AiError {}

/// Text/data producer behind AI-generated items.
#[async_trait]
pub trait AiProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn generate_code(&self, prompt: &str) -> AiResult<String>;

    async fn generate_content(&self, prompt: &str, kind: &ContentKind) -> AiResult<Value>;
}
