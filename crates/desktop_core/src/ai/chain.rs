//! Ordered provider fallback.

use crate::ai::{AiError, AiProvider, AiResult, ContentKind};
use log::{info, warn};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Attempt<'a, T> = Pin<Box<dyn Future<Output = AiResult<T>> + Send + 'a>>;

/// Tries providers in registration order until one succeeds.
///
/// The index of the last successful provider is remembered and logged when
/// it changes, but every call still starts from the first provider.
pub struct ProviderChain {
    providers: Vec<Arc<dyn AiProvider>>,
    current: AtomicUsize,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn AiProvider>>) -> Self {
        info!(
            "event=ai_chain_init module=ai status=ok providers={}",
            providers.len()
        );
        Self {
            providers,
            current: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn provider_ids(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|provider| provider.provider_id().to_string())
            .collect()
    }

    /// Index of the provider that answered last.
    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub async fn generate_code(&self, prompt: &str) -> AiResult<String> {
        self.try_each("code", |provider| provider.generate_code(prompt))
            .await
    }

    pub async fn generate_content(&self, prompt: &str, kind: &ContentKind) -> AiResult<Value> {
        self.try_each("content", |provider| provider.generate_content(prompt, kind))
            .await
    }

    async fn try_each<'a, T, F>(&'a self, operation: &str, call: F) -> AiResult<T>
    where
        F: Fn(&'a dyn AiProvider) -> Attempt<'a, T>,
    {
        if self.providers.is_empty() {
            return Err(AiError::NoProviders);
        }

        for (index, provider) in self.providers.iter().enumerate() {
            match call(provider.as_ref()).await {
                Ok(value) => {
                    let previous = self.current.swap(index, Ordering::Relaxed);
                    if previous != index {
                        info!(
                            "event=ai_provider_switch module=ai status=ok operation={} provider={} index={}",
                            operation,
                            provider.provider_id(),
                            index
                        );
                    }
                    return Ok(value);
                }
                Err(err) => warn!(
                    "event=ai_generate module=ai status=error operation={} provider={} index={} error={}",
                    operation,
                    provider.provider_id(),
                    index,
                    err
                ),
            }
        }

        Err(AiError::AllProvidersFailed {
            attempts: self.providers.len(),
        })
    }
}
