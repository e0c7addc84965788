//! The text-generation seam.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GenerationError;

/// Opaque text generator (a chat-completion model in production).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`, producing at most `max_tokens` tokens.
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError>;
}

/// Generator used when no model credentials are configured; always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn complete(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

/// Call `generator` with a hard deadline.
///
/// A generator that hangs past `timeout` yields [`GenerationError::Timeout`].
pub(crate) async fn complete_within(
    generator: &dyn TextGenerator,
    timeout: Duration,
    prompt: &str,
    max_tokens: u32,
    temperature: f32,
) -> Result<String, GenerationError> {
    match tokio::time::timeout(timeout, generator.complete(prompt, max_tokens, temperature)).await
    {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout {
            millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
