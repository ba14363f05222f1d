use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("provider returned status={status} body={body}")]
    Status { status: u16, body: String },
    #[error("could not decode provider response: {0}")]
    Decode(String),
}

/// The two upstream operations the orchestrator depends on.
///
/// The real implementation is [`crate::openai::OpenAiClient`]; tests swap in stubs.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Stage 1: send the instruction and image to the vision model and return the
    /// raw text of its first choice, or `"{}"` when it produced no content.
    async fn analyze(&self, instruction: &str, image_url: &str) -> Result<String, ProviderError>;

    /// Stage 2: request one image for `prompt`. `Ok(None)` means the provider
    /// answered but sent no inline image data.
    async fn generate_image(&self, prompt: &str) -> Result<Option<String>, ProviderError>;
}
