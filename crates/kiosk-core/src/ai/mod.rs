pub mod gemini;

pub use gemini::{build_contents, GeminiClient, PromptContents};

use async_trait::async_trait;

use crate::error::GenerateError;
use crate::media::MediaAttachment;

/// Anything that can turn a prompt and optional media into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        media: Option<&MediaAttachment>,
    ) -> Result<String, GenerateError>;
}
