use async_trait::async_trait;

use crate::Result;

/// Seam for the language model service. The pipeline only needs single-shot
/// completions.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    /// Run one completion and return the raw text.
    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String>;
}
