pub mod openai;
pub mod prompts;

use digest_core::CoreError;
use std::sync::Arc;

pub use openai::{ChatSettings, OpenAiProvider};
pub use prompts::{top_posts_prompt, trends_prompt};

/// A language model that turns one prompt into one completion.
pub trait LlmProvider {
    async fn complete(&self, prompt: &str) -> Result<String, CoreError>;

    fn name(&self) -> &str;
}

impl<T: LlmProvider> LlmProvider for Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String, CoreError> {
        (**self).complete(prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
