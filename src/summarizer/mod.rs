// file: src/summarizer/mod.rs
// description: article summarization through a text-completion service
// reference: internal module structure

pub mod openai;

pub use openai::OpenAiSummarizer;

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produces the digest for one article. Implementations do not retry;
    /// a quota rejection must surface as `PipelineError::RateLimited`.
    async fn summarize(&self, title: &str, abstract_text: &str) -> Result<String>;
}

/// The user message sent for one article.
pub fn build_prompt(prefix: &str, title: &str, abstract_text: &str) -> String {
    format!("{prefix}\n\ntitle: {title}\nabstract: {abstract_text}")
}
