// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod models;
pub mod notifier;
pub mod pipeline;
pub mod pubmed;
pub mod summarizer;
pub mod utils;

pub use config::{ArticleFailurePolicy, Config, LlmConfig, PipelineConfig, PubmedConfig, WebhookConfig};
pub use error::{PipelineError, Result};
pub use models::{ArticleId, ArticleSummary, DigestEntry, MessageBatch};
pub use notifier::{ChatNotifier, ConsoleNotifier, DeliveryPolicy, TeamsNotifier, deliver_with_retry};
pub use pipeline::{
    DigestOrchestrator, MessageBatcher, ProgressTracker, QueryOutcome, QueryStats, RetryPolicy,
    RetryState, RunReport,
};
pub use pubmed::{LiteratureSource, PubMedClient, PublicationTypeFilter, SearchWindow};
pub use summarizer::{OpenAiSummarizer, Summarizer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _config = Config::default();
        let _filter = PublicationTypeFilter::default();
    }
}
