// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod batcher;
mod orchestrator;
mod progress;

pub use batcher::MessageBatcher;
pub use orchestrator::{DigestOrchestrator, QueryOutcome, RetryPolicy, RetryState, RunReport};
pub use progress::{ProgressTracker, QueryStats};
