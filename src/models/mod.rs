// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod article;
pub mod batch;

pub use article::{ArticleId, ArticleSummary, DigestEntry};
pub use batch::MessageBatch;
