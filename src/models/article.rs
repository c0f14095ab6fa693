// file: src/models/article.rs
// description: article identifiers, esummary metadata and per-article digest entries
// reference: https://www.ncbi.nlm.nih.gov/books/NBK25499/

use serde::{Deserialize, Serialize};
use std::fmt;

pub const ARTICLE_URL_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov";
pub const DIGEST_HEADER: &str = "PubMed の新着論文のお知らせ";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn url(&self) -> String {
        format!("{}/{}", ARTICLE_URL_BASE, self.0)
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Subset of an esummary record the digest needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    #[serde(rename = "pubtype", default)]
    pub publication_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DigestEntry {
    pub article_id: ArticleId,
    pub query: String,
    pub text: String,
}

impl DigestEntry {
    pub fn new(article_id: ArticleId, query: &str, text: impl Into<String>) -> Self {
        Self {
            article_id,
            query: query.to_string(),
            text: text.into(),
        }
    }

    /// One message block: header naming the query, the digest, then the article link.
    pub fn render(&self) -> String {
        format!(
            "{} ({})\n\n{}\n\n{}\n\n\n",
            DIGEST_HEADER,
            self.query,
            self.text,
            self.article_id.url()
        )
    }
}
