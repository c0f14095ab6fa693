// file: src/config.rs
// description: application configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::pubmed::filter::DEFAULT_PUBLICATION_TYPES;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PROMPT: &str = "あなたは高度に教育と訓練をした研究者です。以下の論文を、タイトルと要約の2点をそれぞれ改行で分けて日本語で説明してください。要点は必ず箇条書き形式で書いてください。";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pubmed: PubmedConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PubmedConfig {
    pub base_url: String,
    pub retmax: usize,
    pub lookback_days: i64,
    pub api_key: Option<String>,
    pub tool: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleFailurePolicy {
    /// Any per-article failure aborts the pass and the whole query is retried.
    RestartQuery,
    /// Non rate-limit failures skip the article; rate limits still abort the pass.
    SkipArticle,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub queries: Vec<String>,
    pub publication_types: Vec<String>,
    pub max_articles_per_message: usize,
    pub max_attempts: u32,
    pub rate_limit_delay_secs: u64,
    pub error_delay_secs: u64,
    pub article_failure_policy: ArticleFailurePolicy,
}

impl Default for PubmedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            retmax: 1000,
            lookback_days: 1,
            api_key: None,
            tool: None,
            email: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_attempts: 3,
            retry_delay_secs: 10,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queries: Vec::new(),
            publication_types: DEFAULT_PUBLICATION_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            max_articles_per_message: 6,
            max_attempts: 3,
            rate_limit_delay_secs: 300,
            error_delay_secs: 60,
            article_failure_policy: ArticleFailurePolicy::RestartQuery,
        }
    }
}

impl WebhookConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl PipelineConfig {
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_secs(self.rate_limit_delay_secs)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_secs(self.error_delay_secs)
    }
}

/// Values read from the unprefixed environment variables the tool has always
/// accepted. They take precedence over the file and prefixed variables.
#[derive(Debug, Clone, Default)]
pub struct LegacyEnv {
    pub openai_api_key: Option<String>,
    pub teams_webhook_url: Option<String>,
    pub pubmed_queries: Option<String>,
}

impl LegacyEnv {
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: read("OPENAI_API_KEY"),
            teams_webhook_url: read("TEAMS_WEBHOOK_URL"),
            pubmed_queries: read("PUBMED_QUERIES"),
        }
    }
}

/// Splits a comma-separated query list, trimming whitespace and dropping empties.
pub fn split_queries(raw: &str) -> Vec<String> {
    normalize_queries(raw.split(','))
}

/// Trims every query and drops the blank ones, keeping order.
pub fn normalize_queries<I, S>(queries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    queries
        .into_iter()
        .filter_map(|q| {
            let q = q.as_ref().trim();
            (!q.is_empty()).then(|| q.to_string())
        })
        .collect()
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();
        Self::load_with(path, &LegacyEnv::from_env())
    }

    pub fn load_with(path: Option<&Path>, legacy: &LegacyEnv) -> Result<Self> {
        let mut builder = config::Config::builder();

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder
                .add_source(config::File::from(Path::new("config/default.toml")).required(false)),
        };

        builder = builder.add_source(
            config::Environment::with_prefix("PUBMED_DIGEST")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("pipeline.queries")
                .with_list_parse_key("pipeline.publication_types")
                .try_parsing(true),
        );

        builder = builder
            .set_override_option("llm.api_key", legacy.openai_api_key.clone())
            .and_then(|b| b.set_override_option("webhook.url", legacy.teams_webhook_url.clone()))
            .and_then(|b| {
                b.set_override_option(
                    "pipeline.queries",
                    legacy.pubmed_queries.as_deref().map(split_queries),
                )
            })
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.pipeline.queries = normalize_queries(&config.pipeline.queries);

        config.validate()?;
        Ok(config)
    }

    /// Only `run` needs queries, and it may take them from the command line.
    pub fn require_queries(&self) -> Result<()> {
        if self.pipeline.queries.is_empty() {
            return Err(PipelineError::Config(
                "at least one query must be configured (PUBMED_QUERIES)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_articles_per_message == 0 {
            return Err(PipelineError::Config(
                "max_articles_per_message must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.max_attempts == 0 {
            return Err(PipelineError::Config(
                "pipeline.max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.webhook.max_attempts == 0 {
            return Err(PipelineError::Config(
                "webhook.max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.pubmed.lookback_days < 0 {
            return Err(PipelineError::Config(
                "pubmed.lookback_days must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}
