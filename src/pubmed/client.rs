// file: src/pubmed/client.rs
// description: E-utilities client for esearch, esummary and efetch
// reference: https://www.ncbi.nlm.nih.gov/books/NBK25499/

use crate::config::PubmedConfig;
use crate::error::{PipelineError, Result};
use crate::models::{ArticleId, ArticleSummary};
use crate::pubmed::abstract_text::extract_abstract;
use crate::pubmed::window::SearchWindow;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

const DATABASE: &str = "pubmed";
const USER_AGENT: &str = concat!("pubmed-digest/", env!("CARGO_PKG_VERSION"));

/// The three lookups the digest pipeline performs against the literature database.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Ids published on the window's date, in the order returned by the search.
    async fn search_ids(&self, query: &str, window: &SearchWindow) -> Result<Vec<ArticleId>>;

    async fn fetch_summary(&self, id: &ArticleId) -> Result<ArticleSummary>;

    /// Abstract text, or an empty string when the article has none.
    async fn fetch_abstract(&self, id: &ArticleId) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

pub struct PubMedClient {
    client: Client,
    config: PubmedConfig,
}

impl PubMedClient {
    pub fn new(config: PubmedConfig) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), name)
    }

    fn base_params(&self, retmode: &'static str) -> Vec<(&'static str, String)> {
        let mut params = vec![("db", DATABASE.to_string()), ("retmode", retmode.to_string())];
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.clone()));
        }
        if let Some(tool) = &self.config.tool {
            params.push(("tool", tool.clone()));
        }
        if let Some(email) = &self.config.email {
            params.push(("email", email.clone()));
        }
        params
    }

    async fn get_text(
        &self,
        service: &'static str,
        params: &[(&'static str, String)],
    ) -> Result<String> {
        let response = self
            .client
            .get(self.endpoint(service))
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PipelineError::Api {
                service,
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    #[instrument(skip(self, window), fields(date = %window.formatted()))]
    async fn search_ids(&self, query: &str, window: &SearchWindow) -> Result<Vec<ArticleId>> {
        let mut params = self.base_params("json");
        params.push(("sort", "pub_date".to_string()));
        params.push(("term", query.to_string()));
        params.push(("mindate", window.mindate()));
        params.push(("maxdate", window.maxdate()));
        params.push(("retmax", self.config.retmax.to_string()));
        params.push(("retstart", "0".to_string()));

        let body = self.get_text("esearch.fcgi", &params).await?;
        let ids = parse_search_response(&body)?;

        debug!(count = ids.len(), "esearch returned ids");
        Ok(ids)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn fetch_summary(&self, id: &ArticleId) -> Result<ArticleSummary> {
        let mut params = self.base_params("json");
        params.push(("id", id.to_string()));

        let body = self.get_text("esummary.fcgi", &params).await?;
        parse_summary_response(&body, id)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn fetch_abstract(&self, id: &ArticleId) -> Result<String> {
        let mut params = self.base_params("xml");
        params.push(("id", id.to_string()));

        let body = self.get_text("efetch.fcgi", &params).await?;
        extract_abstract(&body)
    }
}

pub fn parse_search_response(body: &str) -> Result<Vec<ArticleId>> {
    let response: ESearchResponse = serde_json::from_str(body)?;
    Ok(response
        .esearchresult
        .idlist
        .into_iter()
        .map(ArticleId::new)
        .collect())
}

/// Picks `result.<id>` out of an esummary document.
pub fn parse_summary_response(body: &str, id: &ArticleId) -> Result<ArticleSummary> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    let record = value
        .get("result")
        .and_then(|result| result.get(id.as_str()))
        .ok_or_else(|| PipelineError::Parse(format!("esummary has no record for id {id}")))?;

    if let Some(error) = record.get("error").and_then(|e| e.as_str()) {
        return Err(PipelineError::Parse(format!(
            "esummary error for id {id}: {error}"
        )));
    }

    Ok(serde_json::from_value(record.clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_search_response() {
        let body = r#"{
            "header": {"type": "esearch", "version": "0.3"},
            "esearchresult": {
                "count": "3", "retmax": "3", "retstart": "0",
                "idlist": ["38012347", "38012346", "38012345"],
                "querytranslation": "cancer AND immunotherapy"
            }
        }"#;
        let ids = parse_search_response(body).unwrap();
        assert_eq!(
            ids,
            vec![
                ArticleId::new("38012347"),
                ArticleId::new("38012346"),
                ArticleId::new("38012345"),
            ]
        );
    }

    #[test]
    fn test_parse_search_response_without_results() {
        let body = r#"{"esearchresult": {"count": "0", "idlist": []}}"#;
        assert!(parse_search_response(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_search_response_wrong_shape() {
        let err = parse_search_response(r#"{"error": "API rate limit exceeded"}"#).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn test_parse_summary_response() {
        let body = r#"{
            "header": {"type": "esummary"},
            "result": {
                "uids": ["38012345"],
                "38012345": {
                    "uid": "38012345",
                    "title": "PD-1 blockade in advanced melanoma.",
                    "pubtype": ["Journal Article", "Randomized Controlled Trial"],
                    "source": "N Engl J Med"
                }
            }
        }"#;
        let summary = parse_summary_response(body, &ArticleId::new("38012345")).unwrap();
        assert_eq!(summary.title, "PD-1 blockade in advanced melanoma.");
        assert_eq!(
            summary.publication_types,
            vec!["Journal Article", "Randomized Controlled Trial"]
        );
    }

    #[test]
    fn test_parse_summary_missing_id() {
        let body = r#"{"result": {"uids": []}}"#;
        let err = parse_summary_response(body, &ArticleId::new("1")).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn test_parse_summary_record_error() {
        let body = r#"{"result": {"uids": ["9"], "9": {"uid": "9", "error": "cannot get document summary"}}}"#;
        assert!(parse_summary_response(body, &ArticleId::new("9")).is_err());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = PubmedConfig {
            base_url: "http://localhost:9000/eutils/".to_string(),
            ..PubmedConfig::default()
        };
        let client = PubMedClient::new(config).unwrap();
        assert_eq!(client.endpoint("esearch.fcgi"), "http://localhost:9000/eutils/esearch.fcgi");
    }

    #[test]
    fn test_base_params_include_optional_credentials() {
        let config = PubmedConfig {
            api_key: Some("ncbi-key".to_string()),
            email: Some("ops@example.org".to_string()),
            ..PubmedConfig::default()
        };
        let client = PubMedClient::new(config).unwrap();
        let params = client.base_params("json");
        assert!(params.contains(&("db", "pubmed".to_string())));
        assert!(params.contains(&("api_key", "ncbi-key".to_string())));
        assert!(params.contains(&("email", "ops@example.org".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "tool"));
    }
}
