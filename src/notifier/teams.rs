// file: src/notifier/teams.rs
// description: Microsoft Teams incoming webhook delivery as an Adaptive Card
// reference: https://learn.microsoft.com/microsoftteams/platform/webhooks-and-connectors/how-to/connectors-using

use crate::config::WebhookConfig;
use crate::error::{PipelineError, Result};
use crate::models::MessageBatch;
use crate::models::batch::NO_RESULTS_TEXT;
use crate::notifier::ChatNotifier;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

const CARD_HEADING: &str = "新着論文のお知らせ";

pub fn card_title(batch: &MessageBatch) -> String {
    format!(
        "{} ({}) - 検索対象日: {}",
        CARD_HEADING, batch.query, batch.search_date
    )
}

pub fn card_subtitle(batch: &MessageBatch) -> String {
    format!("{} - Message {}", CARD_HEADING, batch.message_count)
}

/// Webhook payload: a message with a single Adaptive Card attachment.
pub fn card_payload(batch: &MessageBatch) -> Value {
    let body = batch.body();
    let text = if body.trim().is_empty() {
        NO_RESULTS_TEXT.to_string()
    } else {
        body
    };

    json!({
        "type": "message",
        "attachments": [
            {
                "contentType": "application/vnd.microsoft.card.adaptive",
                "contentUrl": null,
                "content": {
                    "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
                    "type": "AdaptiveCard",
                    "version": "1.2",
                    "width": "full",
                    "body": [
                        {
                            "type": "TextBlock",
                            "text": card_title(batch),
                            "weight": "bolder",
                            "size": "medium",
                            "wrap": true
                        },
                        {
                            "type": "TextBlock",
                            "text": card_subtitle(batch),
                            "weight": "bolder",
                            "size": "medium",
                            "wrap": true
                        },
                        {
                            "type": "TextBlock",
                            "text": text,
                            "wrap": true
                        }
                    ]
                }
            }
        ]
    })
}

pub struct TeamsNotifier {
    client: Client,
    webhook_url: String,
}

impl TeamsNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let webhook_url = config
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::Config("webhook URL is not set (TEAMS_WEBHOOK_URL)".to_string())
            })?;

        Ok(Self {
            client: Client::new(),
            webhook_url,
        })
    }
}

#[async_trait]
impl ChatNotifier for TeamsNotifier {
    async fn post(&self, batch: &MessageBatch) -> Result<()> {
        debug!(
            "Posting message {} for query '{}'",
            batch.message_count, batch.query
        );

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&card_payload(batch))
            .send()
            .await
            .map_err(|e| PipelineError::Webhook(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Webhook(format!("HTTP {status} - {body}")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleId, DigestEntry};
    use pretty_assertions::assert_eq;

    fn batch(entries: Vec<DigestEntry>) -> MessageBatch {
        MessageBatch {
            query: "cancer AND immunotherapy".to_string(),
            search_date: "2024/03/14".to_string(),
            message_count: 2,
            entries,
        }
    }

    #[test]
    fn test_title_and_subtitle() {
        let batch = batch(vec![]);
        assert_eq!(
            card_title(&batch),
            "新着論文のお知らせ (cancer AND immunotherapy) - 検索対象日: 2024/03/14"
        );
        assert_eq!(card_subtitle(&batch), "新着論文のお知らせ - Message 2");
    }

    #[test]
    fn test_payload_structure() {
        let batch = batch(vec![DigestEntry::new(
            ArticleId::new("7"),
            "cancer AND immunotherapy",
            "- 要点",
        )]);
        let payload = card_payload(&batch);

        assert_eq!(payload["type"], "message");
        let attachment = &payload["attachments"][0];
        assert_eq!(
            attachment["contentType"],
            "application/vnd.microsoft.card.adaptive"
        );
        assert!(attachment["contentUrl"].is_null());

        let card = &attachment["content"];
        assert_eq!(card["type"], "AdaptiveCard");
        assert_eq!(card["version"], "1.2");
        assert_eq!(card["width"], "full");

        let blocks = card["body"].as_array().unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0]["weight"], "bolder");
        assert_eq!(blocks[1]["text"], "新着論文のお知らせ - Message 2");
        assert!(
            blocks[2]["text"]
                .as_str()
                .unwrap()
                .contains("https://pubmed.ncbi.nlm.nih.gov/7")
        );
        assert!(blocks[2].get("weight").is_none());
    }

    #[test]
    fn test_placeholder_payload_text() {
        let payload = card_payload(&batch(vec![]));
        let text = payload["attachments"][0]["content"]["body"][2]["text"]
            .as_str()
            .unwrap();
        assert!(text.contains("ありません"));
    }

    #[test]
    fn test_requires_webhook_url() {
        assert!(TeamsNotifier::new(&WebhookConfig::default()).is_err());

        let config = WebhookConfig {
            url: Some("https://example.webhook.office.com/webhookb2/abc".to_string()),
            ..WebhookConfig::default()
        };
        assert!(TeamsNotifier::new(&config).is_ok());
    }
}
