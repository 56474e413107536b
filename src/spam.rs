//! Spam filtering through an external classification service.
//!
//! One batched HTTPS call per retrieval cycle. The pipeline fails open:
//! if the service is unreachable, returns a bad status, or sends back
//! something unparsable, the batch is returned unfiltered.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SpamConfig;
use crate::mail::Message;

const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(15);

/// One classification decision, correlated back to a message by id.
#[derive(Debug, Clone, PartialEq)]
pub struct SpamVerdict {
    pub message_id: String,
    pub is_spam: bool,
    /// Service confidence in [0, 1].
    pub confidence: f64,
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classification request failed: {0}")]
    Request(#[from] ureq::Error),
    #[error("classification response malformed: {0}")]
    Malformed(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    model: &'a str,
    input: Vec<PromptEntry>,
    temperature: u8,
}

#[derive(Serialize)]
struct PromptEntry {
    role: &'static str,
    content: Vec<PromptContent>,
    metadata: PromptMetadata,
}

#[derive(Serialize)]
struct PromptContent {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

#[derive(Serialize)]
struct PromptMetadata {
    message_id: String,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    choices: Vec<ChoiceEntry>,
}

#[derive(Deserialize)]
struct ChoiceEntry {
    #[serde(default)]
    metadata: ChoiceMetadata,
    #[serde(default)]
    content: Vec<ChoiceContent>,
}

#[derive(Default, Deserialize)]
struct ChoiceMetadata {
    #[serde(default)]
    message_id: String,
}

#[derive(Deserialize)]
struct ChoiceContent {
    #[serde(default)]
    text: String,
}

/// The per-item result, embedded as a JSON string in the choice text.
#[derive(Deserialize)]
struct VerdictFragment {
    #[serde(default)]
    is_spam: bool,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

/// Batches messages, asks the configured service which are spam, and
/// applies the verdicts.
pub struct SpamFilter {
    config: SpamConfig,
}

impl SpamFilter {
    pub fn new(config: SpamConfig) -> Self {
        Self { config }
    }

    /// Return the non-spam subsequence of `messages`, order preserved.
    ///
    /// Pass-through when filtering is disabled, no credential is
    /// configured, or the batch is empty; also on any classification
    /// failure.
    pub fn filter(&self, messages: Vec<Message>) -> Vec<Message> {
        if !self.config.enabled || self.config.api_key.is_empty() || messages.is_empty() {
            return messages;
        }

        let verdicts = match self.classify(&messages) {
            Ok(verdicts) => verdicts,
            Err(err) => {
                warn!("spam classification failed; leaving batch unfiltered: {}", err);
                return messages;
            }
        };

        let blocked: HashSet<&str> = verdicts
            .iter()
            .filter(|v| v.is_spam && v.confidence >= self.config.threshold)
            .map(|v| v.message_id.as_str())
            .collect();
        if !blocked.is_empty() {
            debug!("hiding {} of {} messages as spam", blocked.len(), messages.len());
        }

        messages
            .into_iter()
            .filter(|message| !blocked.contains(message.id.as_str()))
            .collect()
    }

    /// One batched classification call. Entries the service returns
    /// without a message id or with an unparsable fragment are skipped;
    /// transport and decode failures abort the whole batch.
    pub fn classify(&self, messages: &[Message]) -> Result<Vec<SpamVerdict>, ClassifyError> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.build_request(messages);
        let response = ureq::post(&self.config.endpoint)
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
            .timeout(CLASSIFY_TIMEOUT)
            .send_json(request)?;
        let decoded: ClassifyResponse = response.into_json()?;

        let mut verdicts = Vec::new();
        for entry in decoded.choices {
            if entry.metadata.message_id.is_empty() {
                continue;
            }
            let text = match entry.content.first() {
                Some(content) => content.text.as_str(),
                None => continue,
            };
            let fragment: VerdictFragment = match serde_json::from_str(text) {
                Ok(fragment) => fragment,
                Err(_) => continue,
            };
            verdicts.push(SpamVerdict {
                message_id: entry.metadata.message_id,
                is_spam: fragment.is_spam,
                confidence: fragment.confidence,
            });
        }
        Ok(verdicts)
    }

    fn build_request<'a>(&'a self, messages: &[Message]) -> ClassifyRequest<'a> {
        let input = messages
            .iter()
            .map(|message| PromptEntry {
                role: "user",
                content: vec![PromptContent {
                    kind: "text",
                    text: format!(
                        "You are a security assistant. \
                         Classify the following email as spam or legitimate. \
                         Return JSON with keys 'is_spam' and 'confidence'.\n\n\
                         Subject: {}\nFrom: {}\nPreview: {}",
                        message.subject, message.sender, message.preview
                    ),
                }],
                metadata: PromptMetadata {
                    message_id: message.id.clone(),
                },
            })
            .collect();

        ClassifyRequest {
            model: &self.config.model,
            input,
            temperature: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(id: &str, subject: &str) -> Message {
        Message {
            id: id.to_string(),
            account_id: "me@example.com".to_string(),
            subject: subject.to_string(),
            sender: "Someone <someone@example.com>".to_string(),
            preview: "preview text".to_string(),
            date_received: Utc::now(),
            is_unread: true,
            is_flagged: false,
            folder: "INBOX".to_string(),
        }
    }

    #[test]
    fn test_request_shape() {
        let filter = SpamFilter::new(SpamConfig::default());
        let messages = vec![message("m-1", "Hello"), message("m-2", "Offer")];
        let request = filter.build_request(&messages);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["temperature"], 0);
        assert_eq!(value["input"].as_array().unwrap().len(), 2);
        assert_eq!(value["input"][0]["role"], "user");
        assert_eq!(value["input"][0]["content"][0]["type"], "text");
        assert_eq!(value["input"][0]["metadata"]["message_id"], "m-1");
        let text = value["input"][1]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Subject: Offer"));
        assert!(text.contains("From: Someone <someone@example.com>"));
    }

    #[test]
    fn test_verdict_fragment_defaults() {
        let fragment: VerdictFragment = serde_json::from_str("{}").unwrap();
        assert!(!fragment.is_spam);
        assert!((fragment.confidence - 0.5).abs() < f64::EPSILON);
    }
}
