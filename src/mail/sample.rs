//! Bundled sample messages for accounts running without a real mailbox.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::config::AccountConfig;

use super::types::Message;

const SAMPLE_MESSAGES: &str = include_str!("sample_messages.json");

#[derive(Debug, Deserialize)]
struct SampleEntry {
    id: u32,
    subject: String,
    sender: String,
    preview: String,
    date_received: DateTime<Utc>,
    #[serde(default = "default_unread")]
    is_unread: bool,
    #[serde(default)]
    is_flagged: bool,
    #[serde(default = "default_folder")]
    folder: String,
}

fn default_unread() -> bool {
    true
}

fn default_folder() -> String {
    "INBOX".to_string()
}

/// Decode the embedded fixture into messages owned by `account`.
///
/// Ids are scoped by the account address like real fetches, so sample
/// messages can never collide with another account's.
pub(crate) fn load_messages(account: &AccountConfig) -> Vec<Message> {
    let entries: Vec<SampleEntry> = match serde_json::from_str(SAMPLE_MESSAGES) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("bundled sample messages failed to decode: {}", err);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .map(|entry| Message {
            id: format!("{}:sample-{}", account.address, entry.id),
            account_id: account.address.clone(),
            subject: entry.subject,
            sender: entry.sender,
            preview: entry.preview,
            date_received: entry.date_received,
            is_unread: entry.is_unread,
            is_flagged: entry.is_flagged,
            folder: entry.folder,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_account() -> AccountConfig {
        AccountConfig {
            name: "Demo Mail".into(),
            address: "grandma@example.com".into(),
            host: "sample.local".into(),
            protocol: "demo".into(),
            port: 993,
            username: String::new(),
            password: String::new(),
            starttls: false,
        }
    }

    #[test]
    fn test_fixture_decodes() {
        let messages = load_messages(&demo_account());
        assert!(!messages.is_empty());
        for msg in &messages {
            assert!(msg.id.starts_with("grandma@example.com:sample-"));
            assert_eq!(msg.account_id, "grandma@example.com");
            assert_eq!(msg.folder, "INBOX");
        }
    }

    #[test]
    fn test_fixture_previews_are_bounded() {
        for msg in load_messages(&demo_account()) {
            assert!(msg.preview.chars().count() <= super::super::imap::PREVIEW_MAX_CHARS);
            assert!(!msg.preview.contains('\n'));
        }
    }
}
