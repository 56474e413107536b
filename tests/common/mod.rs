//! Shared test fixtures and helpers.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use mailfeed::{AccountConfig, AppConfig, Message, SpamConfig};

/// The synthetic demo account used by sample-backed clients.
pub fn demo_account() -> AccountConfig {
    AccountConfig {
        name: "Demo Mail".to_string(),
        address: "grandma@example.com".to_string(),
        host: "sample.local".to_string(),
        protocol: "demo".to_string(),
        port: 993,
        username: String::new(),
        password: String::new(),
        starttls: false,
    }
}

/// An account with a protocol no transport implements.
pub fn unsupported_account() -> AccountConfig {
    AccountConfig {
        name: "Legacy".to_string(),
        address: "legacy@example.com".to_string(),
        host: "pop.example.com".to_string(),
        protocol: "pop3".to_string(),
        port: 995,
        username: String::new(),
        password: String::new(),
        starttls: false,
    }
}

/// A message owned by `address`, received at `date` (RFC 3339).
pub fn message(id: &str, address: &str, date: &str) -> Message {
    Message {
        id: id.to_string(),
        account_id: address.to_string(),
        subject: format!("Subject for {id}"),
        sender: "Alice <alice@example.com>".to_string(),
        preview: "A short preview.".to_string(),
        date_received: date
            .parse::<DateTime<Utc>>()
            .expect("test date must be RFC 3339"),
        is_unread: true,
        is_flagged: false,
        folder: "INBOX".to_string(),
    }
}

/// Spam settings pointing at a mock server endpoint.
pub fn spam_config(endpoint: &str) -> SpamConfig {
    SpamConfig {
        api_key: "test-key".to_string(),
        endpoint: endpoint.to_string(),
        ..SpamConfig::default()
    }
}

/// App config with no accounts and filtering off.
pub fn empty_config() -> AppConfig {
    AppConfig {
        spam: SpamConfig {
            enabled: false,
            ..SpamConfig::default()
        },
        ..AppConfig::default()
    }
}

/// App config with `count` demo accounts and filtering off.
pub fn demo_config(count: usize) -> AppConfig {
    let accounts = (0..count)
        .map(|n| AccountConfig {
            name: format!("Demo {n}"),
            address: format!("demo{n}@example.com"),
            host: "sample.local".to_string(),
            protocol: "demo".to_string(),
            port: 993,
            username: String::new(),
            password: String::new(),
            starttls: false,
        })
        .collect();
    AppConfig {
        accounts,
        spam: SpamConfig {
            enabled: false,
            ..SpamConfig::default()
        },
        ..AppConfig::default()
    }
}
