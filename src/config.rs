//! Configuration value types consumed by the controller.
//!
//! The embedding application discovers and parses its own config files and
//! hands over a fully resolved [`AppConfig`]; nothing here touches disk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Connection parameters for one mailbox. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Display name shown in the account switcher.
    pub name: String,
    /// Mailbox address; also the account identity messages are scoped by.
    pub address: String,
    /// Incoming mail server host.
    pub host: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_imap_port")]
    pub port: u16,
    /// Login name. Falls back to `address` when empty.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Upgrade a plain connection with STARTTLS instead of implicit TLS.
    #[serde(default)]
    pub starttls: bool,
}

fn default_protocol() -> String {
    "imap".to_string()
}

fn default_imap_port() -> u16 {
    993
}

impl AccountConfig {
    /// Login name for authentication, falling back to the address.
    pub fn login(&self) -> &str {
        if self.username.is_empty() {
            &self.address
        } else {
            &self.username
        }
    }
}

/// Spam filtering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpamConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Bearer credential for the classification service. Filtering is a
    /// pass-through when unset.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Classification endpoint. Overridable so tests can point at a local
    /// server.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Minimum confidence a spam verdict needs before a message is hidden.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_provider() -> String {
    "chatgpt".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/responses".to_string()
}

fn default_threshold() -> f64 {
    0.6
}

fn default_enabled() -> bool {
    true
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: default_model(),
            endpoint: default_endpoint(),
            threshold: default_threshold(),
            enabled: true,
        }
    }
}

/// Root configuration object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub spam: SpamConfig,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_cache_dir() -> PathBuf {
    match directories::ProjectDirs::from("", "", "mailfeed") {
        Some(dirs) => dirs.cache_dir().to_path_buf(),
        None => PathBuf::from(".mailfeed"),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            accounts: vec![],
            spam: SpamConfig::default(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl AppConfig {
    /// Whether at least one account is configured. Used to decide whether
    /// to fall back to the bundled sample data.
    pub fn has_accounts(&self) -> bool {
        !self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_defaults() {
        let acct: AccountConfig = serde_json::from_str(
            r#"{"name": "Personal", "address": "me@example.com", "host": "imap.example.com"}"#,
        )
        .unwrap();
        assert_eq!(acct.protocol, "imap");
        assert_eq!(acct.port, 993);
        assert!(!acct.starttls);
        assert_eq!(acct.login(), "me@example.com");
    }

    #[test]
    fn test_account_explicit_username_wins() {
        let acct: AccountConfig = serde_json::from_str(
            r#"{"name": "Work", "address": "me@work.com", "host": "mail.work.com", "username": "corp\\me"}"#,
        )
        .unwrap();
        assert_eq!(acct.login(), "corp\\me");
    }

    #[test]
    fn test_spam_defaults() {
        let spam = SpamConfig::default();
        assert!(spam.enabled);
        assert!(spam.api_key.is_empty());
        assert_eq!(spam.model, "gpt-4o-mini");
        assert!((spam.threshold - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_has_accounts() {
        let mut config = AppConfig::default();
        assert!(!config.has_accounts());
        config.accounts.push(AccountConfig {
            name: "Personal".into(),
            address: "me@example.com".into(),
            host: "imap.example.com".into(),
            protocol: default_protocol(),
            port: 993,
            username: String::new(),
            password: String::new(),
            starttls: false,
        });
        assert!(config.has_accounts());
    }
}
