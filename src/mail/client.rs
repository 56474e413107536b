//! Per-account mail client: fetch, ownership routing, flag mutation.

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::AccountConfig;

use super::types::{Folder, Message};
use super::{imap, sample};

/// Retrieval strategy, fixed at construction from the account's protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Imap,
    Sample,
    Unsupported,
}

impl Backend {
    fn from_protocol(protocol: &str) -> Self {
        if protocol.eq_ignore_ascii_case("imap") {
            Backend::Imap
        } else if protocol.eq_ignore_ascii_case("demo") {
            Backend::Sample
        } else {
            Backend::Unsupported
        }
    }
}

/// One configured account as a source of messages.
///
/// Fetch and mutation degrade rather than error: a dead server yields an
/// empty batch, a failed flag push leaves local state applied.
pub struct MailClient {
    account: AccountConfig,
    backend: Backend,
    sample_cache: OnceCell<Vec<Message>>,
}

impl MailClient {
    pub fn new(account: AccountConfig) -> Self {
        let backend = Backend::from_protocol(&account.protocol);
        Self {
            account,
            backend,
            sample_cache: OnceCell::new(),
        }
    }

    /// A client serving the bundled sample data regardless of protocol.
    pub fn sample(account: AccountConfig) -> Self {
        Self {
            account,
            backend: Backend::Sample,
            sample_cache: OnceCell::new(),
        }
    }

    pub fn account(&self) -> &AccountConfig {
        &self.account
    }

    /// The fixed folder catalog. Static per account, no network call.
    pub fn list_primary_folders(&self) -> Vec<Folder> {
        vec![
            Folder::new("INBOX", "Inbox", true, 0),
            Folder::new("STARRED", "Favorites", false, 1),
            Folder::new("SENT", "Sent", false, 2),
            Folder::new("ARCHIVE", "Archive", false, 3),
            Folder::new("SPAM", "Spam", false, 4),
        ]
    }

    /// Up to `limit` most recent inbox messages, newest first.
    pub fn fetch_inbox(&self, limit: usize) -> Vec<Message> {
        match self.backend {
            Backend::Sample => {
                let cached = self
                    .sample_cache
                    .get_or_init(|| sample::load_messages(&self.account));
                cached.iter().take(limit).cloned().collect()
            }
            Backend::Imap => match imap::fetch_inbox(&self.account, limit) {
                Ok(messages) => messages,
                Err(err) => {
                    warn!(
                        "inbox fetch failed for {}: {}; returning empty batch",
                        self.account.address, err
                    );
                    Vec::new()
                }
            },
            Backend::Unsupported => {
                debug!(
                    "protocol {:?} has no transport; returning empty batch",
                    self.account.protocol
                );
                Vec::new()
            }
        }
    }

    /// Whether this client's account owns `message`. Used to route
    /// mutations to the right client.
    pub fn owns_message(&self, message: &Message) -> bool {
        message.account_id == self.account.address
    }

    /// Mark read locally, then best-effort push `\Seen` to the server.
    pub fn mark_as_read(&self, message: &mut Message) {
        message.is_unread = false;
        self.push_flags(message, "+FLAGS (\\Seen)");
    }

    /// Flip the starred flag locally, then best-effort push the new state.
    pub fn toggle_flag(&self, message: &mut Message) {
        message.is_flagged = !message.is_flagged;
        let query = if message.is_flagged {
            "+FLAGS (\\Flagged)"
        } else {
            "-FLAGS (\\Flagged)"
        };
        self.push_flags(message, query);
    }

    /// Remote sync is advisory: local state is already applied, so a
    /// failed store is logged and swallowed.
    fn push_flags(&self, message: &Message, query: &str) {
        if self.backend != Backend::Imap {
            return;
        }
        let uid = match message.id.rsplit(':').next() {
            Some(uid) => uid,
            None => return,
        };
        if let Err(err) = imap::store_flags(&self.account, uid, query) {
            debug!(
                "flag push {:?} for {} failed: {}",
                query, message.id, err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_protocol() {
        assert_eq!(Backend::from_protocol("imap"), Backend::Imap);
        assert_eq!(Backend::from_protocol("IMAP"), Backend::Imap);
        assert_eq!(Backend::from_protocol("demo"), Backend::Sample);
        assert_eq!(Backend::from_protocol("pop3"), Backend::Unsupported);
        assert_eq!(Backend::from_protocol(""), Backend::Unsupported);
    }
}
