//! Mail data types: Folder, Message, InboxSnapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named mailbox partition. Folders from different accounts with the
/// same (name, display_name) pair are the same logical folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub sort_index: u32,
}

impl Folder {
    pub fn new(name: &str, display_name: &str, is_primary: bool, sort_index: u32) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            is_primary,
            sort_index,
        }
    }

    /// Logical identity used when merging catalogs across accounts.
    pub fn dedup_key(&self) -> (String, String) {
        (self.name.clone(), self.display_name.clone())
    }
}

/// One normalized mail record.
///
/// `id` is scoped by the owning account (`"<address>:<uid>"` for IMAP,
/// `"<address>:sample-<n>"` for fixture data) so ids never collide across
/// accounts. Read/flag state mutates in place; everything else is fixed at
/// fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub account_id: String,
    pub subject: String,
    pub sender: String,
    pub preview: String,
    pub date_received: DateTime<Utc>,
    #[serde(default = "default_unread")]
    pub is_unread: bool,
    #[serde(default)]
    pub is_flagged: bool,
    #[serde(default = "default_folder")]
    pub folder: String,
}

fn default_unread() -> bool {
    true
}

fn default_folder() -> String {
    "INBOX".to_string()
}

/// The aggregated, deduplicated, sorted view handed to the presentation
/// layer. Rebuilt from scratch on every load; never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct InboxSnapshot {
    /// Unique folders, sorted by `sort_index`.
    pub folders: Vec<Folder>,
    /// All surviving messages, newest first.
    pub messages: Vec<Message>,
    /// Count of messages with `is_unread`, recomputed per load.
    pub unread_count: usize,
}
