//! The controller the presentation layer talks to: aggregate, refresh,
//! mutate, demo fallback.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use tracing::debug;

use crate::config::{AccountConfig, AppConfig};
use crate::mail::{Folder, InboxSnapshot, MailClient, Message};
use crate::runner::{TaskHandle, TaskRunner};
use crate::spam::SpamFilter;

/// Messages fetched per account and load.
const INBOX_FETCH_LIMIT: usize = 50;

struct ControllerInner {
    clients: RwLock<Vec<MailClient>>,
    spam: SpamFilter,
    runner: Arc<TaskRunner>,
    generation: AtomicU64,
}

/// Composes the per-account clients, the spam pipeline, and the task
/// runner into one aggregated view. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct MailController {
    inner: Arc<ControllerInner>,
}

impl MailController {
    pub fn new(config: AppConfig, runner: Arc<TaskRunner>) -> Self {
        let clients = config
            .accounts
            .iter()
            .cloned()
            .map(MailClient::new)
            .collect();
        Self {
            inner: Arc::new(ControllerInner {
                clients: RwLock::new(clients),
                spam: SpamFilter::new(config.spam),
                runner,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// The configured account descriptors, in client order.
    pub fn accounts(&self) -> Vec<AccountConfig> {
        let clients = self
            .inner
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        clients.iter().map(|c| c.account().clone()).collect()
    }

    /// Fetch every account, filter spam, and assemble a fresh snapshot.
    ///
    /// Accounts are fetched concurrently (one task per client, including
    /// that account's classification call) and joined in account order, so
    /// the final ordering never depends on which fetch finished first.
    /// Blocking: production callers go through [`refresh_inbox_async`]
    /// except for the one initial load at startup.
    ///
    /// [`refresh_inbox_async`]: Self::refresh_inbox_async
    pub fn load_initial_inbox(&self) -> InboxSnapshot {
        let clients = self
            .inner
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let spam = &self.inner.spam;

        let per_account: Vec<(Vec<Folder>, Vec<Message>)> = thread::scope(|scope| {
            let handles: Vec<_> = clients
                .iter()
                .map(|client| {
                    scope.spawn(move || {
                        let folders = client.list_primary_folders();
                        let batch = client.fetch_inbox(INBOX_FETCH_LIMIT);
                        let kept = spam.filter(batch);
                        (folders, kept)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|_| (Vec::new(), Vec::new())))
                .collect()
        });

        let mut catalogs: Vec<Vec<Folder>> = Vec::new();
        let mut messages: Vec<Message> = Vec::new();
        for (catalog, kept) in per_account {
            catalogs.push(catalog);
            messages.extend(kept);
        }

        let folders = dedup_folders(catalogs);
        messages.sort_by(|a, b| b.date_received.cmp(&a.date_received));
        let unread_count = messages.iter().filter(|m| m.is_unread).count();

        debug!(
            "assembled inbox snapshot: {} folders, {} messages, {} unread",
            folders.len(),
            messages.len(),
            unread_count
        );

        InboxSnapshot {
            folders,
            messages,
            unread_count,
        }
    }

    /// Schedule a full reload on the task runner.
    ///
    /// Returns this refresh's generation; the same generation is handed to
    /// `on_done`, so a caller applying "latest wins" compares it against
    /// the newest generation it has seen and discards stale completions.
    pub fn refresh_inbox_async<F>(&self, on_done: F) -> u64
    where
        F: FnOnce(u64, Result<InboxSnapshot>) + Send + 'static,
    {
        self.refresh_inbox_with_handle(on_done).0
    }

    /// Schedule a full reload, keeping the task handle.
    pub fn refresh_inbox_with_handle<F>(&self, on_done: F) -> (u64, TaskHandle)
    where
        F: FnOnce(u64, Result<InboxSnapshot>) + Send + 'static,
    {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let controller = self.clone();
        let handle = self.inner.runner.run(
            move || Ok(controller.load_initial_inbox()),
            move |result| on_done(generation, result),
        );
        (generation, handle)
    }

    /// Route a mark-read mutation to the owning client.
    pub fn mark_as_read(&self, message: &mut Message) {
        self.with_owner(message, |client, message| client.mark_as_read(message));
    }

    /// Route a star/flag toggle to the owning client.
    pub fn toggle_flag(&self, message: &mut Message) {
        self.with_owner(message, |client, message| client.toggle_flag(message));
    }

    fn with_owner(&self, message: &mut Message, apply: impl FnOnce(&MailClient, &mut Message)) {
        let clients = self
            .inner
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        // Accounts have disjoint id namespaces, so at most one matches.
        match clients.iter().find(|client| client.owns_message(message)) {
            Some(client) => apply(client, message),
            None => debug!("no client owns message {}; mutation dropped", message.id),
        }
    }

    /// Install the synthetic demo account when nothing is configured, so
    /// the application always has something to show. Idempotent.
    pub fn ensure_sample_client(&self) {
        let mut clients = self
            .inner
            .clients
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !clients.is_empty() {
            return;
        }
        let account = AccountConfig {
            name: "Demo Mail".to_string(),
            address: "grandma@example.com".to_string(),
            host: "sample.local".to_string(),
            protocol: "demo".to_string(),
            port: 993,
            username: String::new(),
            password: String::new(),
            starttls: false,
        };
        clients.push(MailClient::sample(account));
    }
}

/// Merge folder catalogs from all accounts into one ranked list.
///
/// At most one entry survives per (name, display_name) pair; the
/// primary-marked copy wins a conflict, keeping the first-seen position.
fn dedup_folders(catalogs: Vec<Vec<Folder>>) -> Vec<Folder> {
    let mut folders: Vec<Folder> = Vec::new();
    let mut seen: HashMap<(String, String), usize> = HashMap::new();

    for folder in catalogs.into_iter().flatten() {
        match seen.get(&folder.dedup_key()) {
            Some(&index) => {
                if folder.is_primary {
                    folders[index] = folder;
                }
            }
            None => {
                seen.insert(folder.dedup_key(), folders.len());
                folders.push(folder);
            }
        }
    }

    folders.sort_by_key(|folder| folder.sort_index);
    folders
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_folders_primary_wins() {
        let plain = Folder::new("INBOX", "Inbox", false, 0);
        let primary = Folder::new("INBOX", "Inbox", true, 0);
        let merged = dedup_folders(vec![vec![plain], vec![primary]]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].is_primary);
    }

    #[test]
    fn test_dedup_folders_distinct_pairs_kept() {
        let inbox = Folder::new("INBOX", "Inbox", true, 0);
        let renamed = Folder::new("INBOX", "Mail", false, 1);
        let merged = dedup_folders(vec![vec![inbox], vec![renamed]]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_dedup_folders_sorted_by_rank() {
        let sent = Folder::new("SENT", "Sent", false, 2);
        let inbox = Folder::new("INBOX", "Inbox", true, 0);
        let starred = Folder::new("STARRED", "Favorites", false, 1);
        let merged = dedup_folders(vec![vec![sent, inbox], vec![starred]]);
        let names: Vec<&str> = merged.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["INBOX", "STARRED", "SENT"]);
    }
}
