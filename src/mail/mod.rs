//! Mail retrieval: account clients, record types, protocol plumbing.

pub mod client;
mod imap;
mod sample;
pub mod types;

pub use client::MailClient;
pub use types::{Folder, InboxSnapshot, Message};
