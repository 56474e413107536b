//! Backend for a desktop mail reader.
//!
//! The presentation layer holds a [`MailController`] and a shared
//! [`TaskRunner`] and needs nothing else: an initial synchronous load, an
//! async refresh with a completion callback, read/flag mutation on
//! messages, and a static [`AppConfig`] it resolved itself. Everything
//! degrades instead of failing: a dead server yields an empty account, an
//! unreachable spam service filters nothing, a failed flag push leaves the
//! local state applied.
//!
//! [`MailController`]: controller::MailController
//! [`TaskRunner`]: runner::TaskRunner
//! [`AppConfig`]: config::AppConfig

pub mod config;
pub mod controller;
pub mod mail;
pub mod runner;
pub mod spam;

pub use config::{AccountConfig, AppConfig, SpamConfig};
pub use controller::MailController;
pub use mail::{Folder, InboxSnapshot, MailClient, Message};
pub use runner::{Dispatcher, TaskHandle, TaskRunner};
pub use spam::{SpamFilter, SpamVerdict};
