//! IMAP connect, fetch, normalize, flag store.
//!
//! Every operation opens its own session and logs out when done; there is
//! no pooled connection. Callers treat failures as degradation, not errors.

use anyhow::Result;
use chrono::{DateTime, Utc};
use imap::types::Flag;
use imap::Session;
use mailparse::MailHeaderMap;
use native_tls::TlsStream;
use std::net::TcpStream;
use tracing::warn;

use crate::config::AccountConfig;

use super::types::Message;

pub(crate) const PREVIEW_MAX_CHARS: usize = 200;

type ImapSession = Session<TlsStream<TcpStream>>;

/// Connect and authenticate against the account's IMAP server.
fn connect(account: &AccountConfig) -> Result<ImapSession> {
    let mut tls_builder = native_tls::TlsConnector::builder();

    // Local bridges (e.g. ProtonMail Bridge) present self-signed certs.
    if account.starttls || account.host == "127.0.0.1" || account.host == "localhost" {
        tls_builder.danger_accept_invalid_certs(true);
        tls_builder.danger_accept_invalid_hostnames(true);
    }

    let tls = tls_builder.build()?;

    let client = if account.starttls {
        imap::connect_starttls((account.host.as_str(), account.port), &account.host, &tls)?
    } else {
        imap::connect((account.host.as_str(), account.port), &account.host, &tls)?
    };

    let session = client
        .login(account.login(), &account.password)
        .map_err(|e| e.0)?;
    Ok(session)
}

/// Fetch the most recent `limit` inbox messages, newest first.
///
/// Errors here mean the whole fetch failed; the client maps that to an
/// empty batch. Individual messages that fail to parse are skipped.
pub(crate) fn fetch_inbox(account: &AccountConfig, limit: usize) -> Result<Vec<Message>> {
    let mut session = connect(account)?;
    session.select("INBOX")?;

    let mut uids: Vec<u32> = session.uid_search("ALL")?.into_iter().collect();
    uids.sort_unstable();
    let start = uids.len().saturating_sub(limit);

    let mut messages = Vec::new();
    for uid in uids[start..].iter().rev() {
        let fetches = session.uid_fetch(uid.to_string(), "(RFC822 FLAGS)")?;
        let fetch = match fetches.iter().next() {
            Some(f) => f,
            None => continue,
        };
        let raw = match fetch.body() {
            Some(b) => b,
            None => continue,
        };

        let parsed = match mailparse::parse_mail(raw) {
            Ok(p) => p,
            Err(err) => {
                warn!("failed to parse message UID {}: {}", uid, err);
                continue;
            }
        };

        let subject = parsed
            .headers
            .get_first_value("Subject")
            .unwrap_or_else(|| "(No subject)".to_string());
        let sender = parsed
            .headers
            .get_first_value("From")
            .unwrap_or_else(|| "Unknown sender".to_string());
        let date_received = parse_received_date(parsed.headers.get_first_value("Date").as_deref());
        let preview = extract_preview(&parsed);

        let flags = fetch.flags();
        let is_unread = !flags.iter().any(|f| matches!(f, Flag::Seen));
        let is_flagged = flags.iter().any(|f| matches!(f, Flag::Flagged));

        messages.push(Message {
            id: format!("{}:{}", account.address, uid),
            account_id: account.address.clone(),
            subject,
            sender,
            preview,
            date_received,
            is_unread,
            is_flagged,
            folder: "INBOX".to_string(),
        });
    }

    // Logout failures are non-fatal; the data is already in hand.
    let _ = session.logout();
    Ok(messages)
}

/// Apply a flag-store command (`"+FLAGS (\\Seen)"` etc.) to one message by
/// its server-side UID.
pub(crate) fn store_flags(account: &AccountConfig, uid: &str, query: &str) -> Result<()> {
    let mut session = connect(account)?;
    session.select("INBOX")?;
    session.uid_store(uid, query)?;
    let _ = session.logout();
    Ok(())
}

/// Receipt time from a Date header, normalized to UTC.
///
/// RFC 2822 first, then mailparse's permissive parser; a missing or
/// unparsable header falls back to the current time.
pub(crate) fn parse_received_date(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|v| {
            DateTime::parse_from_rfc2822(v)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    mailparse::dateparse(v)
                        .ok()
                        .and_then(|ts| DateTime::from_timestamp(ts, 0))
                })
        })
        .unwrap_or_else(Utc::now)
}

/// Plain-text preview: first text/plain part of the multipart walk, or the
/// whole body for single-part messages, collapsed to one bounded line.
pub(crate) fn extract_preview(parsed: &mailparse::ParsedMail) -> String {
    let body = if parsed.subparts.is_empty() {
        parsed.get_body().unwrap_or_default()
    } else {
        find_plain_part(parsed).unwrap_or_default()
    };
    collapse_preview(&body)
}

fn find_plain_part(parsed: &mailparse::ParsedMail) -> Option<String> {
    for part in &parsed.subparts {
        if part.subparts.is_empty() {
            if part.ctype.mimetype == "text/plain" {
                if let Ok(body) = part.get_body() {
                    return Some(body);
                }
            }
        } else if let Some(body) = find_plain_part(part) {
            return Some(body);
        }
    }
    None
}

/// Trim, collapse newlines to spaces, truncate to `PREVIEW_MAX_CHARS`.
pub(crate) fn collapse_preview(body: &str) -> String {
    body.trim()
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
        .chars()
        .take(PREVIEW_MAX_CHARS)
        .collect()
}
