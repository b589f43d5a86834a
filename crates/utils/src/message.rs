//! Outbound email message type used by the send pipeline.
//!
//! This module defines [`EmailMessage`], a raw
//! [RFC 5322](https://www.rfc-editor.org/rfc/rfc5322) message read from
//! standard input together with its envelope (source and destinations).
//! The raw text is kept byte-faithful, transformers replace it as a whole.

use crate::parse_raw_headers;

/// Represents an email message on its way to the sending service.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Envelope sender, when `None` the service takes it from the `From` header.
    pub source: Option<String>,

    /// Envelope recipients the message is delivered to.
    pub destinations: Vec<String>,

    /// Current raw message (headers + blank line + body).
    raw: String,

    /// Raw message as read, never modified after construction.
    original_raw: String,
}

impl EmailMessage {
    pub fn new(source: Option<String>, destinations: Vec<String>, raw: String) -> Self {
        Self {
            source,
            destinations,
            original_raw: raw.clone(),
            raw,
        }
    }

    pub fn from_raw(source: &str, destinations: &[&str], raw: &str) -> Self {
        Self::new(
            Some(source.to_string()),
            destinations.iter().map(|d| d.to_string()).collect(),
            raw.to_string(),
        )
    }

    /// Returns the first header value matching `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<String> {
        let (headers, _) = parse_raw_headers(&self.raw);
        headers
            .into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Returns the email subject, empty when the header is missing.
    pub fn subject(&self) -> String {
        self.header("Subject").unwrap_or_default()
    }

    /// Returns the raw message as it will be sent.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the raw message as read, before any transformer ran.
    pub fn original_raw(&self) -> &str {
        &self.original_raw
    }

    /// Replaces the raw message, used by transformers.
    pub fn set_raw(&mut self, raw: String) {
        self.raw = raw;
    }

    /// Returns whether a transformer changed the message.
    pub fn is_modified(&self) -> bool {
        self.raw != self.original_raw
    }
}
