//! Rewriting of header lines that Amazon SES refuses to relay.
//!
//! SES rejects raw messages carrying headers outside a fixed list. The
//! [`HeaderSanitizer`] turns every such header into an `X-` header so the
//! message is accepted with its information intact.

use regex::Regex;
use tracing::debug;

use crate::{is_blank_line, split_lines_inclusive};

/// Header names SES accepts verbatim, compared case-sensitively.
pub const LEGAL_HEADERS: &[&str] = &[
    "Accept-Language",
    "Bcc",
    "Cc",
    "Comments",
    "Content-Type",
    "Content-Transfer-Encoding",
    "Content-ID",
    "Content-Description",
    "Content-Disposition",
    "Content-Language",
    "Date",
    "DKIM-Signature",
    "DomainKey-Signature",
    "From",
    "In-Reply-To",
    "Keywords",
    "List-Archive",
    "List-Help",
    "List-Id",
    "List-Owner",
    "List-Post",
    "List-Subscribe",
    "List-Unsubscribe",
    "Message-Id",
    "MIME-Version",
    "Received",
    "References",
    "Reply-To",
    "Return-Path",
    "Sender",
    "Subject",
    "Thread-Index",
    "Thread-Topic",
    "To",
    "User-Agent",
];

/// Prefix given to headers outside [`LEGAL_HEADERS`].
pub const EXTENSION_PREFIX: &str = "X-";

/// Rewrites disallowed header names into `X-` headers.
///
/// Only the header section is inspected, it ends at the first line made of
/// nothing but a line break. Indented lines (folded continuations) never
/// match and are left alone. The transform must run once per message,
/// running it again prefixes already rewritten headers a second time.
#[derive(Debug, Clone)]
pub struct HeaderSanitizer {
    header_re: Regex,
}

impl HeaderSanitizer {
    pub fn new() -> Self {
        Self {
            header_re: Regex::new(r"^([\w-]+):").expect("valid header pattern"),
        }
    }

    /// Returns whether SES accepts `name` as a header without rewriting.
    pub fn is_legal(name: &str) -> bool {
        LEGAL_HEADERS.contains(&name)
    }

    /// Returns a copy of `raw` with every disallowed header renamed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let sanitizer = postman_utils::HeaderSanitizer::new();
    /// assert_eq!(
    ///     sanitizer.sanitize("Foo-Bar: 1\nSubject: hi\n\nFoo-Bar: 2\n"),
    ///     "X-Foo-Bar: 1\nSubject: hi\n\nFoo-Bar: 2\n"
    /// );
    /// ```
    pub fn sanitize(&self, raw: &str) -> String {
        let mut clean = String::with_capacity(raw.len() + 16);
        let mut in_header = true;

        for line in split_lines_inclusive(raw) {
            if is_blank_line(line) {
                in_header = false;
            }
            if in_header {
                if let Some(name) = self.header_name(line) {
                    if !Self::is_legal(name) {
                        debug!(header = name, "Renaming disallowed header");
                        clean.push_str(EXTENSION_PREFIX);
                    }
                }
            }
            clean.push_str(line);
        }

        clean
    }

    fn header_name<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.header_re
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|name| name.as_str())
    }
}

impl Default for HeaderSanitizer {
    fn default() -> Self {
        Self::new()
    }
}
