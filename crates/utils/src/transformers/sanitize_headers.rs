use tracing::{debug, info};

use crate::{EmailMessage, HeaderSanitizer, MessageTransformer, TransformFuture};

/// Transformer that renames headers SES does not accept into `X-` headers.
///
/// Runs [`HeaderSanitizer::sanitize`] once over the raw message, leaving
/// the body untouched.
pub struct SanitizeHeadersTransformer {
    sanitizer: HeaderSanitizer,
}

impl SanitizeHeadersTransformer {
    pub fn new() -> Self {
        info!("Header sanitization enabled");
        Self {
            sanitizer: HeaderSanitizer::new(),
        }
    }
}

impl Default for SanitizeHeadersTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageTransformer for SanitizeHeadersTransformer {
    fn transform<'a>(&'a self, message: &'a mut EmailMessage) -> TransformFuture<'a> {
        Box::pin(async move {
            let clean = self.sanitizer.sanitize(message.raw());
            if clean != message.raw() {
                debug!(
                    before = message.raw().len(),
                    after = clean.len(),
                    "Sanitized message headers"
                );
            }
            message.set_raw(clean);
        })
    }

    fn name(&self) -> &str {
        "sanitize_headers"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply_transformers;

    #[tokio::test]
    async fn test_sanitize_disallowed_headers() {
        let transformer = SanitizeHeadersTransformer::new();
        let mut message = EmailMessage::from_raw(
            "sender@example.com",
            &["rcpt@example.com"],
            "X-Mailer: mutt\r\nOrganization: ACME\r\nSubject: Hello\r\n\r\nOrganization: body",
        );

        transformer.transform(&mut message).await;

        assert_eq!(
            message.raw(),
            "X-X-Mailer: mutt\r\nX-Organization: ACME\r\nSubject: Hello\r\n\r\nOrganization: body"
        );
        assert!(message.is_modified());
    }

    #[tokio::test]
    async fn test_sanitize_clean_message_unchanged() {
        let transformer = SanitizeHeadersTransformer::new();
        let mut message = EmailMessage::from_raw(
            "sender@example.com",
            &["rcpt@example.com"],
            "From: sender@example.com\r\nSubject: Hello\r\n\r\nBody",
        );

        transformer.transform(&mut message).await;

        assert!(!message.is_modified());
    }

    #[tokio::test]
    async fn test_apply_transformers() {
        let transformers: Vec<Box<dyn MessageTransformer>> =
            vec![Box::new(SanitizeHeadersTransformer::new())];
        let mut message = EmailMessage::from_raw(
            "sender@example.com",
            &["rcpt@example.com"],
            "Foo: 1\nSubject: Test\n\nBody",
        );

        apply_transformers(&transformers, &mut message).await;

        assert_eq!(message.raw(), "X-Foo: 1\nSubject: Test\n\nBody");
        assert_eq!(message.original_raw(), "Foo: 1\nSubject: Test\n\nBody");
    }
}
