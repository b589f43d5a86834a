//! Pre-send email message transformations.
//!
//! Transformers run after the raw message is read from standard input and
//! before it is handed to the sending service, allowing the text of an
//! [`EmailMessage`] to be rewritten in place. Concrete implementations live
//! in the [`transformers`](crate::transformers) module.

use std::{future::Future, pin::Pin};

use tracing::debug;

use crate::{EmailMessage, SanitizeHeadersTransformer, SendConfig};

/// Boxed future type for transformer operations, enabling async transformers.
pub type TransformFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Trait for message transformers that modify emails before sending.
pub trait MessageTransformer: Send + Sync {
    /// Transforms an email message in place, possibly performing async operations.
    fn transform<'a>(&'a self, message: &'a mut EmailMessage) -> TransformFuture<'a>;

    /// Returns the name of this transformer.
    fn name(&self) -> &str;
}

/// Applies a list of transformers to a message in order.
pub async fn apply_transformers(
    transformers: &[Box<dyn MessageTransformer>],
    message: &mut EmailMessage,
) {
    for transformer in transformers {
        debug!(transformer = transformer.name(), "Applying transformer");
        transformer.transform(message).await;
    }
}

/// Builds the transformer chain for a single send.
///
/// Header sanitization is requested either from the command line or from
/// the `[send]` section of the configuration, and is added at most once.
pub fn build_transformers(
    config: &SendConfig,
    sanitize: bool,
) -> Vec<Box<dyn MessageTransformer>> {
    let mut transformers: Vec<Box<dyn MessageTransformer>> = Vec::new();
    if sanitize || config.sanitize {
        transformers.push(Box::new(SanitizeHeadersTransformer::new()));
    }
    transformers
}
