//! Built-in email transformations applied before sending.
//!
//! Currently supports renaming the headers Amazon SES refuses into
//! `X-` headers.

pub mod sanitize_headers;

pub use sanitize_headers::*;
