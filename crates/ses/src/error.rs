//! Error type for Amazon SES calls.
//!
//! SES answers failed query API calls with an XML `ErrorResponse` carrying
//! a `Code`, a `Message` and a `RequestId`, these are surfaced as
//! [`SesError::Service`]. Transport failures keep the underlying `reqwest`
//! error.

use thiserror::Error;

use crate::xml::xml_text;

/// Result type for SES operations.
pub type SesResult<T> = Result<T, SesError>;

/// Error codes SES uses when a request should be tried again later.
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestThrottled",
    "ServiceUnavailable",
    "InternalFailure",
];

/// Errors that can occur while talking to SES.
#[derive(Debug, Error)]
pub enum SesError {
    /// The HTTP request could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SES rejected the request.
    #[error("SES error [{code}]: {message} (HTTP {status})")]
    Service {
        code: String,
        message: String,
        status: u16,
        request_id: Option<String>,
    },

    /// No access key pair is configured.
    #[error(
        "Missing AWS credentials, set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY \
         or the [aws] section of the configuration file"
    )]
    MissingCredentials,

    /// The configured endpoint is not a usable URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Every attempt allowed by the retry policy failed.
    #[error("Request failed after {0} attempts")]
    MaxRetries(u32),
}

impl SesError {
    /// Builds a [`SesError::Service`] from a non-2xx response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        SesError::Service {
            code: xml_text(body, "Code").unwrap_or_else(|| "UnknownError".to_string()),
            message: xml_text(body, "Message").unwrap_or_else(|| format!("HTTP {status} from SES")),
            status,
            request_id: xml_text(body, "RequestId"),
        }
    }

    /// Returns whether a new attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SesError::Http(error) => error.is_timeout() || error.is_connect(),
            SesError::Service { code, status, .. } => {
                *status >= 500 || *status == 429 || THROTTLING_CODES.contains(&code.as_str())
            }
            _ => false,
        }
    }
}
