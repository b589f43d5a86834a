//! Signed HTTP client for the SES query API.
//!
//! Every call is a form-encoded `POST` to the regional endpoint carrying
//! `Action` and `Version` parameters, signed with SigV4 and answered with
//! an XML document. Throttling and server errors are retried with
//! exponential backoff and full jitter.

use std::{collections::BTreeMap, time::Duration};

use chrono::Utc;
use postman_utils::{AwsConfig, RetryConfig};
use rand::Rng;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::{SesError, SesResult},
    signing::{form_encode, Credentials, SigV4Signer},
};

/// Query API version spoken by this client.
pub const API_VERSION: &str = "2010-12-01";

/// Service name used in the SigV4 credential scope.
pub const SIGNING_SERVICE: &str = "ses";

/// Returns the regional SES endpoint, e.g. `https://email.us-east-1.amazonaws.com`.
pub fn regional_endpoint(region: &str) -> String {
    if region.starts_with("cn-") {
        format!("https://email.{region}.amazonaws.com.cn")
    } else {
        format!("https://email.{region}.amazonaws.com")
    }
}

/// HTTP client that signs and retries SES query API calls.
#[derive(Debug, Clone)]
pub struct QueryClient {
    http: Client,
    signer: SigV4Signer,
    endpoint: Url,
    retry: RetryConfig,
}

impl QueryClient {
    pub fn new(
        credentials: Credentials,
        region: &str,
        endpoint: Option<&str>,
        retry: RetryConfig,
    ) -> SesResult<Self> {
        let endpoint = endpoint
            .map(|url| url.to_string())
            .unwrap_or_else(|| regional_endpoint(region));
        let endpoint =
            Url::parse(&endpoint).map_err(|e| SesError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if endpoint.host_str().is_none() {
            return Err(SesError::InvalidEndpoint(endpoint.to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("postman/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            signer: SigV4Signer::new(credentials, region, SIGNING_SERVICE),
            endpoint,
            retry,
        })
    }

    /// Creates a client from the `[aws]` configuration section.
    pub fn from_config(config: &AwsConfig) -> SesResult<Self> {
        let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key)
        else {
            return Err(SesError::MissingCredentials);
        };
        let credentials = Credentials::new(key_id, secret, config.session_token.as_deref());
        Self::new(
            credentials,
            &config.region,
            config.endpoint.as_deref(),
            config.retry.clone(),
        )
    }

    /// Returns the endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Runs `action` with `params` and returns the XML body of the answer.
    pub async fn query_request(
        &self,
        action: &str,
        params: BTreeMap<String, String>,
    ) -> SesResult<String> {
        let mut params = params;
        params.insert("Action".to_string(), action.to_string());
        params.insert("Version".to_string(), API_VERSION.to_string());
        let body = form_encode(&params);

        let max_attempts = self.retry.max_attempts.max(1);
        for attempt in 0..max_attempts {
            let error = match self.execute(&body).await {
                Ok(response) => {
                    debug!(action, attempt = attempt + 1, "SES request succeeded");
                    return Ok(response);
                }
                Err(error) => error,
            };

            if !error.is_retryable() || attempt + 1 >= max_attempts {
                return Err(error);
            }

            let delay = self.backoff(attempt);
            warn!(
                action,
                attempt = attempt + 1,
                max_attempts,
                delay_ms = delay,
                error = %error,
                "Retryable SES error, retrying"
            );
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        Err(SesError::MaxRetries(max_attempts))
    }

    async fn execute(&self, body: &str) -> SesResult<String> {
        let headers = BTreeMap::from([
            (
                "content-type".to_string(),
                "application/x-www-form-urlencoded; charset=utf-8".to_string(),
            ),
            ("host".to_string(), self.host()),
        ]);
        let signed = self.signer.sign(
            "POST",
            self.endpoint.path(),
            "",
            &headers,
            body,
            Utc::now(),
        );

        let mut request = self.http.post(self.endpoint.clone()).body(body.to_string());
        for (name, value) in signed.iter().filter(|(name, _)| name.as_str() != "host") {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(SesError::from_response(status.as_u16(), &text))
        }
    }

    /// Host header value, including the port when it is not the default.
    fn host(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    fn backoff(&self, attempt: u32) -> u64 {
        let exponential = self
            .retry
            .initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        let capped = exponential.min(self.retry.max_backoff_ms);
        rand::thread_rng().gen_range(0..=capped)
    }
}
