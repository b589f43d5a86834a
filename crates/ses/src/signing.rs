//! AWS Signature Version 4 for SES query API requests.
//!
//! See <https://docs.aws.amazon.com/general/latest/gr/sigv4_signing.html>.
//! Requests go through four steps: canonical request, string to sign,
//! derived signing key and finally the `Authorization` header.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Everything except the RFC 3986 unreserved characters is encoded.
const AWS_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Access key pair used to sign requests.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: &str, secret_access_key: &str, session_token: Option<&str>) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            session_token: session_token.map(|token| token.to_string()),
        }
    }
}

/// Signs requests for one service in one region.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: Credentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(credentials: Credentials, region: &str, service: &str) -> Self {
        Self {
            credentials,
            region: region.to_string(),
            service: service.to_string(),
        }
    }

    /// Returns `headers` extended with `x-amz-date`, the optional
    /// `x-amz-security-token` and the `authorization` header.
    ///
    /// Header names must already be lowercase, `host` is required.
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        query: &str,
        headers: &BTreeMap<String, String>,
        body: &str,
        timestamp: DateTime<Utc>,
    ) -> BTreeMap<String, String> {
        let date_stamp = timestamp.format("%Y%m%d").to_string();
        let amz_date = timestamp.format("%Y%m%dT%H%M%SZ").to_string();

        let mut signed = headers.clone();
        signed.insert("x-amz-date".to_string(), amz_date.clone());
        if let Some(token) = &self.credentials.session_token {
            signed.insert("x-amz-security-token".to_string(), token.clone());
        }

        let signed_names = signed.keys().cloned().collect::<Vec<_>>().join(";");
        let canonical_request = canonical_request(method, path, query, &signed, body);

        let scope = format!(
            "{date_stamp}/{}/{}/aws4_request",
            self.region, self.service
        );
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let signature = hex::encode(hmac_sha256(
            &self.signing_key(&date_stamp),
            string_to_sign.as_bytes(),
        ));

        signed.insert(
            "authorization".to_string(),
            format!(
                "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_names}, Signature={signature}",
                self.credentials.access_key_id
            ),
        );
        signed
    }

    /// kSigning = HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")
    fn signing_key(&self, date_stamp: &str) -> Vec<u8> {
        let secret = format!("AWS4{}", self.credentials.secret_access_key);
        let k_date = hmac_sha256(secret.as_bytes(), date_stamp.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }
}

fn canonical_request(
    method: &str,
    path: &str,
    query: &str,
    headers: &BTreeMap<String, String>,
    body: &str,
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", value.trim()))
        .collect();
    let signed_names = headers.keys().cloned().collect::<Vec<_>>().join(";");
    let path = if path.is_empty() { "/" } else { path };
    format!(
        "{method}\n{path}\n{query}\n{canonical_headers}\n{signed_names}\n{}",
        sha256_hex(body.as_bytes())
    )
}

/// Percent-encodes a value as SigV4 expects (RFC 3986, spaces as `%20`).
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, AWS_ENCODE_SET).to_string()
}

/// Encodes parameters as an `application/x-www-form-urlencoded` body,
/// sorted by name.
pub fn form_encode(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{}={}", uri_encode(name), uri_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn example_signer(service: &str) -> SigV4Signer {
        SigV4Signer::new(
            Credentials::new(
                "AKIDEXAMPLE",
                "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
                None,
            ),
            "us-east-1",
            service,
        )
    }

    fn example_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap()
    }

    #[test]
    fn test_signing_key_reference() {
        let signer = example_signer("iam");
        assert_eq!(
            hex::encode(signer.signing_key("20150830")),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn test_sign_get_vanilla() {
        let signer = example_signer("service");
        let headers = BTreeMap::from([("host".to_string(), "example.amazonaws.com".to_string())]);

        let signed = signer.sign("GET", "/", "", &headers, "", example_time());

        assert_eq!(signed["x-amz-date"], "20150830T123600Z");
        assert_eq!(
            signed["authorization"],
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
    }

    #[test]
    fn test_sign_with_session_token() {
        let signer = SigV4Signer::new(
            Credentials::new("ASIAEXAMPLE", "secret", Some("session-token")),
            "eu-west-1",
            "ses",
        );
        let headers = BTreeMap::from([(
            "host".to_string(),
            "email.eu-west-1.amazonaws.com".to_string(),
        )]);

        let signed = signer.sign("POST", "/", "", &headers, "Action=GetSendQuota", example_time());

        assert_eq!(signed["x-amz-security-token"], "session-token");
        assert!(signed["authorization"].contains("/eu-west-1/ses/aws4_request"));
        assert!(signed["authorization"].contains("SignedHeaders=host;x-amz-date;x-amz-security-token"));
    }

    #[test]
    fn test_sign_depends_on_body() {
        let signer = example_signer("ses");
        let headers = BTreeMap::from([("host".to_string(), "email.us-east-1.amazonaws.com".to_string())]);

        let first = signer.sign("POST", "/", "", &headers, "Action=A", example_time());
        let second = signer.sign("POST", "/", "", &headers, "Action=B", example_time());

        assert_ne!(first["authorization"], second["authorization"]);
    }

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("hello world"), "hello%20world");
        assert_eq!(uri_encode("a+b=c/d"), "a%2Bb%3Dc%2Fd");
        assert_eq!(uri_encode("abcABC123-_.~"), "abcABC123-_.~");
        assert_eq!(uri_encode("me@example.com"), "me%40example.com");
    }

    #[test]
    fn test_form_encode_sorted() {
        let params = BTreeMap::from([
            ("Version".to_string(), "2010-12-01".to_string()),
            ("Action".to_string(), "SendRawEmail".to_string()),
            ("Destinations.member.1".to_string(), "a@b.c".to_string()),
        ]);
        assert_eq!(
            form_encode(&params),
            "Action=SendRawEmail&Destinations.member.1=a%40b.c&Version=2010-12-01"
        );
    }
}
