//! Amazon SES operations used by the command line.
//!
//! [`EmailService`] is the seam between the commands and the network: the
//! binary talks to SES through [`SesClient`], tests plug in their own
//! implementation.

use std::{collections::BTreeMap, future::Future, pin::Pin};

use base64::{engine::general_purpose, Engine as _};
use postman_utils::AwsConfig;
use tracing::{debug, info};

use crate::{
    client::QueryClient,
    error::SesResult,
    xml::{xml_block, xml_blocks, xml_text, xml_text_all},
};

/// Boxed future type for service operations, enabling object safety.
pub type SesFuture<'a, T> = Pin<Box<dyn Future<Output = SesResult<T>> + Send + 'a>>;

/// Outcome of a `SendRawEmail` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendRawEmailOutput {
    /// Identifier SES assigned to the message, empty when none came back.
    pub message_id: String,
}

impl SendRawEmailOutput {
    /// A send succeeded only when SES handed back a message identifier.
    pub fn is_accepted(&self) -> bool {
        !self.message_id.is_empty()
    }
}

/// Sending limits of the account, values as reported by SES.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendQuota {
    pub max_24_hour_send: String,
    pub sent_last_24_hours: String,
    pub max_send_rate: String,
}

/// One fifteen-minute bucket of sending activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendDataPoint {
    pub timestamp: String,
    pub delivery_attempts: String,
    pub bounces: String,
    pub complaints: String,
    pub rejects: String,
}

/// Operations of the SES v1 query API used by postman.
pub trait EmailService: Send + Sync {
    /// Sends a complete raw message to `destinations`.
    fn send_raw_email<'a>(
        &'a self,
        raw: &'a str,
        source: Option<&'a str>,
        destinations: &'a [String],
    ) -> SesFuture<'a, SendRawEmailOutput>;

    /// Asks SES to send a verification mail to `address`.
    fn verify_email_address<'a>(&'a self, address: &'a str) -> SesFuture<'a, ()>;

    /// Lists the addresses verified for sending.
    fn list_verified_email_addresses(&self) -> SesFuture<'_, Vec<String>>;

    /// Returns the sending quota of the account.
    fn get_send_quota(&self) -> SesFuture<'_, SendQuota>;

    /// Returns the sending statistics of the last two weeks.
    fn get_send_statistics(&self) -> SesFuture<'_, Vec<SendDataPoint>>;

    /// Removes `address` from the verified list.
    fn delete_verified_email_address<'a>(&'a self, address: &'a str) -> SesFuture<'a, ()>;
}

/// [`EmailService`] backed by the SES query API.
pub struct SesClient {
    client: QueryClient,
}

impl SesClient {
    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// Creates a client from the `[aws]` configuration section.
    pub fn from_config(config: &AwsConfig) -> SesResult<Self> {
        let client = QueryClient::from_config(config)?;
        info!(endpoint = client.endpoint(), region = %config.region, "SES client initialized");
        Ok(Self::new(client))
    }
}

impl EmailService for SesClient {
    fn send_raw_email<'a>(
        &'a self,
        raw: &'a str,
        source: Option<&'a str>,
        destinations: &'a [String],
    ) -> SesFuture<'a, SendRawEmailOutput> {
        Box::pin(async move {
            let mut params = BTreeMap::new();
            params.insert(
                "RawMessage.Data".to_string(),
                general_purpose::STANDARD.encode(raw),
            );
            if let Some(source) = source {
                params.insert("Source".to_string(), source.to_string());
            }
            for (index, destination) in destinations.iter().enumerate() {
                params.insert(
                    format!("Destinations.member.{}", index + 1),
                    destination.clone(),
                );
            }
            debug!(size = raw.len(), destinations = destinations.len(), "Sending raw email");
            let body = self.client.query_request("SendRawEmail", params).await?;
            Ok(parse_send_raw_email(&body))
        })
    }

    fn verify_email_address<'a>(&'a self, address: &'a str) -> SesFuture<'a, ()> {
        Box::pin(async move {
            let params = BTreeMap::from([("EmailAddress".to_string(), address.to_string())]);
            self.client.query_request("VerifyEmailAddress", params).await?;
            Ok(())
        })
    }

    fn list_verified_email_addresses(&self) -> SesFuture<'_, Vec<String>> {
        Box::pin(async move {
            let body = self
                .client
                .query_request("ListVerifiedEmailAddresses", BTreeMap::new())
                .await?;
            Ok(parse_verified_addresses(&body))
        })
    }

    fn get_send_quota(&self) -> SesFuture<'_, SendQuota> {
        Box::pin(async move {
            let body = self
                .client
                .query_request("GetSendQuota", BTreeMap::new())
                .await?;
            Ok(parse_send_quota(&body))
        })
    }

    fn get_send_statistics(&self) -> SesFuture<'_, Vec<SendDataPoint>> {
        Box::pin(async move {
            let body = self
                .client
                .query_request("GetSendStatistics", BTreeMap::new())
                .await?;
            Ok(parse_send_statistics(&body))
        })
    }

    fn delete_verified_email_address<'a>(&'a self, address: &'a str) -> SesFuture<'a, ()> {
        Box::pin(async move {
            let params = BTreeMap::from([("EmailAddress".to_string(), address.to_string())]);
            self.client
                .query_request("DeleteVerifiedEmailAddress", params)
                .await?;
            Ok(())
        })
    }
}

fn parse_send_raw_email(body: &str) -> SendRawEmailOutput {
    let message_id = xml_block(body, "SendRawEmailResult")
        .and_then(|result| xml_text(result, "MessageId"))
        .unwrap_or_default();
    SendRawEmailOutput { message_id }
}

fn parse_verified_addresses(body: &str) -> Vec<String> {
    xml_block(body, "VerifiedEmailAddresses")
        .map(|list| xml_text_all(list, "member"))
        .unwrap_or_default()
}

fn parse_send_quota(body: &str) -> SendQuota {
    let field = |tag: &str| xml_text(body, tag).unwrap_or_default();
    SendQuota {
        max_24_hour_send: field("Max24HourSend"),
        sent_last_24_hours: field("SentLast24Hours"),
        max_send_rate: field("MaxSendRate"),
    }
}

fn parse_send_statistics(body: &str) -> Vec<SendDataPoint> {
    let Some(points) = xml_block(body, "SendDataPoints") else {
        return Vec::new();
    };
    xml_blocks(points, "member")
        .into_iter()
        .map(|member| {
            let field = |tag: &str| xml_text(member, tag).unwrap_or_default();
            SendDataPoint {
                timestamp: field("Timestamp"),
                delivery_attempts: field("DeliveryAttempts"),
                bounces: field("Bounces"),
                complaints: field("Complaints"),
                rejects: field("Rejects"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use postman_utils::RetryConfig;

    use super::*;
    use crate::{signing::Credentials, SesError};

    const SEND_RAW_EMAIL_RESPONSE: &str = r#"<SendRawEmailResponse xmlns="http://ses.amazonaws.com/doc/2010-12-01/">
  <SendRawEmailResult>
    <MessageId>00000131d51d6b36-1d4f9293-0aee-4503-b573-9ae4e70e9e38-000000</MessageId>
  </SendRawEmailResult>
  <ResponseMetadata>
    <RequestId>e0abcdfa-c866-11e0-b6d0-273d09173b49</RequestId>
  </ResponseMetadata>
</SendRawEmailResponse>"#;

    const LIST_VERIFIED_RESPONSE: &str = r#"<ListVerifiedEmailAddressesResponse xmlns="http://ses.amazonaws.com/doc/2010-12-01/">
  <ListVerifiedEmailAddressesResult>
    <VerifiedEmailAddresses>
      <member>example@amazon.com</member>
      <member>sender@example.com</member>
    </VerifiedEmailAddresses>
  </ListVerifiedEmailAddressesResult>
  <ResponseMetadata>
    <RequestId>3dd50e97-c865-11e0-b235-099eb63d928d</RequestId>
  </ResponseMetadata>
</ListVerifiedEmailAddressesResponse>"#;

    const SEND_QUOTA_RESPONSE: &str = r#"<GetSendQuotaResponse xmlns="http://ses.amazonaws.com/doc/2010-12-01/">
  <GetSendQuotaResult>
    <SentLast24Hours>127.0</SentLast24Hours>
    <Max24HourSend>200.0</Max24HourSend>
    <MaxSendRate>1.0</MaxSendRate>
  </GetSendQuotaResult>
  <ResponseMetadata>
    <RequestId>273021c6-c866-11e0-b926-699e21c3af9e</RequestId>
  </ResponseMetadata>
</GetSendQuotaResponse>"#;

    const SEND_STATISTICS_RESPONSE: &str = r#"<GetSendStatisticsResponse xmlns="http://ses.amazonaws.com/doc/2010-12-01/">
  <GetSendStatisticsResult>
    <SendDataPoints>
      <member>
        <DeliveryAttempts>8</DeliveryAttempts>
        <Timestamp>2011-08-03T19:23:00Z</Timestamp>
        <Rejects>0</Rejects>
        <Bounces>0</Bounces>
        <Complaints>0</Complaints>
      </member>
      <member>
        <DeliveryAttempts>7</DeliveryAttempts>
        <Timestamp>2011-08-03T06:53:00Z</Timestamp>
        <Rejects>1</Rejects>
        <Bounces>2</Bounces>
        <Complaints>3</Complaints>
      </member>
    </SendDataPoints>
  </GetSendStatisticsResult>
  <ResponseMetadata>
    <RequestId>c2b66ee5-c866-11e0-b17f-cddb0ab334db</RequestId>
  </ResponseMetadata>
</GetSendStatisticsResponse>"#;

    fn test_service(endpoint: &str) -> SesClient {
        let client = QueryClient::new(
            Credentials::new("AKIDEXAMPLE", "secret", None),
            "us-east-1",
            Some(endpoint),
            RetryConfig {
                max_attempts: 1,
                initial_backoff_ms: 1,
                max_backoff_ms: 1,
            },
        )
        .unwrap();
        SesClient::new(client)
    }

    #[test]
    fn test_parse_send_raw_email() {
        let output = parse_send_raw_email(SEND_RAW_EMAIL_RESPONSE);
        assert_eq!(
            output.message_id,
            "00000131d51d6b36-1d4f9293-0aee-4503-b573-9ae4e70e9e38-000000"
        );
        assert!(output.is_accepted());
    }

    #[test]
    fn test_parse_send_raw_email_without_id() {
        let output = parse_send_raw_email("<SendRawEmailResponse><SendRawEmailResult/></SendRawEmailResponse>");
        assert!(!output.is_accepted());
    }

    #[test]
    fn test_parse_verified_addresses() {
        assert_eq!(
            parse_verified_addresses(LIST_VERIFIED_RESPONSE),
            vec!["example@amazon.com", "sender@example.com"]
        );
    }

    #[test]
    fn test_parse_verified_addresses_empty() {
        let body = "<ListVerifiedEmailAddressesResponse><ListVerifiedEmailAddressesResult><VerifiedEmailAddresses/></ListVerifiedEmailAddressesResult></ListVerifiedEmailAddressesResponse>";
        assert!(parse_verified_addresses(body).is_empty());
    }

    #[test]
    fn test_parse_send_quota() {
        assert_eq!(
            parse_send_quota(SEND_QUOTA_RESPONSE),
            SendQuota {
                max_24_hour_send: "200.0".to_string(),
                sent_last_24_hours: "127.0".to_string(),
                max_send_rate: "1.0".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_send_statistics() {
        let points = parse_send_statistics(SEND_STATISTICS_RESPONSE);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, "2011-08-03T19:23:00Z");
        assert_eq!(points[0].delivery_attempts, "8");
        assert_eq!(points[1].rejects, "1");
        assert_eq!(points[1].bounces, "2");
        assert_eq!(points[1].complaints, "3");
    }

    #[tokio::test]
    async fn test_send_raw_email_request() {
        let raw = "From: sender@example.com\r\nSubject: Hi\r\n\r\nBody";
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Action".to_string(), "SendRawEmail".to_string()),
                Matcher::UrlEncoded(
                    "RawMessage.Data".to_string(),
                    general_purpose::STANDARD.encode(raw),
                ),
                Matcher::UrlEncoded("Source".to_string(), "sender@example.com".to_string()),
                Matcher::UrlEncoded(
                    "Destinations.member.1".to_string(),
                    "a@example.com".to_string(),
                ),
                Matcher::UrlEncoded(
                    "Destinations.member.2".to_string(),
                    "b@example.com".to_string(),
                ),
            ]))
            .with_status(200)
            .with_body(SEND_RAW_EMAIL_RESPONSE)
            .create_async()
            .await;

        let service = test_service(&server.url());
        let destinations = vec!["a@example.com".to_string(), "b@example.com".to_string()];
        let output = service
            .send_raw_email(raw, Some("sender@example.com"), &destinations)
            .await
            .unwrap();

        assert!(output.is_accepted());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_verified_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::UrlEncoded(
                "Action".to_string(),
                "ListVerifiedEmailAddresses".to_string(),
            ))
            .with_status(200)
            .with_body(LIST_VERIFIED_RESPONSE)
            .create_async()
            .await;

        let service = test_service(&server.url());
        let addresses = service.list_verified_email_addresses().await.unwrap();

        assert_eq!(addresses.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_verified_request_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::UrlEncoded(
                "Action".to_string(),
                "DeleteVerifiedEmailAddress".to_string(),
            ))
            .with_status(400)
            .with_body("<ErrorResponse><Error><Code>InvalidParameterValue</Code><Message>Invalid email address.</Message></Error></ErrorResponse>")
            .create_async()
            .await;

        let service = test_service(&server.url());
        let result = service.delete_verified_email_address("not-an-address").await;

        assert!(matches!(result, Err(SesError::Service { status: 400, .. })));
        mock.assert_async().await;
    }
}
