use async_trait::async_trait;
use reqwest::Client;

use crate::domain::ports::SmsGateway;
use crate::utils::error::{RegistryError, Result};

/// Kavenegar-shaped SMS gateway: form-POSTs the reply to
/// `<base>/v1/<api_key>/sms/send.json`.
pub struct HttpSmsGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpSmsGateway {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        HttpSmsGateway {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send(&self, receptor: &str, message: &str) -> Result<()> {
        let url = format!(
            "{}/v1/{}/sms/send.json",
            self.base_url.trim_end_matches('/'),
            self.api_key
        );

        let response = self
            .client
            .post(&url)
            .form(&[("receptor", receptor), ("message", message)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::SmsRejected {
                status: status.as_u16(),
            });
        }
        tracing::debug!("message delivered to {receptor}, gateway answered {status}");
        Ok(())
    }
}

/// Gateway for setups without an SMS provider; logs the reply and drops it.
pub struct NoopSmsGateway;

#[async_trait]
impl SmsGateway for NoopSmsGateway {
    async fn send(&self, receptor: &str, _message: &str) -> Result<()> {
        tracing::info!("sms gateway disabled, dropping reply to {receptor}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_gateway_posts_the_legacy_form_shape() {
        let server = MockServer::start();
        let sms_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/testkey/sms/send.json")
                .body_contains("receptor=09120000000")
                .body_contains("message=OK");
            then.status(200);
        });

        let gateway = HttpSmsGateway::new(server.base_url(), "testkey");
        gateway.send("09120000000", "OK").await.unwrap();

        sms_mock.assert();
    }

    #[tokio::test]
    async fn test_gateway_error_status_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(500);
        });

        let gateway = HttpSmsGateway::new(server.base_url(), "testkey");
        let err = gateway.send("09120000000", "OK").await.unwrap_err();
        match err {
            RegistryError::SmsRejected { status } => assert_eq!(status, 500),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_noop_gateway_always_succeeds() {
        NoopSmsGateway.send("anyone", "anything").await.unwrap();
    }
}
