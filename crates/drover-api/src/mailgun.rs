//! Mailgun HTTP transport.
//!
//! Credentials are validated at construction so a deployment with a missing
//! api key fails at startup, not on the first recipient of the first
//! campaign.

use std::time::Duration;

use drover_core::transport::{EmailTransport, TransportError};
use reqwest::Client;
use serde::Deserialize;

/// Connection settings for the Mailgun messages API.
#[derive(Debug, Clone)]
pub struct MailgunConfig {
  pub api_key: String,
  pub domain:  String,
  /// The `From:` identity, e.g. `Drover <no-reply@mg.example.com>`.
  pub sender:  String,
  /// API root; override for the EU region.
  pub base_url: String,
}

impl MailgunConfig {
  pub fn new(api_key: String, domain: String, sender: String) -> Self {
    Self {
      api_key,
      domain,
      sender,
      base_url: "https://api.mailgun.net".to_owned(),
    }
  }
}

/// [`EmailTransport`] implementation over the Mailgun REST API.
#[derive(Clone)]
pub struct MailgunTransport {
  client: Client,
  config: MailgunConfig,
}

impl MailgunTransport {
  pub fn new(config: MailgunConfig) -> Result<Self, TransportError> {
    for (field, value) in [
      ("api_key", &config.api_key),
      ("domain", &config.domain),
      ("sender", &config.sender),
    ] {
      if value.trim().is_empty() {
        return Err(TransportError::NotConfigured(format!(
          "mailgun {field} is not set"
        )));
      }
    }

    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| TransportError::NotConfigured(format!("http client: {e}")))?;

    Ok(Self { client, config })
  }

  fn messages_url(&self) -> String {
    format!(
      "{}/v3/{}/messages",
      self.config.base_url.trim_end_matches('/'),
      self.config.domain
    )
  }
}

#[derive(Deserialize)]
struct MailgunResponse {
  id: Option<String>,
}

impl EmailTransport for MailgunTransport {
  async fn send(
    &self,
    to_address: &str,
    subject: &str,
    html_body: &str,
  ) -> Result<String, TransportError> {
    let resp = self
      .client
      .post(self.messages_url())
      .basic_auth("api", Some(&self.config.api_key))
      .form(&[
        ("from", self.config.sender.as_str()),
        ("to", to_address),
        ("subject", subject),
        ("html", html_body),
      ])
      .send()
      .await
      .map_err(|e| TransportError::Send(format!("mailgun request failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(TransportError::Send(format!("mailgun {status}: {body}")));
    }

    let parsed: MailgunResponse = resp
      .json()
      .await
      .map_err(|e| TransportError::Send(format!("mailgun response: {e}")))?;
    Ok(parsed.id.unwrap_or_default())
  }
}
