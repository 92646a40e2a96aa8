//! The outbound email transport contract.
//!
//! The dispatcher treats the transport as an opaque collaborator:
//! `send(to, subject, html_body) → delivery id | error`. Misconfiguration
//! (missing credentials or sender identity) is a distinct, fatal error —
//! per-recipient send failures are tallied by the dispatcher instead.

use std::future::Future;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
  /// Missing credentials or sender identity. Aborts the whole batch.
  #[error("transport not configured: {0}")]
  NotConfigured(String),

  /// A per-recipient delivery failure. Tallied, never aborts the batch.
  #[error("send failed: {0}")]
  Send(String),
}

/// Abstraction over an outbound email service.
pub trait EmailTransport: Send + Sync {
  /// Send one email; returns the transport's delivery id.
  fn send<'a>(
    &'a self,
    to_address: &'a str,
    subject: &'a str,
    html_body: &'a str,
  ) -> impl Future<Output = Result<String, TransportError>> + Send + 'a;
}
