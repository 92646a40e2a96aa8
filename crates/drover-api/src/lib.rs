//! HTTP boundary for Drover.
//!
//! Exposes an axum [`Router`] backed by any
//! [`drover_core::store::CampaignStore`] and
//! [`drover_core::transport::EmailTransport`]. The campaign routes assume an
//! authenticated caller upstream; the `/track/*` routes are public by design
//! and the `/internal/*` route is gated by a shared cron secret.

pub mod campaigns;
pub mod error;
pub mod internal;
pub mod mailgun;
pub mod track;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use drover_core::{store::CampaignStore, transport::EmailTransport};

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Values the handlers need beyond the store and transport. Threaded through
/// state explicitly; nothing here is read from process-wide globals.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// HMAC secret for tracking tokens. Empty disables signing.
  pub tracking_secret:      String,
  /// Shared secret for the internal cron route. `None` disables the route.
  pub cron_secret:          Option<String>,
  /// Throttle applied when a request doesn't specify one.
  pub default_rate_per_sec: f64,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, T> {
  pub store:     Arc<S>,
  pub transport: Arc<T>,
  pub config:    Arc<ApiConfig>,
}

// Manual impl: `Arc` fields clone without `S: Clone`/`T: Clone` bounds.
impl<S, T> Clone for AppState<S, T> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      transport: Arc::clone(&self.transport),
      config:    Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S, T>(state: AppState<S, T>) -> Router
where
  S: CampaignStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  T: EmailTransport + 'static,
{
  Router::new()
    .route(
      "/organizations/{org}/campaigns/{id}/prepare",
      post(campaigns::prepare::<S, T>),
    )
    .route(
      "/organizations/{org}/campaigns/{id}/send",
      post(campaigns::send::<S, T>),
    )
    .route("/track/open", get(track::open::<S, T>))
    .route("/track/click", get(track::click::<S, T>))
    .route(
      "/internal/process-scheduled-campaigns",
      post(internal::process_scheduled::<S, T>),
    )
    .with_state(state)
}
