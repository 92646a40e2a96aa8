//! The internal cron endpoint.
//!
//! Called by an external scheduler on a fixed interval. Access is gated by a
//! shared secret in `X-Cron-Secret`; when no secret is configured the route
//! answers 503 so a misconfigured deployment fails loudly instead of
//! silently never sending.

use axum::{
  Json,
  extract::{Query, State},
  http::HeaderMap,
};
use drover_core::{store::CampaignStore, transport::EmailTransport};
use drover_engine::scheduler;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::ApiError};

/// Request bounds; anything outside is clamped, not rejected.
const MAX_CAMPAIGNS_RANGE: (usize, usize) = (1, 20);
const RATE_RANGE: (f64, f64) = (0.1, 14.0);

const DEFAULT_MAX_CAMPAIGNS: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ScheduleParams {
  pub max_campaigns: Option<usize>,
  pub rate_per_sec:  Option<f64>,
}

/// `POST /internal/process-scheduled-campaigns[?max_campaigns=N&rate_per_sec=R]`
pub async fn process_scheduled<S, T>(
  State(state): State<AppState<S, T>>,
  Query(params): Query<ScheduleParams>,
  headers: HeaderMap,
) -> Result<Json<Value>, ApiError>
where
  S: CampaignStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  T: EmailTransport,
{
  let Some(expected) = state.config.cron_secret.as_deref() else {
    return Err(ApiError::Unavailable("cron secret not configured".into()));
  };
  let presented = headers
    .get("X-Cron-Secret")
    .and_then(|v| v.to_str().ok())
    .unwrap_or("");
  if presented != expected {
    return Err(ApiError::Unauthorized("bad cron secret".into()));
  }

  let max = params
    .max_campaigns
    .unwrap_or(DEFAULT_MAX_CAMPAIGNS)
    .clamp(MAX_CAMPAIGNS_RANGE.0, MAX_CAMPAIGNS_RANGE.1);
  let rate = params
    .rate_per_sec
    .unwrap_or(state.config.default_rate_per_sec)
    .clamp(RATE_RANGE.0, RATE_RANGE.1);

  let processed =
    scheduler::process_scheduled(state.store.as_ref(), state.transport.as_ref(), max, rate)
      .await?;

  Ok(Json(json!({ "processed": processed })))
}
