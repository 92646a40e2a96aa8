//! Handlers for campaign preparation and dispatch.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/organizations/:org/campaigns/:id/prepare` | Idempotent |
//! | `POST` | `/organizations/:org/campaigns/:id/send` | `?dry_run&rate_per_sec` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use drover_core::{store::CampaignStore, transport::EmailTransport};
use drover_engine::{
  dispatch::{self, SendOptions, SendOutcome},
  prepare::prepare_recipients,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Prepare ──────────────────────────────────────────────────────────────────

/// `POST /organizations/:org/campaigns/:id/prepare`
pub async fn prepare<S, T>(
  State(state): State<AppState<S, T>>,
  Path((org, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError>
where
  S: CampaignStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  T: EmailTransport,
{
  if state
    .store
    .get_campaign(org, id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .is_none()
  {
    return Err(ApiError::NotFound(format!("campaign {id} not found")));
  }

  let count = prepare_recipients(state.store.as_ref(), org, id).await?;
  Ok(Json(json!({ "recipients_count": count })))
}

// ─── Send ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendParams {
  #[serde(default)]
  pub dry_run:      bool,
  pub rate_per_sec: Option<f64>,
}

/// `POST /organizations/:org/campaigns/:id/send[?dry_run=true&rate_per_sec=N]`
pub async fn send<S, T>(
  State(state): State<AppState<S, T>>,
  Path((org, id)): Path<(Uuid, Uuid)>,
  Query(params): Query<SendParams>,
) -> Result<Json<Value>, ApiError>
where
  S: CampaignStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  T: EmailTransport,
{
  let opts = SendOptions {
    campaign_id:     id,
    organization_id: org,
    rate_per_sec:    params
      .rate_per_sec
      .unwrap_or(state.config.default_rate_per_sec),
    dry_run:         params.dry_run,
  };

  let outcome = dispatch::send_campaign(state.store.as_ref(), state.transport.as_ref(), &opts)
    .await?;

  // Zero-effect outcomes are ordinary 200 responses with a message body;
  // only a missing campaign is a 404.
  let body = match outcome {
    SendOutcome::NotFound => {
      return Err(ApiError::NotFound(format!("campaign {id} not found")));
    }
    SendOutcome::NotSendable => json!({ "message": "campaign is not sendable" }),
    SendOutcome::NoTemplate => json!({ "message": "campaign has no template" }),
    SendOutcome::NoRecipients => json!({ "message": "campaign has no recipients" }),
    SendOutcome::DryRun { prepared } => json!({ "dry_run": true, "prepared": prepared }),
    SendOutcome::Completed(summary) => json!({
      "sent":   summary.sent,
      "failed": summary.failed,
      "errors": summary.errors,
    }),
  };

  Ok(Json(body))
}
