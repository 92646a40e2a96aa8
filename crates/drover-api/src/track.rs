//! Public engagement tracking endpoints.
//!
//! These are hit from inside email clients, so they must *always* succeed
//! from the caller's point of view: the open endpoint returns the pixel and
//! the click endpoint redirects no matter what the token looks like. Failed
//! recordings are logged and swallowed.

use axum::{
  extract::{Query, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use drover_core::{store::CampaignStore, token::TokenCodec, transport::EmailTransport};
use drover_engine::engagement;
use serde::Deserialize;

use crate::AppState;

/// A 1×1 transparent GIF.
const PIXEL: [u8; 43] = [
  0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00,
  0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x01, 0x00,
  0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00,
  0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3B,
];

#[derive(Debug, Deserialize)]
pub struct TrackParams {
  /// The signed recipient token.
  pub r:   Option<String>,
  /// Click destination.
  pub url: Option<String>,
}

/// `GET /track/open?r=<token>` — always 200 with the pixel.
pub async fn open<S, T>(
  State(state): State<AppState<S, T>>,
  Query(params): Query<TrackParams>,
) -> Response
where
  S: CampaignStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  T: EmailTransport,
{
  if let Some(token) = params.r.as_deref() {
    let codec = TokenCodec::new(state.config.tracking_secret.clone());
    if let Err(e) = engagement::record_open(state.store.as_ref(), &codec, token).await {
      tracing::warn!(error = %e, "failed to record open");
    }
  }

  (
    StatusCode::OK,
    [
      (header::CONTENT_TYPE, "image/gif"),
      (header::CACHE_CONTROL, "no-store, max-age=0"),
    ],
    PIXEL.to_vec(),
  )
    .into_response()
}

/// `GET /track/click?r=<token>&url=<dest>` — always 302, defaulting to `/`.
pub async fn click<S, T>(
  State(state): State<AppState<S, T>>,
  Query(params): Query<TrackParams>,
) -> Response
where
  S: CampaignStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  T: EmailTransport,
{
  // The logged event carries the same destination the caller is sent to.
  let destination = params.url.unwrap_or_else(|| "/".to_owned());
  if let Some(token) = params.r.as_deref() {
    let codec = TokenCodec::new(state.config.tracking_secret.clone());
    if let Err(e) =
      engagement::record_click(state.store.as_ref(), &codec, token, Some(destination.clone()))
        .await
    {
      tracing::warn!(error = %e, "failed to record click");
    }
  }

  (StatusCode::FOUND, [(header::LOCATION, destination)]).into_response()
}
