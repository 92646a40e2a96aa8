//! Engagement recording: opens and clicks arriving on public tracking URLs.
//!
//! Tokens are verified before anything touches the store; anything invalid
//! is silently dropped (`false`) because tracking endpoints respond the same
//! way regardless. The first event of each kind wins: the timestamp is a
//! storage-level set-if-null write, and the event row is appended only when
//! that write lands.

use chrono::Utc;
use drover_core::{
  recipient::{EventType, NewEmailEvent},
  store::CampaignStore,
  token::TokenCodec,
};
use uuid::Uuid;

use crate::{Error, Result};

/// Record an email-open. Returns whether this was the first open.
pub async fn record_open<S: CampaignStore>(
  store: &S,
  codec: &TokenCodec,
  token: &str,
) -> Result<bool> {
  record(store, codec, token, EventType::Open, None).await
}

/// Record a link click. Returns whether this was the first click.
pub async fn record_click<S: CampaignStore>(
  store: &S,
  codec: &TokenCodec,
  token: &str,
  link_url: Option<String>,
) -> Result<bool> {
  record(store, codec, token, EventType::Click, link_url).await
}

async fn record<S: CampaignStore>(
  store: &S,
  codec: &TokenCodec,
  token: &str,
  event_type: EventType,
  link_url: Option<String>,
) -> Result<bool> {
  let Some(id) = codec.verify(token) else {
    return Ok(false);
  };
  let Ok(recipient_id) = Uuid::parse_str(&id) else {
    return Ok(false);
  };
  let Some(recipient) = store
    .get_recipient(recipient_id)
    .await
    .map_err(Error::store)?
  else {
    return Ok(false);
  };

  let now = Utc::now();
  let landed = match event_type {
    EventType::Open => store
      .set_opened_if_unset(recipient_id, now)
      .await
      .map_err(Error::store)?,
    EventType::Click => store
      .set_clicked_if_unset(recipient_id, now)
      .await
      .map_err(Error::store)?,
  };

  if landed {
    store
      .append_event(NewEmailEvent {
        campaign_id: recipient.campaign_id,
        recipient_id,
        organization_id: recipient.organization_id,
        event_type,
        link_url,
      })
      .await
      .map_err(Error::store)?;
    tracing::debug!(%recipient_id, ?event_type, "engagement recorded");
  }

  Ok(landed)
}
