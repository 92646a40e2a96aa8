//! Scheduled campaign polling.
//!
//! Invoked periodically by an external trigger (the internal cron endpoint).
//! Picks up campaigns whose `scheduled_at` has passed and dispatches them
//! one at a time. The count returned is the number of dispatch invocations,
//! whatever their outcome — a campaign that resolves to `NoRecipients` was
//! still processed.

use chrono::Utc;
use drover_core::{store::CampaignStore, transport::EmailTransport};

use crate::{
  Error, Result,
  dispatch::{self, SendOptions},
};

/// Dispatch every due scheduled campaign, oldest first, at most `max` of
/// them. Returns how many were dispatched.
pub async fn process_scheduled<S, T>(
  store: &S,
  transport: &T,
  max: usize,
  rate_per_sec: f64,
) -> Result<usize>
where
  S: CampaignStore,
  T: EmailTransport,
{
  let due = store
    .list_due_scheduled(Utc::now(), max)
    .await
    .map_err(Error::store)?;

  let mut processed = 0usize;
  for campaign in due {
    let opts = SendOptions {
      campaign_id:     campaign.campaign_id,
      organization_id: campaign.organization_id,
      rate_per_sec,
      dry_run:         false,
    };
    let outcome = dispatch::send_campaign(store, transport, &opts).await?;
    tracing::info!(
      campaign_id = %campaign.campaign_id,
      ?outcome,
      "processed scheduled campaign"
    );
    processed += 1;
  }

  Ok(processed)
}
