//! Recipient preparation: materializing the resolved set into the dispatch
//! ledger.
//!
//! Safe to call any number of times — the ledger's uniqueness constraint
//! absorbs duplicates, so re-preparation only adds rows for contacts that
//! became eligible since the last run.

use drover_core::store::CampaignStore;
use uuid::Uuid;

use crate::{Error, Result, resolver};

/// Resolve the campaign's recipients and insert one pending ledger row per
/// candidate. Returns the resolved-set size (not the newly-inserted count).
pub async fn prepare_recipients<S: CampaignStore>(
  store: &S,
  organization_id: Uuid,
  campaign_id: Uuid,
) -> Result<usize> {
  let snapshots = resolver::resolve_recipients(store, organization_id, campaign_id).await?;

  let mut inserted = 0usize;
  for snapshot in &snapshots {
    let landed = store
      .insert_pending_recipient(campaign_id, snapshot.contact_id, organization_id)
      .await
      .map_err(Error::store)?;
    if landed {
      inserted += 1;
    }
  }

  tracing::debug!(
    %campaign_id,
    resolved = snapshots.len(),
    inserted,
    "prepared campaign recipients"
  );

  Ok(snapshots.len())
}
