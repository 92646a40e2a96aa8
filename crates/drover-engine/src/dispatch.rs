//! Batch dispatch: claim a campaign, send to every pending recipient, and
//! record the terminal status.
//!
//! The pending-row check happens *before* the atomic claim so that a call
//! against a campaign with no recipients never moves it into `sending`.
//! Once claimed, the loop is single-writer: concurrent callers lose the
//! claim and get `NotSendable`.

use std::collections::HashMap;

use chrono::Utc;
use drover_core::{
  campaign::{Campaign, CampaignStatus, Template},
  contact::Contact,
  store::CampaignStore,
  transport::{EmailTransport, TransportError},
};
use uuid::Uuid;

use crate::{
  Error, Result, prepare, render,
  throttle::{FixedDelay, Throttle},
};

/// Error reasons are clipped so one verbose SMTP response cannot bloat the
/// summary.
const MAX_REASON_CHARS: usize = 200;
/// At most this many per-recipient errors are reported back.
const MAX_ERRORS: usize = 100;

/// Parameters of one dispatch run.
#[derive(Debug, Clone)]
pub struct SendOptions {
  pub campaign_id:     Uuid,
  pub organization_id: Uuid,
  /// Sends per second; non-positive disables throttling.
  pub rate_per_sec:    f64,
  /// Prepare the ledger but send nothing.
  pub dry_run:         bool,
}

/// Counters for a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendSummary {
  pub sent:   usize,
  pub failed: usize,
  pub errors: Vec<String>,
}

/// Every way a dispatch call can end without a hard error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
  /// No such campaign in this organization.
  NotFound,
  /// The campaign is not in a sendable status, or another caller holds the
  /// claim.
  NotSendable,
  /// The campaign has no template reference, or the referenced template row
  /// is gone.
  NoTemplate,
  /// Nothing to send even after re-preparation.
  NoRecipients,
  /// Dry run: the ledger was prepared, nothing was sent.
  DryRun { prepared: usize },
  Completed(SendSummary),
}

/// Dispatch a campaign with the standard fixed-delay throttle.
pub async fn send_campaign<S, T>(
  store: &S,
  transport: &T,
  opts: &SendOptions,
) -> Result<SendOutcome>
where
  S: CampaignStore,
  T: EmailTransport,
{
  let throttle = FixedDelay::per_second(opts.rate_per_sec);
  send_campaign_with(store, transport, &throttle, opts).await
}

/// Dispatch with an explicit throttle implementation.
pub async fn send_campaign_with<S, T, P>(
  store: &S,
  transport: &T,
  throttle: &P,
  opts: &SendOptions,
) -> Result<SendOutcome>
where
  S: CampaignStore,
  T: EmailTransport,
  P: Throttle,
{
  let Some(campaign) = store
    .get_campaign(opts.organization_id, opts.campaign_id)
    .await
    .map_err(Error::store)?
  else {
    return Ok(SendOutcome::NotFound);
  };

  if opts.dry_run {
    let prepared =
      prepare::prepare_recipients(store, opts.organization_id, opts.campaign_id).await?;
    tracing::info!(campaign_id = %opts.campaign_id, prepared, "dry run");
    return Ok(SendOutcome::DryRun { prepared });
  }

  if !campaign.status.is_sendable() {
    return Ok(SendOutcome::NotSendable);
  }

  let Some(template) = load_template(store, &campaign).await? else {
    return Ok(SendOutcome::NoTemplate);
  };

  // Self-heal: a send without a prior explicit prepare still works.
  let mut pending = store
    .list_pending_recipients(opts.organization_id, opts.campaign_id)
    .await
    .map_err(Error::store)?;
  if pending.is_empty() {
    prepare::prepare_recipients(store, opts.organization_id, opts.campaign_id).await?;
    pending = store
      .list_pending_recipients(opts.organization_id, opts.campaign_id)
      .await
      .map_err(Error::store)?;
  }
  if pending.is_empty() {
    return Ok(SendOutcome::NoRecipients);
  }

  // Atomic claim; a lost race means someone else is already sending.
  if !store
    .claim_for_sending(opts.organization_id, opts.campaign_id)
    .await
    .map_err(Error::store)?
  {
    return Ok(SendOutcome::NotSendable);
  }

  // One batch read for the whole loop.
  let contacts: HashMap<Uuid, Contact> = store
    .contacts_by_ids(pending.iter().map(|r| r.contact_id).collect())
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|c| (c.contact_id, c))
    .collect();

  let mut summary = SendSummary { sent: 0, failed: 0, errors: Vec::new() };

  for (i, row) in pending.iter().enumerate() {
    if i > 0 {
      throttle.pause().await;
    }

    let Some(snapshot) = contacts.get(&row.contact_id).and_then(Contact::snapshot) else {
      record_failure(&mut summary, &row.contact_id.to_string(), "contact or email missing");
      continue;
    };

    let subject = render::render_placeholders(&render::resolve_subject(&campaign, &template), &snapshot);
    let body    = render::render_placeholders(&render::resolve_body(&template), &snapshot);

    match transport.send(&snapshot.email, &subject, &body).await {
      Ok(delivery_id) => {
        store
          .mark_recipient_sent(row.recipient_id, Utc::now())
          .await
          .map_err(Error::store)?;
        summary.sent += 1;
        tracing::debug!(recipient_id = %row.recipient_id, %delivery_id, "sent");
      }
      Err(err @ TransportError::NotConfigured(_)) => {
        // The whole batch is doomed; don't leave the campaign wedged in
        // `sending`.
        store
          .complete_campaign(opts.organization_id, opts.campaign_id, CampaignStatus::Failed, None)
          .await
          .map_err(Error::store)?;
        return Err(err.into());
      }
      Err(TransportError::Send(reason)) => {
        record_failure(&mut summary, &snapshot.email, &reason);
      }
    }
  }

  let attempted = pending.len();
  let status = if summary.sent == 0 && attempted > 0 {
    CampaignStatus::Failed
  } else {
    CampaignStatus::Sent
  };
  store
    .complete_campaign(opts.organization_id, opts.campaign_id, status, Some(Utc::now()))
    .await
    .map_err(Error::store)?;

  tracing::info!(
    campaign_id = %opts.campaign_id,
    sent = summary.sent,
    failed = summary.failed,
    status = ?status,
    "campaign dispatch finished"
  );

  Ok(SendOutcome::Completed(summary))
}

async fn load_template<S: CampaignStore>(
  store: &S,
  campaign: &Campaign,
) -> Result<Option<Template>> {
  let Some(template_id) = campaign.template_id else {
    return Ok(None);
  };
  store.get_template(template_id).await.map_err(Error::store)
}

fn record_failure(summary: &mut SendSummary, who: &str, reason: &str) {
  summary.failed += 1;
  if summary.errors.len() < MAX_ERRORS {
    let clipped: String = reason.chars().take(MAX_REASON_CHARS).collect();
    summary.errors.push(format!("{who}: {clipped}"));
  }
}
