//! The `CampaignStore` trait — the contract with the record backend.
//!
//! The trait is implemented by storage backends (e.g. `drover-store-sqlite`).
//! Higher layers (`drover-engine`, `drover-api`) depend on this abstraction,
//! not on any concrete backend.
//!
//! Uniqueness violations surface as a rejected write (a `false` return),
//! never as an error that must propagate.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  campaign::{Campaign, CampaignStatus, NewCampaign, NewTemplate, TargetRules, Template},
  contact::{Contact, NewContact, Tag},
  recipient::{CampaignRecipient, EmailEvent, NewEmailEvent},
};

/// Abstraction over the campaign/contact record backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CampaignStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Contacts ──────────────────────────────────────────────────────────

  /// Create and persist a contact. `created_at` is set by the store.
  fn add_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Retrieve a contact by id. Returns `None` if not found.
  fn get_contact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Fetch contacts by id, in no particular order. Missing ids are skipped.
  fn contacts_by_ids(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// The resolver's base set: contacts of the organization with a non-empty
  /// email and no soft-delete marker.
  fn list_contactable(
    &self,
    organization_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// Set the soft-delete marker. Soft-deleted contacts never resolve.
  fn soft_delete_contact(
    &self,
    contact_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Tags ──────────────────────────────────────────────────────────────

  /// Create a tag. `(organization_id, name)` is unique.
  fn add_tag(
    &self,
    organization_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + '_;

  /// Assign a tag to a contact. Re-assignment is a no-op.
  fn assign_tag(
    &self,
    tag_id: Uuid,
    contact_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve tag names to ids within the organization. Unknown names are
  /// silently dropped.
  fn tag_ids_by_name(
    &self,
    organization_id: Uuid,
    names: Vec<String>,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  /// Contact ids carrying at least one of the given tags.
  fn contacts_with_any_tag(
    &self,
    tag_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  // ── Campaigns & templates ─────────────────────────────────────────────

  fn add_campaign(
    &self,
    input: NewCampaign,
  ) -> impl Future<Output = Result<Campaign, Self::Error>> + Send + '_;

  /// Retrieve a campaign scoped to its organization.
  fn get_campaign(
    &self,
    organization_id: Uuid,
    campaign_id: Uuid,
  ) -> impl Future<Output = Result<Option<Campaign>, Self::Error>> + Send + '_;

  /// Atomically claim a campaign for sending: set status to `sending` only
  /// if the current status is still `draft` or `scheduled`. Returns whether
  /// the claim landed — `false` means another caller got there first or the
  /// campaign is not sendable.
  fn claim_for_sending(
    &self,
    organization_id: Uuid,
    campaign_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Record the terminal status of a dispatch run and stamp `sent_at`.
  fn complete_campaign(
    &self,
    organization_id: Uuid,
    campaign_id: Uuid,
    status: CampaignStatus,
    sent_at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Campaigns with status `scheduled` and `scheduled_at <= now`, oldest
  /// first, at most `max` of them.
  fn list_due_scheduled(
    &self,
    now: DateTime<Utc>,
    max: usize,
  ) -> impl Future<Output = Result<Vec<Campaign>, Self::Error>> + Send + '_;

  fn add_template(
    &self,
    input: NewTemplate,
  ) -> impl Future<Output = Result<Template, Self::Error>> + Send + '_;

  fn get_template(
    &self,
    template_id: Uuid,
  ) -> impl Future<Output = Result<Option<Template>, Self::Error>> + Send + '_;

  // ── Target rules ──────────────────────────────────────────────────────

  /// Read the campaign's rules, creating the default row on first access.
  fn get_target_rules(
    &self,
    organization_id: Uuid,
    campaign_id: Uuid,
  ) -> impl Future<Output = Result<TargetRules, Self::Error>> + Send + '_;

  /// Create or replace the campaign's rules. One row per campaign.
  fn upsert_target_rules(
    &self,
    rules: TargetRules,
  ) -> impl Future<Output = Result<TargetRules, Self::Error>> + Send + '_;

  // ── Dispatch ledger ───────────────────────────────────────────────────

  /// Insert a `pending` ledger row. Returns `false` when a row for this
  /// `(campaign_id, contact_id)` pair already exists — the conflict is the
  /// idempotence mechanism, not an error.
  fn insert_pending_recipient(
    &self,
    campaign_id: Uuid,
    contact_id: Uuid,
    organization_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Pending rows for a campaign, in ledger (insertion) order.
  fn list_pending_recipients(
    &self,
    organization_id: Uuid,
    campaign_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CampaignRecipient>, Self::Error>> + Send + '_;

  fn get_recipient(
    &self,
    recipient_id: Uuid,
  ) -> impl Future<Output = Result<Option<CampaignRecipient>, Self::Error>> + Send + '_;

  /// Advance a row `pending → sent` and stamp `sent_at`.
  fn mark_recipient_sent(
    &self,
    recipient_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Set `opened_at` only if currently unset; advances status `sent →
  /// opened`. Returns whether the write landed (first event wins).
  fn set_opened_if_unset(
    &self,
    recipient_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Set `clicked_at` only if currently unset; advances status `sent |
  /// opened → clicked`. Returns whether the write landed.
  fn set_clicked_if_unset(
    &self,
    recipient_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Advance a row to `bounced` and stamp `bounced_at`. Written by the
  /// delivery-receipt boundary, read by the resolver's bounce rule.
  fn mark_recipient_bounced(
    &self,
    recipient_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Contact ids with any `bounced` ledger row anywhere in the organization
  /// (not scoped to one campaign).
  fn bounced_contact_ids(
    &self,
    organization_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  // ── Event log ─────────────────────────────────────────────────────────

  /// Append an engagement event. `recorded_at` is set by the store.
  fn append_event(
    &self,
    input: NewEmailEvent,
  ) -> impl Future<Output = Result<EmailEvent, Self::Error>> + Send + '_;

  /// All events logged for one recipient, oldest first.
  fn list_events_for_recipient(
    &self,
    recipient_id: Uuid,
  ) -> impl Future<Output = Result<Vec<EmailEvent>, Self::Error>> + Send + '_;
}
