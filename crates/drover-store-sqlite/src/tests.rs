//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::Utc;
use drover_core::{
  campaign::{CampaignStatus, NewCampaign, NewTemplate, TargetRules},
  contact::NewContact,
  recipient::{EventType, NewEmailEvent, RecipientStatus},
  store::CampaignStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Contacts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_contact() {
  let s = store().await;
  let org = Uuid::new_v4();

  let contact = s
    .add_contact(NewContact::with_email(org, "ada@example.com"))
    .await
    .unwrap();

  let fetched = s.get_contact(contact.contact_id).await.unwrap().unwrap();
  assert_eq!(fetched.contact_id, contact.contact_id);
  assert_eq!(fetched.email.as_deref(), Some("ada@example.com"));
  assert!(fetched.is_active);
  assert!(fetched.deleted_at.is_none());
}

#[tokio::test]
async fn get_contact_missing_returns_none() {
  let s = store().await;
  assert!(s.get_contact(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_contactable_requires_email_and_no_soft_delete() {
  let s = store().await;
  let org = Uuid::new_v4();

  let with_email = s
    .add_contact(NewContact::with_email(org, "a@example.com"))
    .await
    .unwrap();

  let mut no_email = NewContact::with_email(org, "");
  no_email.email = None;
  s.add_contact(no_email).await.unwrap();

  let mut blank_email = NewContact::with_email(org, "   ");
  blank_email.email = Some("   ".into());
  s.add_contact(blank_email).await.unwrap();

  let deleted = s
    .add_contact(NewContact::with_email(org, "gone@example.com"))
    .await
    .unwrap();
  s.soft_delete_contact(deleted.contact_id, Utc::now())
    .await
    .unwrap();

  // A contact from another organization must not leak in.
  s.add_contact(NewContact::with_email(Uuid::new_v4(), "other@example.com"))
    .await
    .unwrap();

  let base = s.list_contactable(org).await.unwrap();
  assert_eq!(base.len(), 1);
  assert_eq!(base[0].contact_id, with_email.contact_id);
}

// ─── Tags ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tag_names_resolve_within_org_only() {
  let s = store().await;
  let org = Uuid::new_v4();
  let other_org = Uuid::new_v4();

  let vip = s.add_tag(org, "vip".into()).await.unwrap();
  s.add_tag(other_org, "vip".into()).await.unwrap();

  let ids = s
    .tag_ids_by_name(org, vec!["vip".into(), "missing".into()])
    .await
    .unwrap();
  assert_eq!(ids, vec![vip.tag_id]);

  let none = s.tag_ids_by_name(org, vec![]).await.unwrap();
  assert!(none.is_empty());
}

#[tokio::test]
async fn contacts_with_any_tag_is_a_union() {
  let s = store().await;
  let org = Uuid::new_v4();

  let a = s.add_contact(NewContact::with_email(org, "a@x.com")).await.unwrap();
  let b = s.add_contact(NewContact::with_email(org, "b@x.com")).await.unwrap();
  s.add_contact(NewContact::with_email(org, "c@x.com")).await.unwrap();

  let vip  = s.add_tag(org, "vip".into()).await.unwrap();
  let beta = s.add_tag(org, "beta".into()).await.unwrap();
  s.assign_tag(vip.tag_id, a.contact_id).await.unwrap();
  s.assign_tag(beta.tag_id, b.contact_id).await.unwrap();
  // Double assignment is a no-op.
  s.assign_tag(vip.tag_id, a.contact_id).await.unwrap();

  let mut ids = s
    .contacts_with_any_tag(vec![vip.tag_id, beta.tag_id])
    .await
    .unwrap();
  ids.sort();
  let mut expected = vec![a.contact_id, b.contact_id];
  expected.sort();
  assert_eq!(ids, expected);
}

// ─── Campaigns ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn campaign_is_scoped_to_organization() {
  let s = store().await;
  let org = Uuid::new_v4();

  let campaign = s.add_campaign(NewCampaign::draft(org, "launch")).await.unwrap();

  assert!(s.get_campaign(org, campaign.campaign_id).await.unwrap().is_some());
  assert!(
    s.get_campaign(Uuid::new_v4(), campaign.campaign_id)
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn claim_for_sending_succeeds_exactly_once() {
  let s = store().await;
  let org = Uuid::new_v4();
  let campaign = s.add_campaign(NewCampaign::draft(org, "launch")).await.unwrap();

  assert!(s.claim_for_sending(org, campaign.campaign_id).await.unwrap());
  // Second claim loses: the status is already `sending`.
  assert!(!s.claim_for_sending(org, campaign.campaign_id).await.unwrap());

  let fetched = s.get_campaign(org, campaign.campaign_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, CampaignStatus::Sending);
}

#[tokio::test]
async fn claim_rejects_non_sendable_statuses() {
  let s = store().await;
  let org = Uuid::new_v4();
  let campaign = s.add_campaign(NewCampaign::draft(org, "done")).await.unwrap();

  s.complete_campaign(org, campaign.campaign_id, CampaignStatus::Sent, Some(Utc::now()))
    .await
    .unwrap();

  assert!(!s.claim_for_sending(org, campaign.campaign_id).await.unwrap());
}

#[tokio::test]
async fn list_due_scheduled_honors_cutoff_and_bound() {
  let s = store().await;
  let org = Uuid::new_v4();
  let now = Utc::now();

  let mut due_a = NewCampaign::draft(org, "due-a");
  due_a.status = CampaignStatus::Scheduled;
  due_a.scheduled_at = Some(now - chrono::Duration::minutes(10));
  let due_a = s.add_campaign(due_a).await.unwrap();

  let mut due_b = NewCampaign::draft(org, "due-b");
  due_b.status = CampaignStatus::Scheduled;
  due_b.scheduled_at = Some(now - chrono::Duration::minutes(5));
  s.add_campaign(due_b).await.unwrap();

  let mut future = NewCampaign::draft(org, "future");
  future.status = CampaignStatus::Scheduled;
  future.scheduled_at = Some(now + chrono::Duration::hours(1));
  s.add_campaign(future).await.unwrap();

  // Draft campaigns with a past scheduled_at are not due.
  let mut draft = NewCampaign::draft(org, "draft");
  draft.scheduled_at = Some(now - chrono::Duration::hours(1));
  s.add_campaign(draft).await.unwrap();

  let due = s.list_due_scheduled(now, 10).await.unwrap();
  assert_eq!(due.len(), 2);
  // Oldest first.
  assert_eq!(due[0].campaign_id, due_a.campaign_id);

  let bounded = s.list_due_scheduled(now, 1).await.unwrap();
  assert_eq!(bounded.len(), 1);
}

// ─── Target rules ────────────────────────────────────────────────────────────

#[tokio::test]
async fn target_rules_created_lazily_with_defaults() {
  let s = store().await;
  let org = Uuid::new_v4();
  let campaign = s.add_campaign(NewCampaign::draft(org, "x")).await.unwrap();

  let rules = s.get_target_rules(org, campaign.campaign_id).await.unwrap();
  assert!(rules.exclude_unsubscribed);
  assert!(rules.exclude_inactive);
  assert!(!rules.exclude_bounced);
  assert!(rules.include_tags.is_empty());

  // The row now exists; a second read returns the same defaults.
  let again = s.get_target_rules(org, campaign.campaign_id).await.unwrap();
  assert_eq!(again.campaign_id, campaign.campaign_id);
}

#[tokio::test]
async fn upsert_target_rules_replaces_existing_row() {
  let s = store().await;
  let org = Uuid::new_v4();
  let campaign = s.add_campaign(NewCampaign::draft(org, "x")).await.unwrap();

  let mut rules = TargetRules::defaults(campaign.campaign_id, org);
  rules.include_tags = vec!["vip".into()];
  rules.exclude_countries = vec!["US".into()];
  rules.exclude_bounced = true;
  s.upsert_target_rules(rules).await.unwrap();

  let fetched = s.get_target_rules(org, campaign.campaign_id).await.unwrap();
  assert_eq!(fetched.include_tags, vec!["vip".to_string()]);
  assert_eq!(fetched.exclude_countries, vec!["US".to_string()]);
  assert!(fetched.exclude_bounced);

  let mut updated = fetched.clone();
  updated.include_tags = vec![];
  s.upsert_target_rules(updated).await.unwrap();
  let fetched = s.get_target_rules(org, campaign.campaign_id).await.unwrap();
  assert!(fetched.include_tags.is_empty());
}

// ─── Dispatch ledger ─────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_pending_insert_is_rejected_not_an_error() {
  let s = store().await;
  let org = Uuid::new_v4();
  let campaign = s.add_campaign(NewCampaign::draft(org, "x")).await.unwrap();
  let contact = s.add_contact(NewContact::with_email(org, "a@x.com")).await.unwrap();

  assert!(
    s.insert_pending_recipient(campaign.campaign_id, contact.contact_id, org)
      .await
      .unwrap()
  );
  assert!(
    !s.insert_pending_recipient(campaign.campaign_id, contact.contact_id, org)
      .await
      .unwrap()
  );

  let pending = s.list_pending_recipients(org, campaign.campaign_id).await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].status, RecipientStatus::Pending);
}

#[tokio::test]
async fn mark_sent_removes_from_pending() {
  let s = store().await;
  let org = Uuid::new_v4();
  let campaign = s.add_campaign(NewCampaign::draft(org, "x")).await.unwrap();
  let contact = s.add_contact(NewContact::with_email(org, "a@x.com")).await.unwrap();

  s.insert_pending_recipient(campaign.campaign_id, contact.contact_id, org)
    .await
    .unwrap();
  let row = s.list_pending_recipients(org, campaign.campaign_id).await.unwrap()
    .pop()
    .unwrap();

  s.mark_recipient_sent(row.recipient_id, Utc::now()).await.unwrap();

  assert!(s.list_pending_recipients(org, campaign.campaign_id).await.unwrap().is_empty());
  let fetched = s.get_recipient(row.recipient_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, RecipientStatus::Sent);
  assert!(fetched.sent_at.is_some());
}

#[tokio::test]
async fn opened_at_is_write_once() {
  let s = store().await;
  let org = Uuid::new_v4();
  let campaign = s.add_campaign(NewCampaign::draft(org, "x")).await.unwrap();
  let contact = s.add_contact(NewContact::with_email(org, "a@x.com")).await.unwrap();

  s.insert_pending_recipient(campaign.campaign_id, contact.contact_id, org)
    .await
    .unwrap();
  let row = s.list_pending_recipients(org, campaign.campaign_id).await.unwrap()
    .pop()
    .unwrap();
  s.mark_recipient_sent(row.recipient_id, Utc::now()).await.unwrap();

  let first  = Utc::now();
  let second = first + chrono::Duration::seconds(30);

  assert!(s.set_opened_if_unset(row.recipient_id, first).await.unwrap());
  assert!(!s.set_opened_if_unset(row.recipient_id, second).await.unwrap());

  let fetched = s.get_recipient(row.recipient_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, RecipientStatus::Opened);
  assert_eq!(
    fetched.opened_at.unwrap().timestamp_micros(),
    first.timestamp_micros()
  );
}

#[tokio::test]
async fn clicked_advances_status_from_sent_or_opened() {
  let s = store().await;
  let org = Uuid::new_v4();
  let campaign = s.add_campaign(NewCampaign::draft(org, "x")).await.unwrap();
  let contact = s.add_contact(NewContact::with_email(org, "a@x.com")).await.unwrap();

  s.insert_pending_recipient(campaign.campaign_id, contact.contact_id, org)
    .await
    .unwrap();
  let row = s.list_pending_recipients(org, campaign.campaign_id).await.unwrap()
    .pop()
    .unwrap();
  s.mark_recipient_sent(row.recipient_id, Utc::now()).await.unwrap();
  s.set_opened_if_unset(row.recipient_id, Utc::now()).await.unwrap();

  assert!(s.set_clicked_if_unset(row.recipient_id, Utc::now()).await.unwrap());
  assert!(!s.set_clicked_if_unset(row.recipient_id, Utc::now()).await.unwrap());

  let fetched = s.get_recipient(row.recipient_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, RecipientStatus::Clicked);
  assert!(fetched.opened_at.is_some());
}

#[tokio::test]
async fn bounced_contact_ids_span_the_organization() {
  let s = store().await;
  let org = Uuid::new_v4();
  let old_campaign = s.add_campaign(NewCampaign::draft(org, "old")).await.unwrap();
  let contact = s.add_contact(NewContact::with_email(org, "a@x.com")).await.unwrap();

  s.insert_pending_recipient(old_campaign.campaign_id, contact.contact_id, org)
    .await
    .unwrap();
  let row = s.list_pending_recipients(org, old_campaign.campaign_id).await.unwrap()
    .pop()
    .unwrap();
  s.mark_recipient_bounced(row.recipient_id, Utc::now()).await.unwrap();

  let bounced = s.bounced_contact_ids(org).await.unwrap();
  assert_eq!(bounced, vec![contact.contact_id]);
  assert!(s.bounced_contact_ids(Uuid::new_v4()).await.unwrap().is_empty());
}

// ─── Event log ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn events_append_in_order() {
  let s = store().await;
  let org = Uuid::new_v4();
  let campaign = s.add_campaign(NewCampaign::draft(org, "x")).await.unwrap();
  let contact = s.add_contact(NewContact::with_email(org, "a@x.com")).await.unwrap();

  s.insert_pending_recipient(campaign.campaign_id, contact.contact_id, org)
    .await
    .unwrap();
  let row = s.list_pending_recipients(org, campaign.campaign_id).await.unwrap()
    .pop()
    .unwrap();

  s.append_event(NewEmailEvent {
    campaign_id:     campaign.campaign_id,
    recipient_id:    row.recipient_id,
    organization_id: org,
    event_type:      EventType::Open,
    link_url:        None,
  })
  .await
  .unwrap();
  s.append_event(NewEmailEvent {
    campaign_id:     campaign.campaign_id,
    recipient_id:    row.recipient_id,
    organization_id: org,
    event_type:      EventType::Click,
    link_url:        Some("https://example.com/deal".into()),
  })
  .await
  .unwrap();

  let events = s.list_events_for_recipient(row.recipient_id).await.unwrap();
  assert_eq!(events.len(), 2);
  assert_eq!(events[0].event_type, EventType::Open);
  assert_eq!(events[1].event_type, EventType::Click);
  assert_eq!(events[1].link_url.as_deref(), Some("https://example.com/deal"));
}

// ─── Templates ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn template_round_trip() {
  let s = store().await;
  let org = Uuid::new_v4();

  let template = s
    .add_template(NewTemplate {
      organization_id: org,
      subject_line:    Some("Hello {{first_name}}".into()),
      content_html:    Some("<p>Hi {{first_name}}</p>".into()),
    })
    .await
    .unwrap();

  let fetched = s.get_template(template.template_id).await.unwrap().unwrap();
  assert_eq!(fetched.subject_line.as_deref(), Some("Hello {{first_name}}"));
  assert!(s.get_template(Uuid::new_v4()).await.unwrap().is_none());
}
