//! Target resolution: turning a campaign's rules into the eligible contact
//! set.
//!
//! The base set is every contactable contact of the organization (non-empty
//! email, not soft-deleted). Each rule is a predicate applied in sequence —
//! the result is the intersection of all active rules. Tag rules match
//! any-of; country exclusion compares trimmed, case-insensitively; bounce
//! exclusion looks at the whole organization's ledger, not one campaign.

use std::collections::HashSet;

use drover_core::{
  campaign::TargetRules,
  contact::{Contact, ContactSnapshot},
  store::CampaignStore,
};
use uuid::Uuid;

use crate::{Error, Result};

/// Resolve the recipients of a campaign. Returns an empty vec when the
/// campaign does not exist in the organization.
pub async fn resolve_recipients<S: CampaignStore>(
  store: &S,
  organization_id: Uuid,
  campaign_id: Uuid,
) -> Result<Vec<ContactSnapshot>> {
  if store
    .get_campaign(organization_id, campaign_id)
    .await
    .map_err(Error::store)?
    .is_none()
  {
    return Ok(Vec::new());
  }

  let rules = store
    .get_target_rules(organization_id, campaign_id)
    .await
    .map_err(Error::store)?;

  let contacts = store
    .list_contactable(organization_id)
    .await
    .map_err(Error::store)?;

  apply_rules(store, organization_id, &rules, contacts).await
}

async fn apply_rules<S: CampaignStore>(
  store: &S,
  organization_id: Uuid,
  rules: &TargetRules,
  mut contacts: Vec<Contact>,
) -> Result<Vec<ContactSnapshot>> {
  if rules.exclude_unsubscribed {
    contacts.retain(|c| c.is_subscribed);
  }
  if rules.exclude_inactive {
    contacts.retain(|c| c.is_active);
  }

  if !rules.include_tags.is_empty() {
    let included = tagged_contact_ids(store, organization_id, &rules.include_tags).await?;
    // Include-tags that resolve to nothing select nothing.
    match included {
      Some(ids) => contacts.retain(|c| ids.contains(&c.contact_id)),
      None => return Ok(Vec::new()),
    }
  }

  if !rules.exclude_tags.is_empty() {
    if let Some(excluded) = tagged_contact_ids(store, organization_id, &rules.exclude_tags).await? {
      contacts.retain(|c| !excluded.contains(&c.contact_id));
    }
  }

  if !rules.exclude_countries.is_empty() {
    let blocked: HashSet<String> = rules
      .exclude_countries
      .iter()
      .map(|c| c.trim().to_lowercase())
      .collect();
    contacts.retain(|c| !country_excluded(c.country.as_deref(), &blocked));
  }

  if rules.exclude_bounced {
    let bounced: HashSet<Uuid> = store
      .bounced_contact_ids(organization_id)
      .await
      .map_err(Error::store)?
      .into_iter()
      .collect();
    contacts.retain(|c| !bounced.contains(&c.contact_id));
  }

  Ok(snapshots_deduped(contacts))
}

/// Contact ids carrying any of the named tags, or `None` when no name
/// resolves to a tag in this organization.
async fn tagged_contact_ids<S: CampaignStore>(
  store: &S,
  organization_id: Uuid,
  names: &[String],
) -> Result<Option<HashSet<Uuid>>> {
  let tag_ids = store
    .tag_ids_by_name(organization_id, names.to_vec())
    .await
    .map_err(Error::store)?;
  if tag_ids.is_empty() {
    return Ok(None);
  }
  let ids = store
    .contacts_with_any_tag(tag_ids)
    .await
    .map_err(Error::store)?;
  Ok(Some(ids.into_iter().collect()))
}

fn country_excluded(country: Option<&str>, blocked: &HashSet<String>) -> bool {
  match country {
    Some(c) => blocked.contains(&c.trim().to_lowercase()),
    None => false,
  }
}

/// Normalize to snapshots, keeping first occurrence per contact id.
fn snapshots_deduped(contacts: Vec<Contact>) -> Vec<ContactSnapshot> {
  let mut seen = HashSet::new();
  contacts
    .iter()
    .filter_map(Contact::snapshot)
    .filter(|s| seen.insert(s.contact_id))
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use drover_core::{campaign::NewCampaign, contact::NewContact};
  use drover_store_sqlite::SqliteStore;

  use super::*;

  async fn store() -> SqliteStore {
    SqliteStore::open_in_memory().await.expect("in-memory store")
  }

  struct Fixture {
    store:    SqliteStore,
    org:      Uuid,
    campaign: Uuid,
  }

  async fn fixture() -> Fixture {
    let store = store().await;
    let org = Uuid::new_v4();
    let campaign = store
      .add_campaign(NewCampaign::draft(org, "launch"))
      .await
      .unwrap()
      .campaign_id;
    Fixture { store, org, campaign }
  }

  impl Fixture {
    async fn contact(&self, email: &str) -> Contact {
      self
        .store
        .add_contact(NewContact::with_email(self.org, email))
        .await
        .unwrap()
    }

    async fn set_rules(&self, f: impl FnOnce(&mut TargetRules)) {
      let mut rules = self
        .store
        .get_target_rules(self.org, self.campaign)
        .await
        .unwrap();
      f(&mut rules);
      self.store.upsert_target_rules(rules).await.unwrap();
    }

    async fn resolve(&self) -> Vec<ContactSnapshot> {
      resolve_recipients(&self.store, self.org, self.campaign)
        .await
        .unwrap()
    }
  }

  #[tokio::test]
  async fn missing_campaign_resolves_to_nothing() {
    let fx = fixture().await;
    fx.contact("a@x.com").await;
    let got = resolve_recipients(&fx.store, fx.org, Uuid::new_v4())
      .await
      .unwrap();
    assert!(got.is_empty());
  }

  #[tokio::test]
  async fn default_rules_keep_subscribed_active_contacts() {
    let fx = fixture().await;
    let keep = fx.contact("keep@x.com").await;

    let mut unsubscribed = NewContact::with_email(fx.org, "unsub@x.com");
    unsubscribed.is_subscribed = false;
    fx.store.add_contact(unsubscribed).await.unwrap();

    let mut inactive = NewContact::with_email(fx.org, "inactive@x.com");
    inactive.is_active = false;
    fx.store.add_contact(inactive).await.unwrap();

    let got = fx.resolve().await;
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].contact_id, keep.contact_id);
  }

  #[tokio::test]
  async fn disabled_exclusions_keep_everyone() {
    let fx = fixture().await;
    fx.contact("a@x.com").await;
    let mut unsubscribed = NewContact::with_email(fx.org, "unsub@x.com");
    unsubscribed.is_subscribed = false;
    fx.store.add_contact(unsubscribed).await.unwrap();

    fx.set_rules(|r| {
      r.exclude_unsubscribed = false;
      r.exclude_inactive = false;
    })
    .await;

    assert_eq!(fx.resolve().await.len(), 2);
  }

  #[tokio::test]
  async fn include_tags_match_any_of() {
    let fx = fixture().await;
    let a = fx.contact("a@x.com").await;
    let b = fx.contact("b@x.com").await;
    fx.contact("c@x.com").await;

    let vip  = fx.store.add_tag(fx.org, "vip".into()).await.unwrap();
    let beta = fx.store.add_tag(fx.org, "beta".into()).await.unwrap();
    fx.store.assign_tag(vip.tag_id, a.contact_id).await.unwrap();
    fx.store.assign_tag(beta.tag_id, b.contact_id).await.unwrap();

    fx.set_rules(|r| r.include_tags = vec!["vip".into(), "beta".into()])
      .await;

    let mut got: Vec<Uuid> = fx.resolve().await.iter().map(|s| s.contact_id).collect();
    got.sort();
    let mut expected = vec![a.contact_id, b.contact_id];
    expected.sort();
    assert_eq!(got, expected);
  }

  #[tokio::test]
  async fn unknown_include_tags_select_nothing() {
    let fx = fixture().await;
    fx.contact("a@x.com").await;
    fx.set_rules(|r| r.include_tags = vec!["no-such-tag".into()])
      .await;
    assert!(fx.resolve().await.is_empty());
  }

  #[tokio::test]
  async fn exclude_tags_drop_tagged_contacts() {
    let fx = fixture().await;
    let keep = fx.contact("keep@x.com").await;
    let drop = fx.contact("drop@x.com").await;

    let blocked = fx.store.add_tag(fx.org, "blocked".into()).await.unwrap();
    fx.store
      .assign_tag(blocked.tag_id, drop.contact_id)
      .await
      .unwrap();

    fx.set_rules(|r| r.exclude_tags = vec!["blocked".into()]).await;

    let got = fx.resolve().await;
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].contact_id, keep.contact_id);
  }

  #[tokio::test]
  async fn country_exclusion_is_case_insensitive() {
    let fx = fixture().await;
    let mut us = NewContact::with_email(fx.org, "us@x.com");
    us.country = Some(" United States ".into());
    fx.store.add_contact(us).await.unwrap();

    let mut uk = NewContact::with_email(fx.org, "uk@x.com");
    uk.country = Some("UK".into());
    let uk = fx.store.add_contact(uk).await.unwrap();

    fx.set_rules(|r| r.exclude_countries = vec!["united states".into()])
      .await;

    let got = fx.resolve().await;
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].contact_id, uk.contact_id);
  }

  #[tokio::test]
  async fn bounce_exclusion_spans_other_campaigns() {
    let fx = fixture().await;
    let clean   = fx.contact("clean@x.com").await;
    let bounced = fx.contact("bounced@x.com").await;

    // The bounce lives on an older campaign's ledger.
    let old = fx
      .store
      .add_campaign(NewCampaign::draft(fx.org, "old"))
      .await
      .unwrap();
    fx.store
      .insert_pending_recipient(old.campaign_id, bounced.contact_id, fx.org)
      .await
      .unwrap();
    let row = fx
      .store
      .list_pending_recipients(fx.org, old.campaign_id)
      .await
      .unwrap()
      .pop()
      .unwrap();
    fx.store
      .mark_recipient_bounced(row.recipient_id, Utc::now())
      .await
      .unwrap();

    // Off by default.
    assert_eq!(fx.resolve().await.len(), 2);

    fx.set_rules(|r| r.exclude_bounced = true).await;
    let got = fx.resolve().await;
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].contact_id, clean.contact_id);
  }
}
