//! [`SqliteStore`] — the SQLite implementation of [`CampaignStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use drover_core::{
  campaign::{Campaign, CampaignStatus, NewCampaign, NewTemplate, TargetRules, Template},
  contact::{Contact, NewContact, Tag},
  recipient::{CampaignRecipient, EmailEvent, NewEmailEvent, RecipientStatus},
  store::CampaignStore,
};

use crate::{
  encode::{
    RawCampaign, RawContact, RawEvent, RawRecipient, RawTargetRules, RawTemplate,
    encode_dt, encode_string_list, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Drover campaign store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// `"?1,?2,…,?n"` for dynamically-sized IN lists.
fn placeholders(n: usize) -> String {
  (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(",")
}

const CONTACT_COLS: &str =
  "contact_id, organization_id, email, mobile, first_name, last_name, country,
   is_active, is_subscribed, created_at, deleted_at";

fn read_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawContact> {
  Ok(RawContact {
    contact_id:      row.get(0)?,
    organization_id: row.get(1)?,
    email:           row.get(2)?,
    mobile:          row.get(3)?,
    first_name:      row.get(4)?,
    last_name:       row.get(5)?,
    country:         row.get(6)?,
    is_active:       row.get(7)?,
    is_subscribed:   row.get(8)?,
    created_at:      row.get(9)?,
    deleted_at:      row.get(10)?,
  })
}

const CAMPAIGN_COLS: &str =
  "campaign_id, organization_id, name, template_id, subject_line, status,
   scheduled_at, sent_at, created_at";

fn read_campaign(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCampaign> {
  Ok(RawCampaign {
    campaign_id:     row.get(0)?,
    organization_id: row.get(1)?,
    name:            row.get(2)?,
    template_id:     row.get(3)?,
    subject_line:    row.get(4)?,
    status:          row.get(5)?,
    scheduled_at:    row.get(6)?,
    sent_at:         row.get(7)?,
    created_at:      row.get(8)?,
  })
}

const RECIPIENT_COLS: &str =
  "recipient_id, campaign_id, contact_id, organization_id, status,
   sent_at, bounced_at, opened_at, clicked_at, created_at";

fn read_recipient(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecipient> {
  Ok(RawRecipient {
    recipient_id:    row.get(0)?,
    campaign_id:     row.get(1)?,
    contact_id:      row.get(2)?,
    organization_id: row.get(3)?,
    status:          row.get(4)?,
    sent_at:         row.get(5)?,
    bounced_at:      row.get(6)?,
    opened_at:       row.get(7)?,
    clicked_at:      row.get(8)?,
    created_at:      row.get(9)?,
  })
}

// ─── CampaignStore impl ──────────────────────────────────────────────────────

impl CampaignStore for SqliteStore {
  type Error = Error;

  // ── Contacts ────────────────────────────────────────────────────────────

  async fn add_contact(&self, input: NewContact) -> Result<Contact> {
    let contact = Contact {
      contact_id:      Uuid::new_v4(),
      organization_id: input.organization_id,
      email:           input.email,
      mobile:          input.mobile,
      first_name:      input.first_name,
      last_name:       input.last_name,
      country:         input.country,
      is_active:       input.is_active,
      is_subscribed:   input.is_subscribed,
      created_at:      Utc::now(),
      deleted_at:      None,
    };

    let id_str  = encode_uuid(contact.contact_id);
    let org_str = encode_uuid(contact.organization_id);
    let at_str  = encode_dt(contact.created_at);
    let c       = contact.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contacts (
             contact_id, organization_id, email, mobile, first_name,
             last_name, country, is_active, is_subscribed, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            org_str,
            c.email,
            c.mobile,
            c.first_name,
            c.last_name,
            c.country,
            c.is_active,
            c.is_subscribed,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(contact)
  }

  async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CONTACT_COLS} FROM contacts WHERE contact_id = ?1"),
            rusqlite::params![id_str],
            read_contact,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn contacts_by_ids(&self, ids: Vec<Uuid>) -> Result<Vec<Contact>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let id_strs: Vec<String> = ids.into_iter().map(encode_uuid).collect();

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CONTACT_COLS} FROM contacts WHERE contact_id IN ({})",
          placeholders(id_strs.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(id_strs.iter()), read_contact)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn list_contactable(&self, organization_id: Uuid) -> Result<Vec<Contact>> {
    let org_str = encode_uuid(organization_id);

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CONTACT_COLS} FROM contacts
           WHERE organization_id = ?1
             AND email IS NOT NULL AND TRIM(email) != ''
             AND deleted_at IS NULL
           ORDER BY rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![org_str], read_contact)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn soft_delete_contact(&self, contact_id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str = encode_uuid(contact_id);
    let at_str = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE contacts SET deleted_at = ?1 WHERE contact_id = ?2",
          rusqlite::params![at_str, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Tags ────────────────────────────────────────────────────────────────

  async fn add_tag(&self, organization_id: Uuid, name: String) -> Result<Tag> {
    let tag = Tag {
      tag_id: Uuid::new_v4(),
      organization_id,
      name,
    };

    let id_str  = encode_uuid(tag.tag_id);
    let org_str = encode_uuid(organization_id);
    let name    = tag.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tags (tag_id, organization_id, name) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, org_str, name],
        )?;
        Ok(())
      })
      .await?;

    Ok(tag)
  }

  async fn assign_tag(&self, tag_id: Uuid, contact_id: Uuid) -> Result<()> {
    let tag_str     = encode_uuid(tag_id);
    let contact_str = encode_uuid(contact_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO tag_assignments (tag_id, contact_id) VALUES (?1, ?2)",
          rusqlite::params![tag_str, contact_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn tag_ids_by_name(
    &self,
    organization_id: Uuid,
    names: Vec<String>,
  ) -> Result<Vec<Uuid>> {
    if names.is_empty() {
      return Ok(Vec::new());
    }
    let org_str = encode_uuid(organization_id);

    let id_strs: Vec<String> = self
      .conn
      .call(move |conn| {
        // ?1 is the organization; names start at ?2.
        let name_slots = (2..=names.len() + 1)
          .map(|i| format!("?{i}"))
          .collect::<Vec<_>>()
          .join(",");
        let sql = format!(
          "SELECT tag_id FROM tags WHERE organization_id = ?1 AND name IN ({name_slots})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::ToSql> = std::iter::once(&org_str as &dyn rusqlite::ToSql)
          .chain(names.iter().map(|n| n as &dyn rusqlite::ToSql))
          .collect();
        let rows = stmt
          .query_map(params.as_slice(), |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    id_strs.iter().map(|s| crate::encode::decode_uuid(s)).collect()
  }

  async fn contacts_with_any_tag(&self, tag_ids: Vec<Uuid>) -> Result<Vec<Uuid>> {
    if tag_ids.is_empty() {
      return Ok(Vec::new());
    }
    let id_strs: Vec<String> = tag_ids.into_iter().map(encode_uuid).collect();

    let contact_strs: Vec<String> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT DISTINCT contact_id FROM tag_assignments WHERE tag_id IN ({})",
          placeholders(id_strs.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(id_strs.iter()), |row| {
            row.get::<_, String>(0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    contact_strs.iter().map(|s| crate::encode::decode_uuid(s)).collect()
  }

  // ── Campaigns & templates ───────────────────────────────────────────────

  async fn add_campaign(&self, input: NewCampaign) -> Result<Campaign> {
    let campaign = Campaign {
      campaign_id:     Uuid::new_v4(),
      organization_id: input.organization_id,
      name:            input.name,
      template_id:     input.template_id,
      subject_line:    input.subject_line,
      status:          input.status,
      scheduled_at:    input.scheduled_at,
      sent_at:         None,
      created_at:      Utc::now(),
    };

    let id_str       = encode_uuid(campaign.campaign_id);
    let org_str      = encode_uuid(campaign.organization_id);
    let name         = campaign.name.clone();
    let template_str = campaign.template_id.map(encode_uuid);
    let subject      = campaign.subject_line.clone();
    let status_str   = campaign.status.as_str().to_owned();
    let sched_str    = campaign.scheduled_at.map(encode_dt);
    let at_str       = encode_dt(campaign.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO campaigns (
             campaign_id, organization_id, name, template_id, subject_line,
             status, scheduled_at, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, org_str, name, template_str, subject, status_str, sched_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(campaign)
  }

  async fn get_campaign(
    &self,
    organization_id: Uuid,
    campaign_id: Uuid,
  ) -> Result<Option<Campaign>> {
    let org_str = encode_uuid(organization_id);
    let id_str  = encode_uuid(campaign_id);

    let raw: Option<RawCampaign> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {CAMPAIGN_COLS} FROM campaigns
               WHERE campaign_id = ?1 AND organization_id = ?2"
            ),
            rusqlite::params![id_str, org_str],
            read_campaign,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCampaign::into_campaign).transpose()
  }

  async fn claim_for_sending(
    &self,
    organization_id: Uuid,
    campaign_id: Uuid,
  ) -> Result<bool> {
    let org_str = encode_uuid(organization_id);
    let id_str  = encode_uuid(campaign_id);

    // Single conditional UPDATE: the claim lands for exactly one caller.
    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE campaigns SET status = 'sending'
           WHERE campaign_id = ?1 AND organization_id = ?2
             AND status IN ('draft', 'scheduled')",
          rusqlite::params![id_str, org_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn complete_campaign(
    &self,
    organization_id: Uuid,
    campaign_id: Uuid,
    status: CampaignStatus,
    sent_at: Option<DateTime<Utc>>,
  ) -> Result<()> {
    let org_str    = encode_uuid(organization_id);
    let id_str     = encode_uuid(campaign_id);
    let status_str = status.as_str().to_owned();
    let at_str     = sent_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE campaigns SET status = ?1, sent_at = ?2
           WHERE campaign_id = ?3 AND organization_id = ?4",
          rusqlite::params![status_str, at_str, id_str, org_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_due_scheduled(
    &self,
    now: DateTime<Utc>,
    max: usize,
  ) -> Result<Vec<Campaign>> {
    let now_str = encode_dt(now);
    let max_val = max as i64;

    let raws: Vec<RawCampaign> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CAMPAIGN_COLS} FROM campaigns
           WHERE status = 'scheduled'
             AND scheduled_at IS NOT NULL AND scheduled_at <= ?1
           ORDER BY scheduled_at
           LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![now_str, max_val], read_campaign)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCampaign::into_campaign).collect()
  }

  async fn add_template(&self, input: NewTemplate) -> Result<Template> {
    let template = Template {
      template_id:     Uuid::new_v4(),
      organization_id: input.organization_id,
      subject_line:    input.subject_line,
      content_html:    input.content_html,
      created_at:      Utc::now(),
    };

    let id_str  = encode_uuid(template.template_id);
    let org_str = encode_uuid(template.organization_id);
    let subject = template.subject_line.clone();
    let html    = template.content_html.clone();
    let at_str  = encode_dt(template.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO templates (template_id, organization_id, subject_line, content_html, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, org_str, subject, html, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(template)
  }

  async fn get_template(&self, template_id: Uuid) -> Result<Option<Template>> {
    let id_str = encode_uuid(template_id);

    let raw: Option<RawTemplate> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT template_id, organization_id, subject_line, content_html, created_at
             FROM templates WHERE template_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawTemplate {
                template_id:     row.get(0)?,
                organization_id: row.get(1)?,
                subject_line:    row.get(2)?,
                content_html:    row.get(3)?,
                created_at:      row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawTemplate::into_template).transpose()
  }

  // ── Target rules ────────────────────────────────────────────────────────

  async fn get_target_rules(
    &self,
    organization_id: Uuid,
    campaign_id: Uuid,
  ) -> Result<TargetRules> {
    let org_str  = encode_uuid(organization_id);
    let camp_str = encode_uuid(campaign_id);

    let raw: RawTargetRules = self
      .conn
      .call(move |conn| {
        let select = "SELECT campaign_id, organization_id, include_tags, exclude_tags,
                             exclude_countries, exclude_unsubscribed, exclude_inactive,
                             exclude_bounced
                      FROM target_rules
                      WHERE campaign_id = ?1 AND organization_id = ?2";
        let read = |row: &rusqlite::Row<'_>| -> rusqlite::Result<RawTargetRules> {
          Ok(RawTargetRules {
            campaign_id:          row.get(0)?,
            organization_id:      row.get(1)?,
            include_tags:         row.get(2)?,
            exclude_tags:         row.get(3)?,
            exclude_countries:    row.get(4)?,
            exclude_unsubscribed: row.get(5)?,
            exclude_inactive:     row.get(6)?,
            exclude_bounced:      row.get(7)?,
          })
        };

        if let Some(raw) = conn
          .query_row(select, rusqlite::params![camp_str, org_str], read)
          .optional()?
        {
          return Ok(raw);
        }

        // Lazy default creation; OR IGNORE tolerates a concurrent creator.
        conn.execute(
          "INSERT OR IGNORE INTO target_rules (campaign_id, organization_id)
           VALUES (?1, ?2)",
          rusqlite::params![camp_str, org_str],
        )?;

        Ok(conn.query_row(select, rusqlite::params![camp_str, org_str], read)?)
      })
      .await?;

    raw.into_rules()
  }

  async fn upsert_target_rules(&self, rules: TargetRules) -> Result<TargetRules> {
    let camp_str    = encode_uuid(rules.campaign_id);
    let org_str     = encode_uuid(rules.organization_id);
    let include     = encode_string_list(&rules.include_tags)?;
    let exclude     = encode_string_list(&rules.exclude_tags)?;
    let countries   = encode_string_list(&rules.exclude_countries)?;
    let unsub       = rules.exclude_unsubscribed;
    let inactive    = rules.exclude_inactive;
    let bounced     = rules.exclude_bounced;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO target_rules (
             campaign_id, organization_id, include_tags, exclude_tags,
             exclude_countries, exclude_unsubscribed, exclude_inactive, exclude_bounced
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT (campaign_id) DO UPDATE SET
             include_tags         = excluded.include_tags,
             exclude_tags         = excluded.exclude_tags,
             exclude_countries    = excluded.exclude_countries,
             exclude_unsubscribed = excluded.exclude_unsubscribed,
             exclude_inactive     = excluded.exclude_inactive,
             exclude_bounced      = excluded.exclude_bounced",
          rusqlite::params![camp_str, org_str, include, exclude, countries, unsub, inactive, bounced],
        )?;
        Ok(())
      })
      .await?;

    Ok(rules)
  }

  // ── Dispatch ledger ─────────────────────────────────────────────────────

  async fn insert_pending_recipient(
    &self,
    campaign_id: Uuid,
    contact_id: Uuid,
    organization_id: Uuid,
  ) -> Result<bool> {
    let id_str      = encode_uuid(Uuid::new_v4());
    let camp_str    = encode_uuid(campaign_id);
    let contact_str = encode_uuid(contact_id);
    let org_str     = encode_uuid(organization_id);
    let at_str      = encode_dt(Utc::now());

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO campaign_recipients (
             recipient_id, campaign_id, contact_id, organization_id, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
          rusqlite::params![id_str, camp_str, contact_str, org_str, at_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn list_pending_recipients(
    &self,
    organization_id: Uuid,
    campaign_id: Uuid,
  ) -> Result<Vec<CampaignRecipient>> {
    let org_str  = encode_uuid(organization_id);
    let camp_str = encode_uuid(campaign_id);

    let raws: Vec<RawRecipient> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {RECIPIENT_COLS} FROM campaign_recipients
           WHERE campaign_id = ?1 AND organization_id = ?2 AND status = 'pending'
           ORDER BY rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![camp_str, org_str], read_recipient)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecipient::into_recipient).collect()
  }

  async fn get_recipient(&self, recipient_id: Uuid) -> Result<Option<CampaignRecipient>> {
    let id_str = encode_uuid(recipient_id);

    let raw: Option<RawRecipient> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {RECIPIENT_COLS} FROM campaign_recipients WHERE recipient_id = ?1"
            ),
            rusqlite::params![id_str],
            read_recipient,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRecipient::into_recipient).transpose()
  }

  async fn mark_recipient_sent(&self, recipient_id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str     = encode_uuid(recipient_id);
    let at_str     = encode_dt(at);
    let status_str = RecipientStatus::Sent.as_str().to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE campaign_recipients SET status = ?1, sent_at = ?2 WHERE recipient_id = ?3",
          rusqlite::params![status_str, at_str, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_opened_if_unset(&self, recipient_id: Uuid, at: DateTime<Utc>) -> Result<bool> {
    let id_str = encode_uuid(recipient_id);
    let at_str = encode_dt(at);

    // Storage-level set-if-null: the write lands for the first event only.
    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE campaign_recipients
           SET opened_at = ?1,
               status = CASE WHEN status = 'sent' THEN 'opened' ELSE status END
           WHERE recipient_id = ?2 AND opened_at IS NULL",
          rusqlite::params![at_str, id_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn set_clicked_if_unset(&self, recipient_id: Uuid, at: DateTime<Utc>) -> Result<bool> {
    let id_str = encode_uuid(recipient_id);
    let at_str = encode_dt(at);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE campaign_recipients
           SET clicked_at = ?1,
               status = CASE WHEN status IN ('sent', 'opened') THEN 'clicked' ELSE status END
           WHERE recipient_id = ?2 AND clicked_at IS NULL",
          rusqlite::params![at_str, id_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn mark_recipient_bounced(&self, recipient_id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str     = encode_uuid(recipient_id);
    let at_str     = encode_dt(at);
    let status_str = RecipientStatus::Bounced.as_str().to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE campaign_recipients SET status = ?1, bounced_at = ?2 WHERE recipient_id = ?3",
          rusqlite::params![status_str, at_str, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn bounced_contact_ids(&self, organization_id: Uuid) -> Result<Vec<Uuid>> {
    let org_str = encode_uuid(organization_id);

    let id_strs: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT contact_id FROM campaign_recipients
           WHERE organization_id = ?1 AND status = 'bounced'",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![org_str], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    id_strs.iter().map(|s| crate::encode::decode_uuid(s)).collect()
  }

  // ── Event log ───────────────────────────────────────────────────────────

  async fn append_event(&self, input: NewEmailEvent) -> Result<EmailEvent> {
    let event = EmailEvent {
      event_id:        Uuid::new_v4(),
      campaign_id:     input.campaign_id,
      recipient_id:    input.recipient_id,
      organization_id: input.organization_id,
      event_type:      input.event_type,
      link_url:        input.link_url,
      recorded_at:     Utc::now(),
    };

    let id_str   = encode_uuid(event.event_id);
    let camp_str = encode_uuid(event.campaign_id);
    let rcpt_str = encode_uuid(event.recipient_id);
    let org_str  = encode_uuid(event.organization_id);
    let type_str = event.event_type.as_str().to_owned();
    let link     = event.link_url.clone();
    let at_str   = encode_dt(event.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO email_events (
             event_id, campaign_id, recipient_id, organization_id,
             event_type, link_url, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, camp_str, rcpt_str, org_str, type_str, link, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  async fn list_events_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<EmailEvent>> {
    let id_str = encode_uuid(recipient_id);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, campaign_id, recipient_id, organization_id,
                  event_type, link_url, recorded_at
           FROM email_events WHERE recipient_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawEvent {
              event_id:        row.get(0)?,
              campaign_id:     row.get(1)?,
              recipient_id:    row.get(2)?,
              organization_id: row.get(3)?,
              event_type:      row.get(4)?,
              link_url:        row.get(5)?,
              recorded_at:     row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }
}
