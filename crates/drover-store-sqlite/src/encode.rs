//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. String sets (tag names,
//! countries) are stored as compact JSON arrays. UUIDs are stored as
//! hyphenated lowercase strings. Booleans are INTEGER 0/1.

use chrono::{DateTime, Utc};
use drover_core::{
  campaign::{Campaign, TargetRules, Template},
  contact::Contact,
  recipient::{CampaignRecipient, EmailEvent},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

// ─── String sets ─────────────────────────────────────────────────────────────

pub fn encode_string_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_string_list(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `contacts` row.
pub struct RawContact {
  pub contact_id:      String,
  pub organization_id: String,
  pub email:           Option<String>,
  pub mobile:          Option<String>,
  pub first_name:      Option<String>,
  pub last_name:       Option<String>,
  pub country:         Option<String>,
  pub is_active:       bool,
  pub is_subscribed:   bool,
  pub created_at:      String,
  pub deleted_at:      Option<String>,
}

impl RawContact {
  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      contact_id:      decode_uuid(&self.contact_id)?,
      organization_id: decode_uuid(&self.organization_id)?,
      email:           self.email,
      mobile:          self.mobile,
      first_name:      self.first_name,
      last_name:       self.last_name,
      country:         self.country,
      is_active:       self.is_active,
      is_subscribed:   self.is_subscribed,
      created_at:      decode_dt(&self.created_at)?,
      deleted_at:      decode_opt_dt(self.deleted_at.as_deref())?,
    })
  }
}

/// Raw strings read directly from a `campaigns` row.
pub struct RawCampaign {
  pub campaign_id:     String,
  pub organization_id: String,
  pub name:            String,
  pub template_id:     Option<String>,
  pub subject_line:    Option<String>,
  pub status:          String,
  pub scheduled_at:    Option<String>,
  pub sent_at:         Option<String>,
  pub created_at:      String,
}

impl RawCampaign {
  pub fn into_campaign(self) -> Result<Campaign> {
    Ok(Campaign {
      campaign_id:     decode_uuid(&self.campaign_id)?,
      organization_id: decode_uuid(&self.organization_id)?,
      name:            self.name,
      template_id:     self.template_id.as_deref().map(decode_uuid).transpose()?,
      subject_line:    self.subject_line,
      status:          self.status.parse()?,
      scheduled_at:    decode_opt_dt(self.scheduled_at.as_deref())?,
      sent_at:         decode_opt_dt(self.sent_at.as_deref())?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `templates` row.
pub struct RawTemplate {
  pub template_id:     String,
  pub organization_id: String,
  pub subject_line:    Option<String>,
  pub content_html:    Option<String>,
  pub created_at:      String,
}

impl RawTemplate {
  pub fn into_template(self) -> Result<Template> {
    Ok(Template {
      template_id:     decode_uuid(&self.template_id)?,
      organization_id: decode_uuid(&self.organization_id)?,
      subject_line:    self.subject_line,
      content_html:    self.content_html,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `target_rules` row.
pub struct RawTargetRules {
  pub campaign_id:          String,
  pub organization_id:      String,
  pub include_tags:         String,
  pub exclude_tags:         String,
  pub exclude_countries:    String,
  pub exclude_unsubscribed: bool,
  pub exclude_inactive:     bool,
  pub exclude_bounced:      bool,
}

impl RawTargetRules {
  pub fn into_rules(self) -> Result<TargetRules> {
    Ok(TargetRules {
      campaign_id:          decode_uuid(&self.campaign_id)?,
      organization_id:      decode_uuid(&self.organization_id)?,
      include_tags:         decode_string_list(&self.include_tags)?,
      exclude_tags:         decode_string_list(&self.exclude_tags)?,
      exclude_countries:    decode_string_list(&self.exclude_countries)?,
      exclude_unsubscribed: self.exclude_unsubscribed,
      exclude_inactive:     self.exclude_inactive,
      exclude_bounced:      self.exclude_bounced,
    })
  }
}

/// Raw strings read directly from a `campaign_recipients` row.
pub struct RawRecipient {
  pub recipient_id:    String,
  pub campaign_id:     String,
  pub contact_id:      String,
  pub organization_id: String,
  pub status:          String,
  pub sent_at:         Option<String>,
  pub bounced_at:      Option<String>,
  pub opened_at:       Option<String>,
  pub clicked_at:      Option<String>,
  pub created_at:      String,
}

impl RawRecipient {
  pub fn into_recipient(self) -> Result<CampaignRecipient> {
    Ok(CampaignRecipient {
      recipient_id:    decode_uuid(&self.recipient_id)?,
      campaign_id:     decode_uuid(&self.campaign_id)?,
      contact_id:      decode_uuid(&self.contact_id)?,
      organization_id: decode_uuid(&self.organization_id)?,
      status:          self.status.parse()?,
      sent_at:         decode_opt_dt(self.sent_at.as_deref())?,
      bounced_at:      decode_opt_dt(self.bounced_at.as_deref())?,
      opened_at:       decode_opt_dt(self.opened_at.as_deref())?,
      clicked_at:      decode_opt_dt(self.clicked_at.as_deref())?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `email_events` row.
pub struct RawEvent {
  pub event_id:        String,
  pub campaign_id:     String,
  pub recipient_id:    String,
  pub organization_id: String,
  pub event_type:      String,
  pub link_url:        Option<String>,
  pub recorded_at:     String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<EmailEvent> {
    Ok(EmailEvent {
      event_id:        decode_uuid(&self.event_id)?,
      campaign_id:     decode_uuid(&self.campaign_id)?,
      recipient_id:    decode_uuid(&self.recipient_id)?,
      organization_id: decode_uuid(&self.organization_id)?,
      event_type:      self.event_type.parse()?,
      link_url:        self.link_url,
      recorded_at:     decode_dt(&self.recorded_at)?,
    })
  }
}
