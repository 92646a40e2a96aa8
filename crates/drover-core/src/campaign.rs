//! Campaigns, templates, and targeting rules.
//!
//! A campaign's status is a monotone state machine: `draft | scheduled →
//! sending → sent | failed`. `paused` is reachable only from `draft` or
//! `scheduled` by a direct external update; the dispatcher never sets it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// The lifecycle state of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
  Draft,
  Scheduled,
  Sending,
  Sent,
  Failed,
  Paused,
}

impl CampaignStatus {
  /// Dispatch may only begin from `draft` or `scheduled`.
  pub fn is_sendable(self) -> bool {
    matches!(self, Self::Draft | Self::Scheduled)
  }

  /// The canonical lowercase discriminant, as stored and serialized.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Draft => "draft",
      Self::Scheduled => "scheduled",
      Self::Sending => "sending",
      Self::Sent => "sent",
      Self::Failed => "failed",
      Self::Paused => "paused",
    }
  }
}

impl std::str::FromStr for CampaignStatus {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "draft" => Ok(Self::Draft),
      "scheduled" => Ok(Self::Scheduled),
      "sending" => Ok(Self::Sending),
      "sent" => Ok(Self::Sent),
      "failed" => Ok(Self::Failed),
      "paused" => Ok(Self::Paused),
      other => Err(crate::Error::UnknownStatus(other.to_owned())),
    }
  }
}

// ─── Campaign ────────────────────────────────────────────────────────────────

/// An email campaign owned by one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
  pub campaign_id:     Uuid,
  pub organization_id: Uuid,
  pub name:            String,
  pub template_id:     Option<Uuid>,
  /// Overrides the template's subject line when set.
  pub subject_line:    Option<String>,
  pub status:          CampaignStatus,
  pub scheduled_at:    Option<DateTime<Utc>>,
  pub sent_at:         Option<DateTime<Utc>>,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::CampaignStore::add_campaign`].
/// `created_at` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewCampaign {
  pub organization_id: Uuid,
  pub name:            String,
  pub template_id:     Option<Uuid>,
  pub subject_line:    Option<String>,
  pub status:          CampaignStatus,
  pub scheduled_at:    Option<DateTime<Utc>>,
}

impl NewCampaign {
  /// Convenience constructor for a draft campaign.
  pub fn draft(organization_id: Uuid, name: impl Into<String>) -> Self {
    Self {
      organization_id,
      name: name.into(),
      template_id: None,
      subject_line: None,
      status: CampaignStatus::Draft,
      scheduled_at: None,
    }
  }
}

// ─── Template ────────────────────────────────────────────────────────────────

/// A reusable email body. The dispatcher substitutes `{{field}}`
/// placeholders at send time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
  pub template_id:     Uuid,
  pub organization_id: Uuid,
  pub subject_line:    Option<String>,
  pub content_html:    Option<String>,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::CampaignStore::add_template`].
#[derive(Debug, Clone)]
pub struct NewTemplate {
  pub organization_id: Uuid,
  pub subject_line:    Option<String>,
  pub content_html:    Option<String>,
}

// ─── Target rules ────────────────────────────────────────────────────────────

/// Declarative predicate configuration, one row per campaign.
///
/// Created lazily with defaults the first time it is read. Tag fields hold
/// tag *names*; the resolver maps them to ids within the organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRules {
  pub campaign_id:          Uuid,
  pub organization_id:      Uuid,
  /// Keep only contacts carrying any of these tags (logical OR).
  pub include_tags:         Vec<String>,
  /// Drop contacts carrying any of these tags.
  pub exclude_tags:         Vec<String>,
  /// Case-insensitive country names to drop.
  pub exclude_countries:    Vec<String>,
  pub exclude_unsubscribed: bool,
  pub exclude_inactive:     bool,
  pub exclude_bounced:      bool,
}

impl TargetRules {
  /// The defaults used when rules are created lazily on first read.
  pub fn defaults(campaign_id: Uuid, organization_id: Uuid) -> Self {
    Self {
      campaign_id,
      organization_id,
      include_tags: Vec::new(),
      exclude_tags: Vec::new(),
      exclude_countries: Vec::new(),
      exclude_unsubscribed: true,
      exclude_inactive: true,
      exclude_bounced: false,
    }
  }
}
