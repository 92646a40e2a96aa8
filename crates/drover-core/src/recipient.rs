//! The dispatch ledger and the engagement event log.
//!
//! A recipient row is the durable per-(campaign, contact) record. At most
//! one row exists per pair — enforced by a uniqueness constraint in the
//! store, not by a pre-check. `opened_at` and `clicked_at` are write-once:
//! the first event wins and is the only one logged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Recipient status ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientStatus {
  Pending,
  Sent,
  Delivered,
  Bounced,
  Opened,
  Clicked,
}

impl RecipientStatus {
  /// The canonical lowercase discriminant, as stored and serialized.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Sent => "sent",
      Self::Delivered => "delivered",
      Self::Bounced => "bounced",
      Self::Opened => "opened",
      Self::Clicked => "clicked",
    }
  }
}

impl std::str::FromStr for RecipientStatus {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(Self::Pending),
      "sent" => Ok(Self::Sent),
      "delivered" => Ok(Self::Delivered),
      "bounced" => Ok(Self::Bounced),
      "opened" => Ok(Self::Opened),
      "clicked" => Ok(Self::Clicked),
      other => Err(crate::Error::UnknownStatus(other.to_owned())),
    }
  }
}

// ─── Ledger row ──────────────────────────────────────────────────────────────

/// One dispatch ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRecipient {
  pub recipient_id:    Uuid,
  pub campaign_id:     Uuid,
  pub contact_id:      Uuid,
  pub organization_id: Uuid,
  pub status:          RecipientStatus,
  pub sent_at:         Option<DateTime<Utc>>,
  pub bounced_at:      Option<DateTime<Utc>>,
  pub opened_at:       Option<DateTime<Utc>>,
  pub clicked_at:      Option<DateTime<Utc>>,
  pub created_at:      DateTime<Utc>,
}

// ─── Event log ───────────────────────────────────────────────────────────────

/// The kind of engagement event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
  Open,
  Click,
}

impl EventType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Open => "open",
      Self::Click => "click",
    }
  }
}

impl std::str::FromStr for EventType {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "open" => Ok(Self::Open),
      "click" => Ok(Self::Click),
      other => Err(crate::Error::UnknownStatus(other.to_owned())),
    }
  }
}

/// An append-only engagement log entry. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailEvent {
  pub event_id:        Uuid,
  pub campaign_id:     Uuid,
  pub recipient_id:    Uuid,
  pub organization_id: Uuid,
  pub event_type:      EventType,
  pub link_url:        Option<String>,
  pub recorded_at:     DateTime<Utc>,
}

/// Input to [`crate::store::CampaignStore::append_event`].
/// `recorded_at` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewEmailEvent {
  pub campaign_id:     Uuid,
  pub recipient_id:    Uuid,
  pub organization_id: Uuid,
  pub event_type:      EventType,
  pub link_url:        Option<String>,
}
