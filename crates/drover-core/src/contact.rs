//! Contacts and tags.
//!
//! A contact is dispatch-eligible only when its email is non-empty and it
//! carries no soft-delete marker. The resolver never sees raw contacts from
//! the outside; it emits normalized [`ContactSnapshot`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A stored contact record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
  pub contact_id:      Uuid,
  pub organization_id: Uuid,
  pub email:           Option<String>,
  pub mobile:          Option<String>,
  pub first_name:      Option<String>,
  pub last_name:       Option<String>,
  pub country:         Option<String>,
  pub is_active:       bool,
  pub is_subscribed:   bool,
  pub created_at:      DateTime<Utc>,
  /// Soft-delete marker; set means the contact is gone for all purposes.
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl Contact {
  /// Normalize to the flat, trimmed view used for targeting and rendering.
  ///
  /// Returns `None` when the trimmed email is empty — such contacts are
  /// never dispatch candidates.
  pub fn snapshot(&self) -> Option<ContactSnapshot> {
    let email = self.email.as_deref().unwrap_or("").trim();
    if email.is_empty() {
      return None;
    }
    Some(ContactSnapshot {
      contact_id: self.contact_id,
      email:      email.to_owned(),
      first_name: trimmed(self.first_name.as_deref()),
      last_name:  trimmed(self.last_name.as_deref()),
      country:    trimmed(self.country.as_deref()),
    })
  }
}

fn trimmed(value: Option<&str>) -> String {
  value.unwrap_or("").trim().to_owned()
}

/// Input to [`crate::store::CampaignStore::add_contact`].
/// `created_at` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewContact {
  pub organization_id: Uuid,
  pub email:           Option<String>,
  pub mobile:          Option<String>,
  pub first_name:      Option<String>,
  pub last_name:       Option<String>,
  pub country:         Option<String>,
  pub is_active:       bool,
  pub is_subscribed:   bool,
}

impl NewContact {
  /// Convenience constructor: an active, subscribed contact with an email.
  pub fn with_email(organization_id: Uuid, email: impl Into<String>) -> Self {
    Self {
      organization_id,
      email: Some(email.into()),
      mobile: None,
      first_name: None,
      last_name: None,
      country: None,
      is_active: true,
      is_subscribed: true,
    }
  }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The normalized contact view the resolver emits: every string trimmed,
/// email guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSnapshot {
  pub contact_id: Uuid,
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
  pub country:    String,
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// A named tag, unique per organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
  pub tag_id:          Uuid,
  pub organization_id: Uuid,
  pub name:            String,
}
