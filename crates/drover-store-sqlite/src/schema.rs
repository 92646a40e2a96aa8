//! SQL schema for the Drover SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS contacts (
    contact_id      TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    email           TEXT,
    mobile          TEXT,
    first_name      TEXT,
    last_name       TEXT,
    country         TEXT,
    is_active       INTEGER NOT NULL DEFAULT 1,
    is_subscribed   INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL,
    deleted_at      TEXT             -- soft-delete marker
);

CREATE TABLE IF NOT EXISTS tags (
    tag_id          TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    name            TEXT NOT NULL,
    UNIQUE (organization_id, name)
);

CREATE TABLE IF NOT EXISTS tag_assignments (
    tag_id     TEXT NOT NULL REFERENCES tags(tag_id),
    contact_id TEXT NOT NULL REFERENCES contacts(contact_id),
    PRIMARY KEY (tag_id, contact_id)
);

CREATE TABLE IF NOT EXISTS templates (
    template_id     TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    subject_line    TEXT,
    content_html    TEXT,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS campaigns (
    campaign_id     TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    name            TEXT NOT NULL,
    template_id     TEXT REFERENCES templates(template_id),
    subject_line    TEXT,
    status          TEXT NOT NULL DEFAULT 'draft',
    scheduled_at    TEXT,
    sent_at         TEXT,
    created_at      TEXT NOT NULL
);

-- One row per campaign; created lazily with defaults on first read.
CREATE TABLE IF NOT EXISTS target_rules (
    campaign_id          TEXT PRIMARY KEY REFERENCES campaigns(campaign_id),
    organization_id      TEXT NOT NULL,
    include_tags         TEXT NOT NULL DEFAULT '[]',  -- JSON array of tag names
    exclude_tags         TEXT NOT NULL DEFAULT '[]',
    exclude_countries    TEXT NOT NULL DEFAULT '[]',
    exclude_unsubscribed INTEGER NOT NULL DEFAULT 1,
    exclude_inactive     INTEGER NOT NULL DEFAULT 1,
    exclude_bounced      INTEGER NOT NULL DEFAULT 0
);

-- The dispatch ledger. The UNIQUE constraint is the idempotence source of
-- truth for recipient preparation; inserts use OR IGNORE.
CREATE TABLE IF NOT EXISTS campaign_recipients (
    recipient_id    TEXT PRIMARY KEY,
    campaign_id     TEXT NOT NULL REFERENCES campaigns(campaign_id),
    contact_id      TEXT NOT NULL REFERENCES contacts(contact_id),
    organization_id TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'pending',
    sent_at         TEXT,
    bounced_at      TEXT,
    opened_at       TEXT,            -- write-once; set-if-null updates only
    clicked_at      TEXT,            -- write-once; set-if-null updates only
    created_at      TEXT NOT NULL,
    UNIQUE (campaign_id, contact_id)
);

-- Engagement events are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS email_events (
    event_id        TEXT PRIMARY KEY,
    campaign_id     TEXT NOT NULL REFERENCES campaigns(campaign_id),
    recipient_id    TEXT NOT NULL REFERENCES campaign_recipients(recipient_id),
    organization_id TEXT NOT NULL,
    event_type      TEXT NOT NULL,   -- 'open' | 'click'
    link_url        TEXT,
    recorded_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS contacts_org_idx        ON contacts(organization_id);
CREATE INDEX IF NOT EXISTS campaigns_status_idx    ON campaigns(status, scheduled_at);
CREATE INDEX IF NOT EXISTS recipients_campaign_idx ON campaign_recipients(campaign_id, status);
CREATE INDEX IF NOT EXISTS recipients_org_idx      ON campaign_recipients(organization_id, status);
CREATE INDEX IF NOT EXISTS events_recipient_idx    ON email_events(recipient_id);

PRAGMA user_version = 1;
";
