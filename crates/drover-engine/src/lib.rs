//! The campaign dispatch engine.
//!
//! Everything here is generic over the [`drover_core::store::CampaignStore`]
//! and [`drover_core::transport::EmailTransport`] collaborators; the engine
//! owns the pipeline between them:
//!
//! - [`resolver`] — turns a campaign's targeting rules into the eligible
//!   contact set.
//! - [`prepare`] — materializes the resolved set into pending ledger rows,
//!   idempotently.
//! - [`dispatch`] — claims a campaign, sends to every pending recipient
//!   under a rate throttle, and records the terminal status.
//! - [`engagement`] — records open/click events against signed tracking
//!   tokens, first event wins.
//! - [`scheduler`] — drains due scheduled campaigns through the dispatcher.

pub mod dispatch;
pub mod engagement;
mod error;
pub mod prepare;
pub mod render;
pub mod resolver;
pub mod scheduler;
pub mod throttle;

pub use self::error::{Error, Result};
