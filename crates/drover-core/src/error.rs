//! Error types for `drover-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("tracking secret is not configured")]
  MissingTrackingSecret,

  #[error("unknown status discriminant: {0:?}")]
  UnknownStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
