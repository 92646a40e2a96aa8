use drover_core::transport::TransportError;
use thiserror::Error;

/// Engine-level failures. Per-recipient send failures are *not* errors —
/// the dispatcher tallies them into its summary instead.
#[derive(Debug, Error)]
pub enum Error {
  /// A store operation failed. The concrete backend error is boxed so the
  /// engine stays generic over `CampaignStore::Error`.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The transport is unusable for the whole batch (missing credentials).
  #[error(transparent)]
  Transport(#[from] TransportError),
}

impl Error {
  pub(crate) fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
