//! Error types for `rollcall-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("student not found: {0}")]
  StudentNotFound(Uuid),

  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("session not found: {0}")]
  SessionNotFound(Uuid),

  #[error("invalid date range: {0}")]
  InvalidDateRange(String),

  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap an arbitrary backend failure.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreUnavailable(Box::new(err))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::StudentNotFound(_) | Self::SubjectNotFound(_) | Self::SessionNotFound(_)
    )
  }

  /// Validation failures the caller should show to the user rather than
  /// treat as a system fault.
  pub fn is_user_facing(&self) -> bool {
    self.is_not_found() || matches!(self, Self::InvalidDateRange(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Convert an [`AttendanceStore`](crate::store::AttendanceStore) backend error
/// at a `map_err` call site.
pub(crate) fn lift<E: Into<Error>>(err: E) -> Error { err.into() }
