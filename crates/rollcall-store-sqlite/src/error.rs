//! Error type for `rollcall-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] rollcall_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("course not found: {0}")]
  CourseNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Not-found conditions keep their core variant; everything else means the
/// database could not answer.
impl From<Error> for rollcall_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(e) => e,
      other => rollcall_core::Error::store(other),
    }
  }
}
