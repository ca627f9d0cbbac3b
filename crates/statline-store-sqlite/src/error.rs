//! Error type for `statline-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] statline_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl Error {
  /// Whether the database rejected a write for breaking a UNIQUE, CHECK or
  /// foreign-key constraint.
  ///
  /// Inserting a status before an entity's first one, or losing a race with
  /// a concurrent writer for the same entity, surfaces this way.
  pub fn is_constraint_violation(&self) -> bool {
    let sqlite = match self {
      Error::Sqlite(e) => e,
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => e,
      _ => return false,
    };
    sqlite.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
  }

  /// The engine error carried by this value, if any.
  pub fn core(&self) -> Option<&statline_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
