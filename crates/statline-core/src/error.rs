//! Error types for `statline-core`.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// A domain-rule violation raised by [`StatusHistory::add_status`].
///
/// Always raised before any write, so the store is left untouched.
///
/// [`StatusHistory::add_status`]: crate::engine::StatusHistory::add_status
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusCreationError {
  #[error("inserting a status with a set `applies_to` ({applies_to}) is not supported")]
  ClosedRecord { applies_to: NaiveDate },

  #[error(
    "status {status_id} [{applies_from}, {applies_to}) is already terminated; \
     splitting it is not supported"
  )]
  SplitClosedInterval {
    status_id:    Uuid,
    applies_from: NaiveDate,
    applies_to:   NaiveDate,
  },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("status creation error: {0}")]
  StatusCreation(#[from] StatusCreationError),

  #[error("no status for entity {entity_id} as of {date}")]
  StatusNotFound { entity_id: Uuid, date: NaiveDate },

  #[error("entity not found: {0}")]
  EntityNotFound(Uuid),

  #[error("entity {entity_id} is of kind {actual:?}, history tracks {expected:?}")]
  KindMismatch {
    entity_id: Uuid,
    expected:  String,
    actual:    String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
