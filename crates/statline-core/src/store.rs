//! The `StatusStore` trait is the persistent record store the engine runs on.
//!
//! A `StatusStore` is one connection's worth of synchronous access to
//! entities and status records. Backends (e.g. `statline-store-sqlite`) are
//! expected to enforce, at the storage level, that each entity has at most
//! one open-ended status record; that constraint is what makes concurrent
//! writers safe, so the engine never takes in-process locks.

use chrono::NaiveDate;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
  entity::ObservedEntity,
  status::{StatusFilter, StatusRecord},
  transaction::TransactionContext,
};

/// Entity and status-record access for one store connection.
///
/// The error type is the one from [`TransactionContext`]. The engine requires
/// it to implement `From<crate::Error>` so rule violations and storage
/// errors (including constraint violations) travel in one type.
pub trait StatusStore: TransactionContext {
  // ── Entities ──────────────────────────────────────────────────────────

  fn create_entity(
    &mut self,
    entity: &ObservedEntity,
  ) -> Result<(), Self::Error>;

  /// Returns `None` if no entity has this id.
  fn get_entity(
    &mut self,
    entity_id: Uuid,
  ) -> Result<Option<ObservedEntity>, Self::Error>;

  /// Persist the mutable fields of `entity` (its current status pointer).
  fn update_entity(
    &mut self,
    entity: &ObservedEntity,
  ) -> Result<(), Self::Error>;

  fn list_entities(
    &mut self,
    kind: Option<&str>,
  ) -> Result<Vec<ObservedEntity>, Self::Error>;

  // ── Status records ────────────────────────────────────────────────────

  fn create_status<P: Serialize>(
    &mut self,
    record: &StatusRecord<P>,
  ) -> Result<(), Self::Error>;

  /// Persist the mutable fields of `record` (`applies_to` and payload).
  fn update_status<P: Serialize>(
    &mut self,
    record: &StatusRecord<P>,
  ) -> Result<(), Self::Error>;

  fn delete_status(&mut self, status_id: Uuid) -> Result<(), Self::Error>;

  /// All records matching `filter`, ordered by `(observed_id, applies_from)`.
  fn find_statuses<P: DeserializeOwned>(
    &mut self,
    filter: &StatusFilter,
  ) -> Result<Vec<StatusRecord<P>>, Self::Error>;

  /// Entities of `kind` paired with their status covering `date`; entities
  /// with no covering record are left out.
  fn find_entities_with_status<P: DeserializeOwned>(
    &mut self,
    kind: &str,
    date: NaiveDate,
  ) -> Result<Vec<(ObservedEntity, StatusRecord<P>)>, Self::Error>;
}
