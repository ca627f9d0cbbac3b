//! The `StatusTracker` trait is the async surface exposed to callers.
//!
//! The trait is implemented by storage backends (e.g.
//! `statline-store-sqlite`), which run the synchronous
//! [`StatusHistory`](crate::engine::StatusHistory) engine on their own
//! connection. Presentation layers depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{engine::StatusHistory, entity::ObservedEntity, status::StatusRecord};

/// Bounds a status payload needs to cross into a backend's worker thread.
pub trait Payload: Serialize + DeserializeOwned + Send + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Send + 'static {}

/// Abstraction over a status-tracking backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait StatusTracker: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Entities ──────────────────────────────────────────────────────────

  /// Create and persist a new entity of `kind` with no status history.
  fn add_entity(
    &self,
    kind: String,
  ) -> impl Future<Output = Result<ObservedEntity, Self::Error>> + Send + '_;

  /// Retrieve an entity by id. Returns `None` if not found.
  fn get_entity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ObservedEntity>, Self::Error>> + Send + '_;

  /// List all entities, optionally filtered by kind.
  fn list_entities(
    &self,
    kind: Option<String>,
  ) -> impl Future<Output = Result<Vec<ObservedEntity>, Self::Error>> + Send + '_;

  // ── Status writes ─────────────────────────────────────────────────────

  /// Insert `record` as its entity's current status. See
  /// [`StatusHistory::add_status`].
  fn add_status<'a, P: Payload>(
    &'a self,
    history: &'a StatusHistory<P>,
    record: StatusRecord<P>,
  ) -> impl Future<Output = Result<StatusRecord<P>, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The status of `entity_id` as of `date`; a not-found error if none
  /// covers it.
  fn get_status_as_of<'a, P: Payload>(
    &'a self,
    history: &'a StatusHistory<P>,
    entity_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<StatusRecord<P>, Self::Error>> + Send + 'a;

  /// Every entity's status as of `date`.
  fn filter_status_as_of<'a, P: Payload>(
    &'a self,
    history: &'a StatusHistory<P>,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<StatusRecord<P>>, Self::Error>> + Send + 'a;

  /// Entities paired with their status as of `date`.
  fn entities_with_status_as_of<'a, P: Payload>(
    &'a self,
    history: &'a StatusHistory<P>,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<(ObservedEntity, StatusRecord<P>)>, Self::Error>>
  + Send
  + 'a;

  /// The full history of `entity_id`, oldest first.
  fn status_history<'a, P: Payload>(
    &'a self,
    history: &'a StatusHistory<P>,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<Vec<StatusRecord<P>>, Self::Error>> + Send + 'a;
}
