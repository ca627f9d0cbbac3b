//! The status engine: inserting into, and querying, an entity's history.
//!
//! New records are always open-ended. Inserting one closes the entity's
//! previously open record on the new record's start date, or replaces it
//! outright when both start on the same day. Because only the open record
//! can ever cover a date on or after its own start, insertion touches at
//! most one existing record.

use std::marker::PhantomData;

use chrono::NaiveDate;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  entity::{CurrentStatusHolder, ObservedEntity},
  error::{Error, StatusCreationError},
  status::{StatusFilter, StatusRecord},
  store::StatusStore,
  transaction::run_in_transaction,
};

/// The status history of one kind of entity, with payload type `P`.
///
/// The kind is fixed at construction and every operation is scoped to
/// entities of that kind.
pub struct StatusHistory<P> {
  kind:     String,
  _payload: PhantomData<fn() -> P>,
}

impl<P> Clone for StatusHistory<P> {
  fn clone(&self) -> Self {
    Self { kind: self.kind.clone(), _payload: PhantomData }
  }
}

impl<P> std::fmt::Debug for StatusHistory<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StatusHistory").field("kind", &self.kind).finish()
  }
}

impl<P> StatusHistory<P>
where
  P: Serialize + DeserializeOwned,
{
  pub fn new(kind: impl Into<String>) -> Self {
    Self { kind: kind.into(), _payload: PhantomData }
  }

  pub fn kind(&self) -> &str { &self.kind }

  /// Create and persist a new entity of this history's kind.
  pub fn create_entity<S>(&self, store: &mut S) -> Result<ObservedEntity, S::Error>
  where
    S: StatusStore,
    S::Error: From<Error>,
  {
    let entity = ObservedEntity::new(self.kind.clone());
    store.create_entity(&entity)?;
    debug!(entity_id = %entity.entity_id, kind = %self.kind, "created entity");
    Ok(entity)
  }

  /// Insert `new_record` as the entity's current status.
  ///
  /// Runs in one transaction, joining the caller's if one is open. Returns
  /// the persisted record.
  ///
  /// # Errors
  ///
  /// - [`StatusCreationError::ClosedRecord`] if `new_record.applies_to` is set.
  /// - [`StatusCreationError::SplitClosedInterval`] if the start date falls
  ///   inside an already terminated record.
  /// - [`Error::EntityNotFound`] / [`Error::KindMismatch`] for a bad
  ///   `observed_id`.
  /// - The store's own constraint error if the start date precedes the
  ///   entity's first status.
  pub fn add_status<S>(
    &self,
    store: &mut S,
    new_record: StatusRecord<P>,
  ) -> Result<StatusRecord<P>, S::Error>
  where
    S: StatusStore,
    S::Error: From<Error> + std::error::Error,
  {
    if let Some(applies_to) = new_record.applies_to {
      return Err(Error::from(StatusCreationError::ClosedRecord { applies_to }).into());
    }

    run_in_transaction(store, |store| {
      let mut entity = self.load_entity(store, new_record.observed_id)?;
      let applies_from = new_record.applies_from;

      match self.covering(store, entity.entity_id, applies_from)? {
        None => debug!(entity_id = %entity.entity_id, "no covering status"),
        Some(mut prev) => {
          if let Some(applies_to) = prev.applies_to {
            return Err(
              Error::from(StatusCreationError::SplitClosedInterval {
                status_id: prev.status_id,
                applies_from: prev.applies_from,
                applies_to,
              })
              .into(),
            );
          }

          if prev.applies_from == applies_from {
            debug!(status_id = %prev.status_id, "replacing same-day status");
            store.delete_status(prev.status_id)?;
          } else {
            debug!(status_id = %prev.status_id, %applies_from, "closing previous status");
            prev.applies_to = Some(applies_from);
            store.update_status(&prev)?;
          }
        }
      }

      store.create_status(&new_record)?;
      entity.set_current_status(Some(new_record.status_id));
      store.update_entity(&entity)?;

      info!(
        entity_id = %entity.entity_id,
        status_id = %new_record.status_id,
        %applies_from,
        "status added"
      );
      Ok(new_record)
    })
  }

  /// The record covering `date` for `entity_id`.
  ///
  /// Fails with [`Error::StatusNotFound`] if `date` precedes the first
  /// status or the entity has none.
  pub fn get_status_as_of<S>(
    &self,
    store: &mut S,
    entity_id: Uuid,
    date: NaiveDate,
  ) -> Result<StatusRecord<P>, S::Error>
  where
    S: StatusStore,
    S::Error: From<Error>,
  {
    self
      .covering(store, entity_id, date)?
      .ok_or_else(|| Error::StatusNotFound { entity_id, date }.into())
  }

  /// Every entity's status as of `date`, in one query.
  pub fn filter_status_as_of<S>(
    &self,
    store: &mut S,
    date: NaiveDate,
  ) -> Result<Vec<StatusRecord<P>>, S::Error>
  where
    S: StatusStore,
  {
    store.find_statuses(&StatusFilter::default().as_of(date).of_kind(self.kind.clone()))
  }

  /// Entities of this kind paired with their status as of `date`.
  pub fn entities_with_status_as_of<S>(
    &self,
    store: &mut S,
    date: NaiveDate,
  ) -> Result<Vec<(ObservedEntity, StatusRecord<P>)>, S::Error>
  where
    S: StatusStore,
  {
    store.find_entities_with_status(&self.kind, date)
  }

  /// The full history of `entity_id`, oldest first.
  pub fn status_history<S>(
    &self,
    store: &mut S,
    entity_id: Uuid,
  ) -> Result<Vec<StatusRecord<P>>, S::Error>
  where
    S: StatusStore,
  {
    store.find_statuses(&StatusFilter::for_entity(entity_id).of_kind(self.kind.clone()))
  }

  /// The record the entity's current-status pointer refers to.
  pub fn current_status<S>(
    &self,
    store: &mut S,
    entity_id: Uuid,
  ) -> Result<Option<StatusRecord<P>>, S::Error>
  where
    S: StatusStore,
    S::Error: From<Error>,
  {
    let entity = self.load_entity(store, entity_id)?;
    let Some(status_id) = entity.current_status() else {
      return Ok(None);
    };
    Ok(store.find_statuses(&StatusFilter::by_id(status_id))?.into_iter().next())
  }

  fn load_entity<S>(&self, store: &mut S, entity_id: Uuid) -> Result<ObservedEntity, S::Error>
  where
    S: StatusStore,
    S::Error: From<Error>,
  {
    let entity = store
      .get_entity(entity_id)?
      .ok_or(Error::EntityNotFound(entity_id))?;

    if entity.kind != self.kind {
      return Err(
        Error::KindMismatch {
          entity_id,
          expected: self.kind.clone(),
          actual: entity.kind,
        }
        .into(),
      );
    }
    Ok(entity)
  }

  fn covering<S>(
    &self,
    store: &mut S,
    entity_id: Uuid,
    date: NaiveDate,
  ) -> Result<Option<StatusRecord<P>>, S::Error>
  where
    S: StatusStore,
  {
    let filter = StatusFilter::for_entity(entity_id)
      .as_of(date)
      .of_kind(self.kind.clone());
    Ok(store.find_statuses(&filter)?.into_iter().next())
  }
}
