//! Observed entities: anything whose status changes over time.
//!
//! An entity holds only identity metadata plus a denormalised pointer to its
//! currently open status record. The history itself lives in the status
//! records that reference the entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read/write access to the "current status" pointer of an entity.
///
/// The Status Engine is the only writer of this pointer.
pub trait CurrentStatusHolder {
  fn entity_id(&self) -> Uuid;
  fn current_status(&self) -> Option<Uuid>;
  fn set_current_status(&mut self, status_id: Option<Uuid>);
}

/// An entity that can carry a status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedEntity {
  pub entity_id:      Uuid,
  /// Names the [`StatusHistory`](crate::engine::StatusHistory) that tracks
  /// this entity.
  pub kind:           String,
  pub created_at:     DateTime<Utc>,
  /// The open-ended status record, or `None` if no status was ever added.
  pub current_status: Option<Uuid>,
}

impl ObservedEntity {
  /// A fresh entity with no status history.
  pub fn new(kind: impl Into<String>) -> Self {
    Self {
      entity_id:      Uuid::new_v4(),
      kind:           kind.into(),
      created_at:     Utc::now(),
      current_status: None,
    }
  }
}

impl CurrentStatusHolder for ObservedEntity {
  fn entity_id(&self) -> Uuid { self.entity_id }

  fn current_status(&self) -> Option<Uuid> { self.current_status }

  fn set_current_status(&mut self, status_id: Option<Uuid>) {
    self.current_status = status_id;
  }
}
