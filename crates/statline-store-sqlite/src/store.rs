//! [`SqliteStore`] — the SQLite implementation of [`StatusTracker`].

use std::path::Path;

use chrono::NaiveDate;
use statline_core::{
  engine::StatusHistory,
  entity::ObservedEntity,
  status::StatusRecord,
  store::StatusStore,
  tracker::{Payload, StatusTracker},
  transaction::run_in_transaction,
};
use uuid::Uuid;

use crate::{Result, schema::SCHEMA, session::SqliteSession};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A status store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(?path, "opened status store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` against a session on the connection thread, outside any
  /// transaction this store opens.
  async fn with_session<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut SqliteSession<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let mut session = SqliteSession::new(conn);
        Ok(f(&mut session))
      })
      .await?
  }

  /// Run `f` inside one transaction and commit if it succeeds.
  ///
  /// Engine calls made on the session join this transaction, so several
  /// status changes can be committed, or rolled back, together.
  pub async fn transaction<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut SqliteSession<'_>) -> Result<T> + Send + 'static,
  {
    self
      .with_session(move |session| run_in_transaction(session, f))
      .await
  }
}

// ─── StatusTracker impl ──────────────────────────────────────────────────────

impl StatusTracker for SqliteStore {
  type Error = crate::Error;

  // ── Entities ──────────────────────────────────────────────────────────────

  async fn add_entity(&self, kind: String) -> Result<ObservedEntity> {
    let entity = ObservedEntity::new(kind);
    let to_insert = entity.clone();
    self
      .with_session(move |session| session.create_entity(&to_insert))
      .await?;
    Ok(entity)
  }

  async fn get_entity(&self, id: Uuid) -> Result<Option<ObservedEntity>> {
    self.with_session(move |session| session.get_entity(id)).await
  }

  async fn list_entities(&self, kind: Option<String>) -> Result<Vec<ObservedEntity>> {
    self
      .with_session(move |session| session.list_entities(kind.as_deref()))
      .await
  }

  // ── Status writes ─────────────────────────────────────────────────────────

  async fn add_status<'a, P: Payload>(
    &'a self,
    history: &'a StatusHistory<P>,
    record:  StatusRecord<P>,
  ) -> Result<StatusRecord<P>> {
    let history = history.clone();
    self
      .with_session(move |session| history.add_status(session, record))
      .await
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_status_as_of<'a, P: Payload>(
    &'a self,
    history:   &'a StatusHistory<P>,
    entity_id: Uuid,
    date:      NaiveDate,
  ) -> Result<StatusRecord<P>> {
    let history = history.clone();
    self
      .with_session(move |session| history.get_status_as_of(session, entity_id, date))
      .await
  }

  async fn filter_status_as_of<'a, P: Payload>(
    &'a self,
    history: &'a StatusHistory<P>,
    date:    NaiveDate,
  ) -> Result<Vec<StatusRecord<P>>> {
    let history = history.clone();
    self
      .with_session(move |session| history.filter_status_as_of(session, date))
      .await
  }

  async fn entities_with_status_as_of<'a, P: Payload>(
    &'a self,
    history: &'a StatusHistory<P>,
    date:    NaiveDate,
  ) -> Result<Vec<(ObservedEntity, StatusRecord<P>)>> {
    let history = history.clone();
    self
      .with_session(move |session| history.entities_with_status_as_of(session, date))
      .await
  }

  async fn status_history<'a, P: Payload>(
    &'a self,
    history:   &'a StatusHistory<P>,
    entity_id: Uuid,
  ) -> Result<Vec<StatusRecord<P>>> {
    let history = history.clone();
    self
      .with_session(move |session| history.status_history(session, entity_id))
      .await
  }
}
