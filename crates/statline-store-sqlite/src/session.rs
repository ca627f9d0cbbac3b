//! [`SqliteSession`] — synchronous [`StatusStore`] access to one connection.
//!
//! Sessions only exist on the `tokio-rusqlite` worker thread, inside a
//! [`SqliteStore`](crate::SqliteStore) call.

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;
use serde::{Serialize, de::DeserializeOwned};
use statline_core::{
  entity::ObservedEntity,
  status::{StatusFilter, StatusRecord},
  store::StatusStore,
  transaction::TransactionContext,
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ENTITY_COLUMNS, RawEntity, RawStatus, STATUS_COLUMNS, encode_date, encode_dt,
    encode_payload, encode_uuid,
  },
};

/// A borrowed SQLite connection implementing [`StatusStore`].
pub struct SqliteSession<'c> {
  conn: &'c rusqlite::Connection,
}

impl<'c> SqliteSession<'c> {
  pub fn new(conn: &'c rusqlite::Connection) -> Self { Self { conn } }
}

// ─── TransactionContext impl ─────────────────────────────────────────────────

impl TransactionContext for SqliteSession<'_> {
  type Error = Error;

  fn is_active(&self) -> bool { !self.conn.is_autocommit() }

  // IMMEDIATE takes the write lock up front, so the covering-status read and
  // the writes that follow cannot interleave with another writer.
  fn begin(&mut self) -> Result<()> {
    self.conn.execute_batch("BEGIN IMMEDIATE")?;
    Ok(())
  }

  fn commit(&mut self) -> Result<()> {
    self.conn.execute_batch("COMMIT")?;
    Ok(())
  }

  fn rollback(&mut self) -> Result<()> {
    self.conn.execute_batch("ROLLBACK")?;
    Ok(())
  }
}

// ─── StatusStore impl ────────────────────────────────────────────────────────

impl StatusStore for SqliteSession<'_> {
  // ── Entities ──────────────────────────────────────────────────────────────

  fn create_entity(&mut self, entity: &ObservedEntity) -> Result<()> {
    self.conn.execute(
      "INSERT INTO entities (entity_id, kind, created_at, current_status)
       VALUES (?1, ?2, ?3, ?4)",
      rusqlite::params![
        encode_uuid(entity.entity_id),
        entity.kind,
        encode_dt(entity.created_at),
        entity.current_status.map(encode_uuid),
      ],
    )?;
    Ok(())
  }

  fn get_entity(&mut self, entity_id: Uuid) -> Result<Option<ObservedEntity>> {
    let raw = self
      .conn
      .query_row(
        &format!("SELECT {ENTITY_COLUMNS} FROM entities e WHERE e.entity_id = ?1"),
        rusqlite::params![encode_uuid(entity_id)],
        |row| RawEntity::from_row(row, 0),
      )
      .optional()?;

    raw.map(RawEntity::into_entity).transpose()
  }

  fn update_entity(&mut self, entity: &ObservedEntity) -> Result<()> {
    self.conn.execute(
      "UPDATE entities SET current_status = ?2 WHERE entity_id = ?1",
      rusqlite::params![
        encode_uuid(entity.entity_id),
        entity.current_status.map(encode_uuid),
      ],
    )?;
    Ok(())
  }

  fn list_entities(&mut self, kind: Option<&str>) -> Result<Vec<ObservedEntity>> {
    let mut stmt = self.conn.prepare(&format!(
      "SELECT {ENTITY_COLUMNS} FROM entities e
       WHERE ?1 IS NULL OR e.kind = ?1
       ORDER BY e.created_at, e.entity_id"
    ))?;
    let raws = stmt
      .query_map(rusqlite::params![kind], |row| RawEntity::from_row(row, 0))?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    raws.into_iter().map(RawEntity::into_entity).collect()
  }

  // ── Status records ────────────────────────────────────────────────────────

  fn create_status<P: Serialize>(&mut self, record: &StatusRecord<P>) -> Result<()> {
    self.conn.execute(
      "INSERT INTO statuses (status_id, observed_id, applies_from, applies_to, payload_json)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        encode_uuid(record.status_id),
        encode_uuid(record.observed_id),
        encode_date(record.applies_from),
        record.applies_to.map(encode_date),
        encode_payload(&record.payload)?,
      ],
    )?;
    Ok(())
  }

  fn update_status<P: Serialize>(&mut self, record: &StatusRecord<P>) -> Result<()> {
    self.conn.execute(
      "UPDATE statuses SET applies_to = ?2, payload_json = ?3 WHERE status_id = ?1",
      rusqlite::params![
        encode_uuid(record.status_id),
        record.applies_to.map(encode_date),
        encode_payload(&record.payload)?,
      ],
    )?;
    Ok(())
  }

  fn delete_status(&mut self, status_id: Uuid) -> Result<()> {
    self.conn.execute(
      "DELETE FROM statuses WHERE status_id = ?1",
      rusqlite::params![encode_uuid(status_id)],
    )?;
    Ok(())
  }

  fn find_statuses<P: DeserializeOwned>(
    &mut self,
    filter: &StatusFilter,
  ) -> Result<Vec<StatusRecord<P>>> {
    // Build WHERE clause dynamically; each condition binds the next index.
    let mut conds: Vec<String> = vec![];
    let mut params: Vec<String> = vec![];

    if let Some(id) = filter.status_id {
      params.push(encode_uuid(id));
      conds.push(format!("s.status_id = ?{}", params.len()));
    }
    if let Some(id) = filter.observed_id {
      params.push(encode_uuid(id));
      conds.push(format!("s.observed_id = ?{}", params.len()));
    }
    if let Some(date) = filter.as_of {
      params.push(encode_date(date));
      let n = params.len();
      conds.push(format!(
        "s.applies_from <= ?{n} AND (s.applies_to IS NULL OR s.applies_to > ?{n})"
      ));
    }
    if let Some(kind) = &filter.kind {
      params.push(kind.clone());
      conds.push(format!("e.kind = ?{}", params.len()));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    let mut stmt = self.conn.prepare(&format!(
      "SELECT {STATUS_COLUMNS}
       FROM statuses s
       JOIN entities e ON e.entity_id = s.observed_id
       {where_clause}
       ORDER BY s.observed_id, s.applies_from"
    ))?;
    let raws = stmt
      .query_map(rusqlite::params_from_iter(params), |row| RawStatus::from_row(row, 0))?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    raws.into_iter().map(RawStatus::into_record).collect()
  }

  fn find_entities_with_status<P: DeserializeOwned>(
    &mut self,
    kind: &str,
    date: NaiveDate,
  ) -> Result<Vec<(ObservedEntity, StatusRecord<P>)>> {
    let mut stmt = self.conn.prepare(&format!(
      "SELECT {ENTITY_COLUMNS}, {STATUS_COLUMNS}
       FROM entities e
       JOIN statuses s ON s.observed_id = e.entity_id
       WHERE e.kind = ?1
         AND s.applies_from <= ?2
         AND (s.applies_to IS NULL OR s.applies_to > ?2)
       ORDER BY e.created_at, e.entity_id"
    ))?;
    let raws = stmt
      .query_map(rusqlite::params![kind, encode_date(date)], |row| {
        Ok((RawEntity::from_row(row, 0)?, RawStatus::from_row(row, 4)?))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    raws
      .into_iter()
      .map(|(entity, status)| Ok((entity.into_entity()?, status.into_record()?)))
      .collect()
  }
}
