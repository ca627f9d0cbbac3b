//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as ISO 8601
//! `YYYY-MM-DD`, UUIDs as hyphenated lowercase strings and payloads as
//! compact JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, de::DeserializeOwned};
use statline_core::{entity::ObservedEntity, status::StatusRecord};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Payload ─────────────────────────────────────────────────────────────────

pub fn encode_payload<P: Serialize>(payload: &P) -> Result<String> {
  Ok(serde_json::to_string(payload)?)
}

pub fn decode_payload<P: DeserializeOwned>(s: &str) -> Result<P> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawStatus::from_row`], for a `statuses` alias `s`.
pub const STATUS_COLUMNS: &str =
  "s.status_id, s.observed_id, s.applies_from, s.applies_to, s.payload_json";

/// Column list matching [`RawEntity::from_row`], for an `entities` alias `e`.
pub const ENTITY_COLUMNS: &str = "e.entity_id, e.kind, e.created_at, e.current_status";

/// Raw strings read directly from a `statuses` row.
pub struct RawStatus {
  pub status_id:    String,
  pub observed_id:  String,
  pub applies_from: String,
  pub applies_to:   Option<String>,
  pub payload_json: String,
}

impl RawStatus {
  /// Read the five [`STATUS_COLUMNS`] starting at column `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      status_id:    row.get(offset)?,
      observed_id:  row.get(offset + 1)?,
      applies_from: row.get(offset + 2)?,
      applies_to:   row.get(offset + 3)?,
      payload_json: row.get(offset + 4)?,
    })
  }

  pub fn into_record<P: DeserializeOwned>(self) -> Result<StatusRecord<P>> {
    Ok(StatusRecord {
      status_id:    decode_uuid(&self.status_id)?,
      observed_id:  decode_uuid(&self.observed_id)?,
      applies_from: decode_date(&self.applies_from)?,
      applies_to:   self.applies_to.as_deref().map(decode_date).transpose()?,
      payload:      decode_payload(&self.payload_json)?,
    })
  }
}

/// Raw strings read directly from an `entities` row.
pub struct RawEntity {
  pub entity_id:      String,
  pub kind:           String,
  pub created_at:     String,
  pub current_status: Option<String>,
}

impl RawEntity {
  /// Read the four [`ENTITY_COLUMNS`] starting at column `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      entity_id:      row.get(offset)?,
      kind:           row.get(offset + 1)?,
      created_at:     row.get(offset + 2)?,
      current_status: row.get(offset + 3)?,
    })
  }

  pub fn into_entity(self) -> Result<ObservedEntity> {
    Ok(ObservedEntity {
      entity_id:      decode_uuid(&self.entity_id)?,
      kind:           self.kind,
      created_at:     decode_dt(&self.created_at)?,
      current_status: self.current_status.as_deref().map(decode_uuid).transpose()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_sort_as_text() {
    let earlier = encode_date(NaiveDate::from_ymd_opt(2020, 2, 1).unwrap());
    let later = encode_date(NaiveDate::from_ymd_opt(2020, 10, 1).unwrap());
    assert_eq!(earlier, "2020-02-01");
    assert!(earlier < later);
  }

  #[test]
  fn bad_date_is_a_parse_error() {
    assert!(matches!(decode_date("2020-13-01"), Err(Error::DateParse(_))));
  }
}
