//! Status records: one interval of validity for one observed entity.
//!
//! Intervals are half-open: `applies_from` is inclusive, `applies_to` is
//! exclusive. A record with no `applies_to` is the entity's current status.
//! Within one entity's history the intervals partition time from the first
//! `applies_from` onwards, with no gaps and no overlaps.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ─── Record ──────────────────────────────────────────────────────────────────

/// "As of `applies_from`, entity `observed_id` was in status `payload`."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord<P = serde_json::Value> {
  pub status_id:    Uuid,
  pub observed_id:  Uuid,
  /// First day the status applies (inclusive).
  pub applies_from: NaiveDate,
  /// First day the status no longer applies, or `None` while current.
  pub applies_to:   Option<NaiveDate>,
  pub payload:      P,
}

impl<P> StatusRecord<P> {
  /// An open-ended record, ready to hand to
  /// [`StatusHistory::add_status`](crate::engine::StatusHistory::add_status).
  pub fn new(observed_id: Uuid, applies_from: NaiveDate, payload: P) -> Self {
    Self {
      status_id: Uuid::new_v4(),
      observed_id,
      applies_from,
      applies_to: None,
      payload,
    }
  }

  pub fn is_current(&self) -> bool { self.applies_to.is_none() }

  /// Half-open containment: `applies_from <= date < applies_to`.
  pub fn covers(&self, date: NaiveDate) -> bool {
    self.applies_from <= date && self.applies_to.is_none_or(|to| to > date)
  }
}

/// Every record in `records` that covers `date`.
///
/// Over a single entity's history this yields at most one record; over many
/// entities it yields each entity's status as of `date`.
pub fn filter_as_of<'a, P, I>(
  records: I,
  date: NaiveDate,
) -> impl Iterator<Item = &'a StatusRecord<P>>
where
  P: 'a,
  I: IntoIterator<Item = &'a StatusRecord<P>>,
{
  records.into_iter().filter(move |r| r.covers(date))
}

// ─── Store predicate ─────────────────────────────────────────────────────────

/// Predicate passed to [`StatusStore::find_statuses`].
///
/// Every set field narrows the match; an empty filter matches all records.
///
/// [`StatusStore::find_statuses`]: crate::store::StatusStore::find_statuses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter {
  pub status_id:   Option<Uuid>,
  pub observed_id: Option<Uuid>,
  /// Only records covering this date.
  pub as_of:       Option<NaiveDate>,
  /// Only records of entities with this kind.
  pub kind:        Option<String>,
}

impl StatusFilter {
  pub fn for_entity(observed_id: Uuid) -> Self {
    Self { observed_id: Some(observed_id), ..Self::default() }
  }

  pub fn by_id(status_id: Uuid) -> Self {
    Self { status_id: Some(status_id), ..Self::default() }
  }

  pub fn as_of(mut self, date: NaiveDate) -> Self {
    self.as_of = Some(date);
    self
  }

  pub fn of_kind(mut self, kind: impl Into<String>) -> Self {
    self.kind = Some(kind.into());
    self
  }

  /// Whether `record` satisfies the record-level fields of this filter.
  ///
  /// `kind` is a property of the entity and is not checked here.
  pub fn matches<P>(&self, record: &StatusRecord<P>) -> bool {
    self.status_id.is_none_or(|id| id == record.status_id)
      && self.observed_id.is_none_or(|id| id == record.observed_id)
      && self.as_of.is_none_or(|date| record.covers(date))
  }
}

// ─── Partition check ─────────────────────────────────────────────────────────

/// A way in which one entity's history fails to partition time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionViolation {
  #[error("status {0} has an empty or inverted interval")]
  EmptyInterval(Uuid),

  #[error("status {earlier} ends on {ends:?} but the next status {later} starts on {starts}")]
  Discontinuity {
    earlier: Uuid,
    ends:    Option<NaiveDate>,
    later:   Uuid,
    starts:  NaiveDate,
  },

  #[error("the last status {0} is not open-ended")]
  NoCurrentStatus(Uuid),

  #[error("history mixes statuses of entities {0} and {1}")]
  MixedEntities(Uuid, Uuid),
}

/// Check that `records` (one entity's full history, any order) are
/// contiguous and non-overlapping with exactly one open-ended record last.
///
/// An empty history is a valid partition.
pub fn check_partition<P>(records: &[StatusRecord<P>]) -> Result<(), PartitionViolation> {
  let mut ordered: Vec<&StatusRecord<P>> = records.iter().collect();
  ordered.sort_by_key(|r| r.applies_from);

  for r in &ordered {
    if r.applies_to.is_some_and(|to| to <= r.applies_from) {
      return Err(PartitionViolation::EmptyInterval(r.status_id));
    }
  }

  for pair in ordered.windows(2) {
    let (earlier, later) = (pair[0], pair[1]);
    if earlier.observed_id != later.observed_id {
      return Err(PartitionViolation::MixedEntities(
        earlier.observed_id,
        later.observed_id,
      ));
    }
    if earlier.applies_to != Some(later.applies_from) {
      return Err(PartitionViolation::Discontinuity {
        earlier: earlier.status_id,
        ends:    earlier.applies_to,
        later:   later.status_id,
        starts:  later.applies_from,
      });
    }
  }

  match ordered.last() {
    Some(last) if !last.is_current() => {
      Err(PartitionViolation::NoCurrentStatus(last.status_id))
    }
    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn record(
    observed_id: Uuid,
    from: NaiveDate,
    to: Option<NaiveDate>,
  ) -> StatusRecord<i32> {
    StatusRecord { applies_to: to, ..StatusRecord::new(observed_id, from, 0) }
  }

  #[test]
  fn covers_is_half_open() {
    let r = record(Uuid::new_v4(), date(2020, 1, 1), Some(date(2020, 2, 1)));
    assert!(!r.covers(date(2019, 12, 31)));
    assert!(r.covers(date(2020, 1, 1)));
    assert!(r.covers(date(2020, 1, 31)));
    assert!(!r.covers(date(2020, 2, 1)));
  }

  #[test]
  fn open_record_covers_far_future() {
    let r = record(Uuid::new_v4(), date(2020, 1, 1), None);
    assert!(r.is_current());
    assert!(r.covers(date(2030, 1, 1)));
  }

  #[test]
  fn filter_as_of_picks_one_per_entity() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let records = vec![
      record(a, date(2020, 1, 1), Some(date(2020, 2, 1))),
      record(a, date(2020, 2, 1), None),
      record(b, date(2020, 1, 15), None),
    ];

    let hits: Vec<_> = filter_as_of(&records, date(2020, 1, 20)).collect();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().any(|r| r.observed_id == a && r.applies_from == date(2020, 1, 1)));
    assert!(hits.iter().any(|r| r.observed_id == b));

    let early: Vec<_> = filter_as_of(&records, date(2020, 1, 10)).collect();
    assert_eq!(early.len(), 1);
  }

  #[test]
  fn filter_matches_record_fields() {
    let a = Uuid::new_v4();
    let r = record(a, date(2020, 1, 1), None);

    assert!(StatusFilter::default().matches(&r));
    assert!(StatusFilter::for_entity(a).as_of(date(2020, 6, 1)).matches(&r));
    assert!(!StatusFilter::for_entity(a).as_of(date(2019, 6, 1)).matches(&r));
    assert!(!StatusFilter::for_entity(Uuid::new_v4()).matches(&r));
    assert!(StatusFilter::by_id(r.status_id).matches(&r));
  }

  #[test]
  fn contiguous_history_is_a_partition() {
    let a = Uuid::new_v4();
    let records = vec![
      record(a, date(2020, 2, 1), None),
      record(a, date(2020, 1, 1), Some(date(2020, 2, 1))),
    ];
    assert_eq!(check_partition(&records), Ok(()));
    assert_eq!(check_partition::<i32>(&[]), Ok(()));
  }

  #[test]
  fn gap_is_a_discontinuity() {
    let a = Uuid::new_v4();
    let records = vec![
      record(a, date(2020, 1, 1), Some(date(2020, 1, 20))),
      record(a, date(2020, 2, 1), None),
    ];
    assert!(matches!(
      check_partition(&records),
      Err(PartitionViolation::Discontinuity { .. })
    ));
  }

  #[test]
  fn two_open_records_are_rejected() {
    let a = Uuid::new_v4();
    let records = vec![
      record(a, date(2020, 1, 1), None),
      record(a, date(2020, 2, 1), None),
    ];
    assert!(matches!(
      check_partition(&records),
      Err(PartitionViolation::Discontinuity { ends: None, .. })
    ));
  }

  #[test]
  fn closed_last_record_is_rejected() {
    let a = Uuid::new_v4();
    let last = record(a, date(2020, 1, 1), Some(date(2020, 2, 1)));
    let id = last.status_id;
    assert_eq!(
      check_partition(&[last]),
      Err(PartitionViolation::NoCurrentStatus(id))
    );
  }

  #[test]
  fn zero_length_interval_is_rejected() {
    let r = record(Uuid::new_v4(), date(2020, 1, 1), Some(date(2020, 1, 1)));
    let id = r.status_id;
    assert_eq!(check_partition(&[r]), Err(PartitionViolation::EmptyInterval(id)));
  }
}
