//! Subject-scoped, date-bounded attendance listings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result, error::lift, store::AttendanceStore};

/// Wire format of both range bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── DateRange ───────────────────────────────────────────────────────────────

/// An inclusive calendar range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
  start: NaiveDate,
  end:   NaiveDate,
}

impl DateRange {
  pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
    if start > end {
      return Err(Error::InvalidDateRange(format!(
        "start {start} is after end {end}"
      )));
    }
    Ok(Self { start, end })
  }

  /// Parse both bounds from `YYYY-MM-DD` strings.
  pub fn parse(start: &str, end: &str) -> Result<Self> {
    Self::new(parse_bound("start", start)?, parse_bound("end", end)?)
  }

  pub fn start(&self) -> NaiveDate { self.start }

  pub fn end(&self) -> NaiveDate { self.end }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start <= date && date <= self.end
  }
}

/// Bounds must be exactly `YYYY-MM-DD`: unsigned four-digit year, zero-padded
/// month and day.
fn parse_bound(which: &str, raw: &str) -> Result<NaiveDate> {
  let trimmed = raw.trim();
  let shaped = trimmed.len() == 10
    && trimmed.bytes().enumerate().all(|(i, b)| match i {
      4 | 7 => b == b'-',
      _ => b.is_ascii_digit(),
    });
  if !shaped {
    return Err(Error::InvalidDateRange(format!(
      "{which} date {raw:?} is not YYYY-MM-DD"
    )));
  }

  NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|e| {
    Error::InvalidDateRange(format!("{which} date {raw:?} is not YYYY-MM-DD: {e}"))
  })
}

// ─── Report types ────────────────────────────────────────────────────────────

/// One line of a range report. Serialises as `{"date":"YYYY-MM-DD","status":bool}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEntry {
  pub date:   NaiveDate,
  pub status: bool,
}

/// A student's attendance in one subject over a [`DateRange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeReport {
  pub student_id: Uuid,
  pub subject_id: Uuid,
  pub range:      DateRange,
  /// Ascending by date. Sessions without a record for the student are
  /// omitted, not reported as absences.
  pub entries:    Vec<RangeEntry>,
}

// ─── Computation ─────────────────────────────────────────────────────────────

/// List the student's recorded attendance for `subject_id` within `range`.
///
/// An empty window yields an empty report, not an error.
pub async fn compute_range<S>(
  store: &S,
  student_id: Uuid,
  subject_id: Uuid,
  range: DateRange,
) -> Result<RangeReport>
where
  S: AttendanceStore,
{
  store
    .get_subject(subject_id)
    .await
    .map_err(lift)?
    .ok_or(Error::SubjectNotFound(subject_id))?;

  let mut rows = store
    .records_for_student_in_range(student_id, subject_id, range)
    .await
    .map_err(lift)?;

  // Backends are asked for date order; the sort is stable so equal dates keep
  // whatever order the backend chose.
  rows.retain(|row| range.contains(row.session.date));
  rows.sort_by_key(|row| row.session.date);

  let entries: Vec<RangeEntry> = rows
    .into_iter()
    .map(|row| RangeEntry { date: row.session.date, status: row.record.present })
    .collect();

  debug!(%student_id, %subject_id, entries = entries.len(), "computed range report");

  Ok(RangeReport { student_id, subject_id, range, entries })
}
