//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`
//! and UUIDs as hyphenated lowercase strings. `present` is SQLite's 0/1.

use chrono::{DateTime, NaiveDate, Utc};
use rollcall_core::{
  model::{AttendanceRecord, AttendanceSession, Course, SessionRecord, Student, Subject},
  range::DATE_FORMAT,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `courses` row.
pub struct RawCourse {
  pub course_id:  String,
  pub name:       String,
  pub created_at: String,
}

impl RawCourse {
  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:  decode_uuid(&self.course_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `students` row.
pub struct RawStudent {
  pub student_id: String,
  pub course_id:  String,
  pub name:       String,
  pub created_at: String,
}

impl RawStudent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id: row.get(0)?,
      course_id:  row.get(1)?,
      name:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      student_id: decode_uuid(&self.student_id)?,
      course_id:  decode_uuid(&self.course_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id: String,
  pub course_id:  String,
  pub name:       String,
  pub created_at: String,
}

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id: row.get(0)?,
      course_id:  row.get(1)?,
      name:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id: decode_uuid(&self.subject_id)?,
      course_id:  decode_uuid(&self.course_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// An `attendance_records` row.
pub struct RawRecord {
  pub record_id:  String,
  pub session_id: String,
  pub student_id: String,
  pub present:    bool,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:  row.get(0)?,
      session_id: row.get(1)?,
      student_id: row.get(2)?,
      present:    row.get(3)?,
    })
  }

  pub fn into_record(self) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
      record_id:  decode_uuid(&self.record_id)?,
      session_id: decode_uuid(&self.session_id)?,
      student_id: decode_uuid(&self.student_id)?,
      present:    self.present,
    })
  }
}

/// An `attendance_records` row joined with its `attendance_sessions` row.
pub struct RawSessionRecord {
  // attendance_sessions columns
  pub session_id: String,
  pub subject_id: String,
  pub date:       String,
  // attendance_records columns
  pub record:     RawRecord,
}

impl RawSessionRecord {
  /// Expects `session_id, subject_id, date, record_id, student_id, present`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    let session_id: String = row.get(0)?;
    Ok(Self {
      subject_id: row.get(1)?,
      date:       row.get(2)?,
      record:     RawRecord {
        record_id:  row.get(3)?,
        session_id: session_id.clone(),
        student_id: row.get(4)?,
        present:    row.get(5)?,
      },
      session_id,
    })
  }

  pub fn into_session_record(self) -> Result<SessionRecord> {
    Ok(SessionRecord {
      session: AttendanceSession {
        session_id: decode_uuid(&self.session_id)?,
        subject_id: decode_uuid(&self.subject_id)?,
        date:       decode_date(&self.date)?,
      },
      record:  self.record.into_record()?,
    })
  }
}
