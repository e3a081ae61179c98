//! Reference data and attendance facts.
//!
//! Everything here is written by a staff-facing workflow and only
//! read by this crate. Derived reports live in [`crate::aggregate`] and
//! [`crate::range`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Reference data ──────────────────────────────────────────────────────────

/// A programme of study. Subjects and students both belong to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
  pub course_id:  Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// A student enrolled in exactly one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub student_id: Uuid,
  pub course_id:  Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// A subject taught within a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id: Uuid,
  pub course_id:  Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

// ─── Attendance ──────────────────────────────────────────────────────────────

/// A scheduled occurrence of a subject on a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSession {
  pub session_id: Uuid,
  pub subject_id: Uuid,
  pub date:       NaiveDate,
}

/// The present/absent fact for one student in one session.
///
/// At most one record exists per `(session_id, student_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub record_id:  Uuid,
  pub session_id: Uuid,
  pub student_id: Uuid,
  pub present:    bool,
}

/// A record joined to the session it was taken in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
  pub session: AttendanceSession,
  pub record:  AttendanceRecord,
}
