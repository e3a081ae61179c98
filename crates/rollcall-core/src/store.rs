//! The `AttendanceStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `rollcall-store-sqlite`). The aggregator, range report and service depend
//! on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  model::{AttendanceRecord, SessionRecord, Student, Subject},
  range::DateRange,
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Read-only access to students, subjects and their attendance records.
///
/// Backend errors must convert into [`crate::Error`]: missing students or
/// subjects become the matching `NotFound` variant, everything else
/// [`crate::Error::StoreUnavailable`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Reference data ────────────────────────────────────────────────────

  /// Retrieve a student by UUID. Returns `None` if not found.
  fn get_student(
    &self,
    student_id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Retrieve a subject by UUID. Returns `None` if not found.
  fn get_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// All subjects of a course, in creation order.
  fn subjects_for_course(
    &self,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  // ── Records ───────────────────────────────────────────────────────────

  /// Every attendance record held for the student, across all subjects.
  ///
  /// Fails with a not-found error if the student does not exist.
  fn records_for_student(
    &self,
    student_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + '_;

  /// The student's records for sessions of one subject.
  fn records_for_student_in_subject(
    &self,
    student_id: Uuid,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + '_;

  /// The student's records for sessions of one subject whose date falls in
  /// `range` (inclusive), ordered by session date ascending. Sessions the
  /// student has no record for are not returned.
  fn records_for_student_in_range(
    &self,
    student_id: Uuid,
    subject_id: Uuid,
    range: DateRange,
  ) -> impl Future<Output = Result<Vec<SessionRecord>, Self::Error>> + Send + '_;
}
