//! Overall and per-subject attendance aggregation for one student.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  error::lift,
  model::AttendanceRecord,
  store::AttendanceStore,
};

// ─── Percentages ─────────────────────────────────────────────────────────────

/// Whole-number attendance percentages.
///
/// `present` is `floor(100 * total_present / total_attendance)` and `absent`
/// is `ceil(100 - present)`, derived from the rounded `present` rather than
/// from the raw absent count. Both are zero when nothing has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Percentages {
  pub present: u32,
  pub absent:  u32,
}

impl Percentages {
  pub fn from_counts(total_present: usize, total_attendance: usize) -> Self {
    if total_attendance == 0 {
      return Self::default();
    }

    // Integer division is the floor; `present` is then whole, so the ceil of
    // `100 - present` is just the subtraction.
    let present = (total_present * 100 / total_attendance) as u32;
    Self { present, absent: 100u32.saturating_sub(present) }
  }
}

// ─── Report types ────────────────────────────────────────────────────────────

/// Present and absent counts for one subject of the student's course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectAttendance {
  pub subject_id: Uuid,
  pub name:       String,
  pub present:    usize,
  pub absent:     usize,
}

impl SubjectAttendance {
  pub fn total(&self) -> usize { self.present + self.absent }
}

/// Parallel arrays for a per-subject bar chart, in breakdown order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
  pub names:   Vec<String>,
  pub present: Vec<usize>,
  pub absent:  Vec<usize>,
}

/// The student-level summary shown on the homepage. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
  pub student_id:       Uuid,
  /// Number of subjects in the student's course.
  pub total_subjects:   usize,
  pub total_attendance: usize,
  pub total_present:    usize,
  pub percent_present:  u32,
  pub percent_absent:   u32,
  /// One entry per subject of the course, in subject creation order.
  pub subjects:         Vec<SubjectAttendance>,
}

impl AggregateReport {
  pub fn chart_series(&self) -> ChartSeries {
    ChartSeries {
      names:   self.subjects.iter().map(|s| s.name.clone()).collect(),
      present: self.subjects.iter().map(|s| s.present).collect(),
      absent:  self.subjects.iter().map(|s| s.absent).collect(),
    }
  }
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

fn count_present(records: &[AttendanceRecord]) -> usize {
  records.iter().filter(|r| r.present).count()
}

/// Compute the overall and per-subject attendance for `student_id`.
pub async fn compute_overall<S>(store: &S, student_id: Uuid) -> Result<AggregateReport>
where
  S: AttendanceStore,
{
  let student = store
    .get_student(student_id)
    .await
    .map_err(lift)?
    .ok_or(Error::StudentNotFound(student_id))?;

  let records = store.records_for_student(student_id).await.map_err(lift)?;
  let total_attendance = records.len();
  let total_present = count_present(&records);
  let percentages = Percentages::from_counts(total_present, total_attendance);

  let course_subjects = store
    .subjects_for_course(student.course_id)
    .await
    .map_err(lift)?;

  let mut subjects = Vec::with_capacity(course_subjects.len());
  for subject in course_subjects {
    let records = store
      .records_for_student_in_subject(student_id, subject.subject_id)
      .await
      .map_err(lift)?;
    let present = count_present(&records);
    subjects.push(SubjectAttendance {
      subject_id: subject.subject_id,
      name:       subject.name,
      present,
      absent:     records.len() - present,
    });
  }

  debug!(
    %student_id,
    total_attendance,
    total_present,
    subjects = subjects.len(),
    "computed overall attendance"
  );

  Ok(AggregateReport {
    student_id,
    total_subjects: subjects.len(),
    total_attendance,
    total_present,
    percent_present: percentages.present,
    percent_absent: percentages.absent,
    subjects,
  })
}
