//! Aggregation, range and service tests against an in-memory store.

use std::{
  sync::{
    Arc,
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::{NaiveDate, Utc};
use tracing_subscriber::fmt::MakeWriter;
use uuid::Uuid;

use crate::{
  Error, Result,
  aggregate::compute_overall,
  cache::ReportCache,
  model::{AttendanceRecord, AttendanceSession, SessionRecord, Student, Subject},
  range::{DateRange, RangeEntry, compute_range},
  service::ReportService,
  store::AttendanceStore,
};

// ─── Fixture ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryStore {
  students: Vec<Student>,
  subjects: Vec<Subject>,
  sessions: Vec<AttendanceSession>,
  records:  Vec<AttendanceRecord>,
  queries:  AtomicUsize,
  offline:  AtomicBool,
}

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
struct Offline;

impl MemoryStore {
  fn add_student(&mut self, course_id: Uuid) -> Uuid {
    let student_id = Uuid::new_v4();
    self.students.push(Student {
      student_id,
      course_id,
      name: "Ada".into(),
      created_at: Utc::now(),
    });
    student_id
  }

  fn add_subject(&mut self, course_id: Uuid, name: &str) -> Uuid {
    let subject_id = Uuid::new_v4();
    self.subjects.push(Subject {
      subject_id,
      course_id,
      name: name.into(),
      created_at: Utc::now(),
    });
    subject_id
  }

  fn add_session(&mut self, subject_id: Uuid, date: &str) -> Uuid {
    let session_id = Uuid::new_v4();
    self.sessions.push(AttendanceSession {
      session_id,
      subject_id,
      date: day(date),
    });
    session_id
  }

  fn mark(&mut self, session_id: Uuid, student_id: Uuid, present: bool) {
    self.records.push(AttendanceRecord {
      record_id: Uuid::new_v4(),
      session_id,
      student_id,
      present,
    });
  }

  /// Add `total` sessions of `subject_id`, marking the first `present` of
  /// them present for `student_id`.
  fn attend(&mut self, subject_id: Uuid, student_id: Uuid, total: usize, present: usize) {
    for i in 0..total {
      let date = format!("2024-01-{:02}", i + 1);
      let session = self.add_session(subject_id, &date);
      self.mark(session, student_id, i < present);
    }
  }

  fn queries(&self) -> usize { self.queries.load(Ordering::SeqCst) }

  fn touch(&self) -> Result<()> {
    self.queries.fetch_add(1, Ordering::SeqCst);
    if self.offline.load(Ordering::SeqCst) {
      return Err(Error::store(Offline));
    }
    Ok(())
  }

  fn require_student(&self, student_id: Uuid) -> Result<()> {
    if self.students.iter().any(|s| s.student_id == student_id) {
      Ok(())
    } else {
      Err(Error::StudentNotFound(student_id))
    }
  }

  fn session(&self, session_id: Uuid) -> &AttendanceSession {
    self
      .sessions
      .iter()
      .find(|s| s.session_id == session_id)
      .expect("record points at a known session")
  }
}

impl AttendanceStore for MemoryStore {
  type Error = Error;

  async fn get_student(&self, student_id: Uuid) -> Result<Option<Student>> {
    self.touch()?;
    Ok(self.students.iter().find(|s| s.student_id == student_id).cloned())
  }

  async fn get_subject(&self, subject_id: Uuid) -> Result<Option<Subject>> {
    self.touch()?;
    Ok(self.subjects.iter().find(|s| s.subject_id == subject_id).cloned())
  }

  async fn subjects_for_course(&self, course_id: Uuid) -> Result<Vec<Subject>> {
    self.touch()?;
    Ok(self.subjects.iter().filter(|s| s.course_id == course_id).cloned().collect())
  }

  async fn records_for_student(&self, student_id: Uuid) -> Result<Vec<AttendanceRecord>> {
    self.touch()?;
    self.require_student(student_id)?;
    Ok(self.records.iter().filter(|r| r.student_id == student_id).cloned().collect())
  }

  async fn records_for_student_in_subject(
    &self,
    student_id: Uuid,
    subject_id: Uuid,
  ) -> Result<Vec<AttendanceRecord>> {
    self.touch()?;
    self.require_student(student_id)?;
    Ok(
      self
        .records
        .iter()
        .filter(|r| r.student_id == student_id)
        .filter(|r| self.session(r.session_id).subject_id == subject_id)
        .cloned()
        .collect(),
    )
  }

  async fn records_for_student_in_range(
    &self,
    student_id: Uuid,
    subject_id: Uuid,
    range: DateRange,
  ) -> Result<Vec<SessionRecord>> {
    self.touch()?;
    self.require_student(student_id)?;
    let mut rows: Vec<SessionRecord> = self
      .records
      .iter()
      .filter(|r| r.student_id == student_id)
      .map(|r| SessionRecord { session: self.session(r.session_id).clone(), record: r.clone() })
      .filter(|row| row.session.subject_id == subject_id && range.contains(row.session.date))
      .collect();
    rows.sort_by_key(|row| row.session.date);
    Ok(rows)
  }
}

fn day(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

fn service(store: MemoryStore) -> ReportService<MemoryStore> {
  ReportService::new(Arc::new(store), ReportCache::with_ttl(Duration::from_secs(3600)))
}

// ─── Overall ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn overall_with_no_records_is_zero() {
  let mut store = MemoryStore::default();
  let course = Uuid::new_v4();
  let student = store.add_student(course);
  store.add_subject(course, "History");

  let report = compute_overall(&store, student).await.unwrap();
  assert_eq!(report.total_attendance, 0);
  assert_eq!(report.percent_present, 0);
  assert_eq!(report.percent_absent, 0);
  assert_eq!(report.total_subjects, 1);
  assert_eq!(report.subjects[0].total(), 0);
}

#[tokio::test]
async fn overall_seven_of_ten() {
  let mut store = MemoryStore::default();
  let course = Uuid::new_v4();
  let student = store.add_student(course);
  let maths = store.add_subject(course, "Maths");
  store.attend(maths, student, 10, 7);

  let report = compute_overall(&store, student).await.unwrap();
  assert_eq!(report.total_attendance, 10);
  assert_eq!(report.total_present, 7);
  assert_eq!(report.percent_present, 70);
  assert_eq!(report.percent_absent, 30);
}

#[tokio::test]
async fn overall_one_of_three() {
  let mut store = MemoryStore::default();
  let course = Uuid::new_v4();
  let student = store.add_student(course);
  let maths = store.add_subject(course, "Maths");
  store.attend(maths, student, 3, 1);

  let report = compute_overall(&store, student).await.unwrap();
  assert_eq!(report.percent_present, 33);
  assert_eq!(report.percent_absent, 67);
}

#[tokio::test]
async fn subject_breakdown_sums_to_totals_in_subject_order() {
  let mut store = MemoryStore::default();
  let course = Uuid::new_v4();
  let student = store.add_student(course);
  let other_student = store.add_student(course);
  let chemistry = store.add_subject(course, "Chemistry");
  let biology = store.add_subject(course, "Biology");
  let art = store.add_subject(course, "Art");
  store.add_subject(Uuid::new_v4(), "Not in this course");

  store.attend(chemistry, student, 4, 3);
  store.attend(biology, student, 5, 1);
  store.attend(art, other_student, 6, 6);

  let report = compute_overall(&store, student).await.unwrap();
  let names: Vec<&str> = report.subjects.iter().map(|s| s.name.as_str()).collect();
  assert_eq!(names, ["Chemistry", "Biology", "Art"]);

  assert_eq!((report.subjects[0].present, report.subjects[0].absent), (3, 1));
  assert_eq!((report.subjects[1].present, report.subjects[1].absent), (1, 4));
  assert_eq!((report.subjects[2].present, report.subjects[2].absent), (0, 0));

  let present: usize = report.subjects.iter().map(|s| s.present).sum();
  let total: usize = report.subjects.iter().map(|s| s.total()).sum();
  assert_eq!(present, report.total_present);
  assert_eq!(total, report.total_attendance);
  assert_eq!(report.percent_present, 44);
  assert_eq!(report.percent_absent, 56);
}

#[tokio::test]
async fn overall_for_unknown_student_is_not_found() {
  let store = MemoryStore::default();
  let id = Uuid::new_v4();
  let err = compute_overall(&store, id).await.unwrap_err();
  assert!(matches!(err, Error::StudentNotFound(got) if got == id));
  assert!(err.is_user_facing());
}

// ─── Range ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn range_single_record_in_january() {
  let mut store = MemoryStore::default();
  let course = Uuid::new_v4();
  let student = store.add_student(course);
  let subject = store.add_subject(course, "Geography");
  let session = store.add_session(subject, "2024-01-15");
  store.mark(session, student, true);

  let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
  let report = compute_range(&store, student, subject, range).await.unwrap();
  assert_eq!(report.entries, [RangeEntry { date: day("2024-01-15"), status: true }]);

  let json = serde_json::to_string(&report.entries).unwrap();
  assert_eq!(json, r#"[{"date":"2024-01-15","status":true}]"#);
}

#[tokio::test]
async fn range_is_inclusive_ordered_and_skips_unrecorded_sessions() {
  let mut store = MemoryStore::default();
  let course = Uuid::new_v4();
  let student = store.add_student(course);
  let subject = store.add_subject(course, "Geography");

  let late = store.add_session(subject, "2024-03-31");
  let early = store.add_session(subject, "2024-03-01");
  let middle = store.add_session(subject, "2024-03-10");
  store.add_session(subject, "2024-03-15");
  let outside = store.add_session(subject, "2024-04-01");

  store.mark(late, student, false);
  store.mark(early, student, true);
  store.mark(middle, student, true);
  store.mark(outside, student, true);

  let range = DateRange::parse("2024-03-01", "2024-03-31").unwrap();
  let report = compute_range(&store, student, subject, range).await.unwrap();
  assert_eq!(
    report.entries,
    [
      RangeEntry { date: day("2024-03-01"), status: true },
      RangeEntry { date: day("2024-03-10"), status: true },
      RangeEntry { date: day("2024-03-31"), status: false },
    ]
  );
}

#[tokio::test]
async fn range_over_empty_window_is_empty() {
  let mut store = MemoryStore::default();
  let course = Uuid::new_v4();
  let student = store.add_student(course);
  let subject = store.add_subject(course, "Geography");
  store.attend(subject, student, 5, 5);

  let range = DateRange::parse("2023-06-01", "2023-06-30").unwrap();
  let report = compute_range(&store, student, subject, range).await.unwrap();
  assert!(report.entries.is_empty());
}

#[tokio::test]
async fn range_for_unknown_subject_is_not_found() {
  let mut store = MemoryStore::default();
  let student = store.add_student(Uuid::new_v4());
  let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();

  let err = compute_range(&store, student, Uuid::new_v4(), range).await.unwrap_err();
  assert!(matches!(err, Error::SubjectNotFound(_)));
}

// ─── Service ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn service_serves_overall_from_cache_until_ttl() {
  let mut store = MemoryStore::default();
  let course = Uuid::new_v4();
  let student = store.add_student(course);
  let subject = store.add_subject(course, "Music");
  store.attend(subject, student, 2, 1);
  let service = service(store);

  let first = service.overall(student).await.unwrap();
  let after_first = service.store().queries();
  assert!(after_first > 0);

  let second = service.overall(student).await.unwrap();
  assert_eq!(first, second);
  assert_eq!(service.store().queries(), after_first);

  tokio::time::advance(Duration::from_secs(3600)).await;
  service.overall(student).await.unwrap();
  assert_eq!(service.store().queries(), after_first * 2);
}

#[tokio::test(start_paused = true)]
async fn service_caches_range_per_window() {
  let mut store = MemoryStore::default();
  let course = Uuid::new_v4();
  let student = store.add_student(course);
  let subject = store.add_subject(course, "Music");
  store.attend(subject, student, 20, 10);
  let service = service(store);

  let jan = service.range(student, subject, "2024-01-01", "2024-01-10").await.unwrap();
  assert_eq!(jan.entries.len(), 10);
  let after_first = service.store().queries();

  service.range(student, subject, "2024-01-01", "2024-01-10").await.unwrap();
  assert_eq!(service.store().queries(), after_first);

  let later = service.range(student, subject, "2024-01-11", "2024-01-31").await.unwrap();
  assert_eq!(later.entries.len(), 10);
  assert!(later.entries.iter().all(|e| !e.status));
  assert!(service.store().queries() > after_first);
}

#[tokio::test]
async fn service_rejects_inverted_range_without_querying() {
  let mut store = MemoryStore::default();
  let course = Uuid::new_v4();
  let student = store.add_student(course);
  let subject = store.add_subject(course, "Music");
  let service = service(store);

  let err = service
    .range(student, subject, "2024-02-01", "2024-01-01")
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidDateRange(_)));

  let err = service.range(student, subject, "01/01/2024", "2024-01-31").await.unwrap_err();
  assert!(matches!(err, Error::InvalidDateRange(_)));
  assert_eq!(service.store().queries(), 0);
}

#[tokio::test]
async fn service_does_not_cache_failures() {
  let service = service(MemoryStore::default());
  let student = Uuid::new_v4();

  assert!(service.overall(student).await.unwrap_err().is_not_found());
  let after_first = service.store().queries();
  assert!(service.overall(student).await.unwrap_err().is_not_found());
  assert_eq!(service.store().queries(), after_first * 2);
  assert!(service.cache().is_empty().await);
}

#[tokio::test]
async fn store_failure_propagates_as_unavailable() {
  let mut store = MemoryStore::default();
  let student = store.add_student(Uuid::new_v4());
  store.offline.store(true, Ordering::SeqCst);
  let service = service(store);

  let err = service.overall(student).await.unwrap_err();
  assert!(matches!(err, Error::StoreUnavailable(_)));
  assert!(!err.is_user_facing());
  assert_eq!(service.store().queries(), 1);
}

/// Formatted log output collected in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for Captured {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    self.0.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
}

impl<'a> MakeWriter<'a> for Captured {
  type Writer = Captured;

  fn make_writer(&'a self) -> Self::Writer { self.clone() }
}

impl Captured {
  fn line(&self, message: &str) -> String {
    let bytes = self.0.lock().unwrap().clone();
    String::from_utf8(bytes)
      .unwrap()
      .lines()
      .find(|line| line.contains(message))
      .unwrap_or_default()
      .to_string()
  }
}

#[tokio::test]
async fn failures_log_warn_when_user_facing_and_error_otherwise() {
  let logs = Captured::default();
  let subscriber = tracing_subscriber::fmt()
    .with_writer(logs.clone())
    .with_ansi(false)
    .with_max_level(tracing::Level::DEBUG)
    .finish();
  let _guard = tracing::subscriber::set_default(subscriber);

  let mut store = MemoryStore::default();
  let student = store.add_student(Uuid::new_v4());
  store.offline.store(true, Ordering::SeqCst);
  let service = service(store);

  service.overall(student).await.unwrap_err();
  service.range(student, Uuid::new_v4(), "2024-02-01", "2024-01-01").await.unwrap_err();

  assert!(logs.line("report request rejected").contains("WARN"));
  assert!(logs.line("report computation failed").contains("ERROR"));
}

#[tokio::test]
async fn subjects_lists_the_student_course() {
  let mut store = MemoryStore::default();
  let course = Uuid::new_v4();
  let student = store.add_student(course);
  store.add_subject(course, "Drama");
  store.add_subject(course, "Latin");
  store.add_subject(Uuid::new_v4(), "Elsewhere");
  let service = service(store);

  let subjects = service.subjects(student).await.unwrap();
  let names: Vec<&str> = subjects.iter().map(|s| s.name.as_str()).collect();
  assert_eq!(names, ["Drama", "Latin"]);

  let err = service.subjects(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::StudentNotFound(_)));
}
