//! [`SqliteStore`]: the SQLite implementation of [`AttendanceStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use rollcall_core::{
  model::{AttendanceRecord, AttendanceSession, Course, SessionRecord, Student, Subject},
  range::DateRange,
  store::AttendanceStore,
};

use crate::{
  encode::{
    RawCourse, RawRecord, RawSessionRecord, RawStudent, RawSubject, encode_date, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Attendance data backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for testing.
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

  /// Whether `id` is present in `table.column`. Both names are compile-time
  /// constants, never caller input.
  async fn exists(&self, table: &'static str, column: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let sql = format!("SELECT 1 FROM {table} WHERE {column} = ?1");

    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(found)
  }

  async fn require_course(&self, id: Uuid) -> Result<()> {
    if self.exists("courses", "course_id", id).await? {
      Ok(())
    } else {
      Err(Error::CourseNotFound(id))
    }
  }

  async fn require_student(&self, id: Uuid) -> Result<()> {
    if self.exists("students", "student_id", id).await? {
      Ok(())
    } else {
      Err(rollcall_core::Error::StudentNotFound(id).into())
    }
  }

  async fn require_subject(&self, id: Uuid) -> Result<()> {
    if self.exists("subjects", "subject_id", id).await? {
      Ok(())
    } else {
      Err(rollcall_core::Error::SubjectNotFound(id).into())
    }
  }

  async fn require_session(&self, id: Uuid) -> Result<()> {
    if self.exists("attendance_sessions", "session_id", id).await? {
      Ok(())
    } else {
      Err(rollcall_core::Error::SessionNotFound(id).into())
    }
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Create and persist a new course.
  pub async fn add_course(&self, name: impl Into<String>) -> Result<Course> {
    let course = Course {
      course_id:  Uuid::new_v4(),
      name:       name.into(),
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(course.course_id);
    let name   = course.name.clone();
    let at_str = encode_dt(course.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO courses (course_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(course)
  }

  /// Retrieve a course by UUID. Returns `None` if not found.
  pub async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCourse> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT course_id, name, created_at FROM courses WHERE course_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawCourse {
                  course_id:  row.get(0)?,
                  name:       row.get(1)?,
                  created_at: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCourse::into_course).transpose()
  }

  /// Enrol a new student in an existing course.
  pub async fn add_student(&self, course_id: Uuid, name: impl Into<String>) -> Result<Student> {
    self.require_course(course_id).await?;

    let student = Student {
      student_id: Uuid::new_v4(),
      course_id,
      name: name.into(),
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(student.student_id);
    let course_str = encode_uuid(course_id);
    let name       = student.name.clone();
    let at_str     = encode_dt(student.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO students (student_id, course_id, name, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, course_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(student)
  }

  /// Add a subject to an existing course.
  pub async fn add_subject(&self, course_id: Uuid, name: impl Into<String>) -> Result<Subject> {
    self.require_course(course_id).await?;

    let subject = Subject {
      subject_id: Uuid::new_v4(),
      course_id,
      name: name.into(),
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(subject.subject_id);
    let course_str = encode_uuid(course_id);
    let name       = subject.name.clone();
    let at_str     = encode_dt(subject.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (subject_id, course_id, name, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, course_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(subject)
  }

  /// Schedule a session of `subject_id` on `date`.
  pub async fn add_session(&self, subject_id: Uuid, date: NaiveDate) -> Result<AttendanceSession> {
    self.require_subject(subject_id).await?;

    let session = AttendanceSession { session_id: Uuid::new_v4(), subject_id, date };

    let id_str      = encode_uuid(session.session_id);
    let subject_str = encode_uuid(subject_id);
    let date_str    = encode_date(date);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attendance_sessions (session_id, subject_id, date) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, subject_str, date_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  /// Mark a student present or absent for a session.
  ///
  /// Taking the register again for the same session overwrites the earlier
  /// mark and keeps its `record_id`.
  pub async fn record_attendance(
    &self,
    session_id: Uuid,
    student_id: Uuid,
    present:    bool,
  ) -> Result<AttendanceRecord> {
    self.require_session(session_id).await?;
    self.require_student(student_id).await?;

    let new_id_str  = encode_uuid(Uuid::new_v4());
    let session_str = encode_uuid(session_id);
    let student_str = encode_uuid(student_id);

    let raw: RawRecord = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO attendance_records (record_id, session_id, student_id, present)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (session_id, student_id) DO UPDATE SET present = excluded.present
           RETURNING record_id, session_id, student_id, present",
          rusqlite::params![new_id_str, session_str, student_str, present],
          RawRecord::from_row,
        )?)
      })
      .await?;

    raw.into_record()
  }
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = Error;

  // ── Reference data ────────────────────────────────────────────────────────

  async fn get_student(&self, student_id: Uuid) -> Result<Option<Student>> {
    let id_str = encode_uuid(student_id);

    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT student_id, course_id, name, created_at
               FROM students WHERE student_id = ?1",
              rusqlite::params![id_str],
              RawStudent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStudent::into_student).transpose()
  }

  async fn get_subject(&self, subject_id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(subject_id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT subject_id, course_id, name, created_at
               FROM subjects WHERE subject_id = ?1",
              rusqlite::params![id_str],
              RawSubject::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn subjects_for_course(&self, course_id: Uuid) -> Result<Vec<Subject>> {
    let id_str = encode_uuid(course_id);

    let raws: Vec<RawSubject> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subject_id, course_id, name, created_at
           FROM subjects WHERE course_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  // ── Records ───────────────────────────────────────────────────────────────

  async fn records_for_student(&self, student_id: Uuid) -> Result<Vec<AttendanceRecord>> {
    self.require_student(student_id).await?;
    let id_str = encode_uuid(student_id);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT record_id, session_id, student_id, present
           FROM attendance_records WHERE student_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn records_for_student_in_subject(
    &self,
    student_id: Uuid,
    subject_id: Uuid,
  ) -> Result<Vec<AttendanceRecord>> {
    self.require_student(student_id).await?;
    self.require_subject(subject_id).await?;
    let student_str = encode_uuid(student_id);
    let subject_str = encode_uuid(subject_id);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT r.record_id, r.session_id, r.student_id, r.present
           FROM attendance_records r
           JOIN attendance_sessions s ON s.session_id = r.session_id
           WHERE r.student_id = ?1
             AND s.subject_id = ?2
           ORDER BY s.date, r.rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![student_str, subject_str], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn records_for_student_in_range(
    &self,
    student_id: Uuid,
    subject_id: Uuid,
    range:      DateRange,
  ) -> Result<Vec<SessionRecord>> {
    self.require_student(student_id).await?;
    self.require_subject(subject_id).await?;
    let student_str = encode_uuid(student_id);
    let subject_str = encode_uuid(subject_id);
    let start_str   = encode_date(range.start());
    let end_str     = encode_date(range.end());

    let raws: Vec<RawSessionRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT s.session_id, s.subject_id, s.date,
                  r.record_id, r.student_id, r.present
           FROM attendance_sessions s
           JOIN attendance_records r ON r.session_id = s.session_id
           WHERE r.student_id = ?1
             AND s.subject_id = ?2
             AND s.date BETWEEN ?3 AND ?4
           ORDER BY s.date, s.rowid",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![student_str, subject_str, start_str, end_str],
            RawSessionRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSessionRecord::into_session_record).collect()
  }
}
