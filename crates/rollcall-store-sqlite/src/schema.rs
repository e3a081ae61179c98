//! SQL schema for the Rollcall SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS courses (
    course_id   TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS students (
    student_id  TEXT PRIMARY KEY,
    course_id   TEXT NOT NULL REFERENCES courses(course_id),
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Subjects iterate in rowid (creation) order.
CREATE TABLE IF NOT EXISTS subjects (
    subject_id  TEXT PRIMARY KEY,
    course_id   TEXT NOT NULL REFERENCES courses(course_id),
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS attendance_sessions (
    session_id  TEXT PRIMARY KEY,
    subject_id  TEXT NOT NULL REFERENCES subjects(subject_id),
    date        TEXT NOT NULL    -- YYYY-MM-DD, sorts lexically
);

-- One record per (session, student).
CREATE TABLE IF NOT EXISTS attendance_records (
    record_id   TEXT PRIMARY KEY,
    session_id  TEXT NOT NULL REFERENCES attendance_sessions(session_id),
    student_id  TEXT NOT NULL REFERENCES students(student_id),
    present     INTEGER NOT NULL CHECK (present IN (0, 1)),
    UNIQUE (session_id, student_id)
);

CREATE INDEX IF NOT EXISTS students_course_idx  ON students(course_id);
CREATE INDEX IF NOT EXISTS subjects_course_idx  ON subjects(course_id);
CREATE INDEX IF NOT EXISTS sessions_subject_idx ON attendance_sessions(subject_id, date);
CREATE INDEX IF NOT EXISTS records_student_idx  ON attendance_records(student_id);

PRAGMA user_version = 1;
";
