//! SQLite backend for Rollcall attendance data.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Besides the read-only
//! [`AttendanceStore`](rollcall_core::store::AttendanceStore) queries, the
//! store exposes the writes a timetabling or register-taking workflow needs
//! to populate it.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
