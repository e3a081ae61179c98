//! Core types and logic for Rollcall attendance reporting.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::AttendanceStore`]; the aggregation, range reporting and
//! caching built on top of it live here.

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod model;
pub mod range;
pub mod service;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
