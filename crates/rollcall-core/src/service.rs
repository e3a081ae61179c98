//! [`ReportService`]: the cache-fronted entry point for callers.
//!
//! Every report request checks the [`ReportCache`] first and only falls
//! through to the store on a miss. Failed computations are never cached.

use std::sync::Arc;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  aggregate::{AggregateReport, compute_overall},
  cache::{CacheKey, ReportCache},
  error::lift,
  model::Subject,
  range::{DateRange, RangeReport, compute_range},
  store::AttendanceStore,
};

/// A cached report of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedReport {
  Overall(AggregateReport),
  Range(RangeReport),
}

/// Aggregation and range reporting over `S`, memoised in a [`ReportCache`].
pub struct ReportService<S> {
  store: Arc<S>,
  cache: ReportCache<CachedReport>,
}

impl<S: AttendanceStore> ReportService<S> {
  pub fn new(store: Arc<S>, cache: ReportCache<CachedReport>) -> Self {
    Self { store, cache }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn cache(&self) -> &ReportCache<CachedReport> { &self.cache }

  /// The homepage summary for a student.
  pub async fn overall(&self, student_id: Uuid) -> Result<AggregateReport> {
    let key = CacheKey::overall(student_id);
    if let Some(CachedReport::Overall(report)) = self.cache.get(&key).await {
      return Ok(report);
    }

    let report = compute_overall(&*self.store, student_id)
      .await
      .inspect_err(|e| log_failure("overall", e))?;
    self.cache.put(key, CachedReport::Overall(report.clone())).await;
    Ok(report)
  }

  /// A student's attendance for one subject between two `YYYY-MM-DD` dates.
  ///
  /// The bounds are validated before the cache or store is consulted.
  pub async fn range(
    &self,
    student_id: Uuid,
    subject_id: Uuid,
    start: &str,
    end: &str,
  ) -> Result<RangeReport> {
    let range = DateRange::parse(start, end).inspect_err(|e| log_failure("range", e))?;
    self.range_in(student_id, subject_id, range).await
  }

  /// As [`Self::range`], for an already-validated range.
  pub async fn range_in(
    &self,
    student_id: Uuid,
    subject_id: Uuid,
    range: DateRange,
  ) -> Result<RangeReport> {
    let key = CacheKey::range(student_id, subject_id, range);
    if let Some(CachedReport::Range(report)) = self.cache.get(&key).await {
      return Ok(report);
    }

    let report = compute_range(&*self.store, student_id, subject_id, range)
      .await
      .inspect_err(|e| log_failure("range", e))?;
    self.cache.put(key, CachedReport::Range(report.clone())).await;
    Ok(report)
  }

  /// The subjects of the student's course, for picking a range report.
  pub async fn subjects(&self, student_id: Uuid) -> Result<Vec<Subject>> {
    let student = self
      .store
      .get_student(student_id)
      .await
      .map_err(lift)?
      .ok_or(Error::StudentNotFound(student_id))?;

    let subjects = self
      .store
      .subjects_for_course(student.course_id)
      .await
      .map_err(lift)?;
    debug!(%student_id, subjects = subjects.len(), "listed course subjects");
    Ok(subjects)
  }
}

fn log_failure(report: &str, err: &Error) {
  if err.is_user_facing() {
    warn!(report, error = %err, "report request rejected");
  } else {
    error!(report, error = %err, "report computation failed");
  }
}
