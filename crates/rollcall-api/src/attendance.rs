//! Handlers for `/students/{id}/...` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/students/{id}/attendance` | Overall percentages plus per-subject chart series |
//! | `GET`  | `/students/{id}/subjects` | Subjects of the student's course |
//! | `POST` | `/students/{id}/attendance/range` | Form: `subject`, `start_date`, `end_date` |

use std::sync::Arc;

use axum::{
  Form, Json,
  extract::{FromRequestParts, Path, State},
  http::request::Parts,
};
use rollcall_core::{
  aggregate::{AggregateReport, ChartSeries},
  model::Subject,
  range::RangeEntry,
  service::ReportService,
  store::AttendanceStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Extractors ───────────────────────────────────────────────────────────────

/// The `{id}` path segment as a student UUID. A malformed id is rejected
/// with the same JSON error body as every other failure.
pub struct StudentId(pub Uuid);

impl<T> FromRequestParts<T> for StudentId
where
  T: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &T) -> Result<Self, Self::Rejection> {
    let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
      .await
      .map_err(|rejection| {
        ApiError::BadRequest(format!("invalid student id: {}", rejection.body_text()))
      })?;
    Ok(Self(id))
  }
}

// ─── Overall ──────────────────────────────────────────────────────────────────

/// The homepage summary: the report itself plus the same per-subject counts
/// laid out for a bar chart.
#[derive(Debug, Serialize)]
pub struct OverallResponse {
  #[serde(flatten)]
  pub report: AggregateReport,
  pub chart:  ChartSeries,
}

/// `GET /students/{id}/attendance`
pub async fn overall<S>(
  State(service): State<Arc<ReportService<S>>>,
  StudentId(student_id): StudentId,
) -> Result<Json<OverallResponse>, ApiError>
where
  S: AttendanceStore,
{
  let report = service.overall(student_id).await?;
  let chart = report.chart_series();
  Ok(Json(OverallResponse { report, chart }))
}

// ─── Subjects ─────────────────────────────────────────────────────────────────

/// `GET /students/{id}/subjects`
pub async fn subjects<S>(
  State(service): State<Arc<ReportService<S>>>,
  StudentId(student_id): StudentId,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: AttendanceStore,
{
  Ok(Json(service.subjects(student_id).await?))
}

// ─── Range ────────────────────────────────────────────────────────────────────

/// Fields of the "view attendance" form. Missing fields arrive as empty
/// strings and fail validation below rather than in the extractor.
#[derive(Debug, Deserialize)]
pub struct RangeForm {
  #[serde(default)]
  pub subject:    String,
  #[serde(default)]
  pub start_date: String,
  #[serde(default)]
  pub end_date:   String,
}

/// `POST /students/{id}/attendance/range`, returning `[{"date":..,"status":..}]`
pub async fn range<S>(
  State(service): State<Arc<ReportService<S>>>,
  StudentId(student_id): StudentId,
  Form(form): Form<RangeForm>,
) -> Result<Json<Vec<RangeEntry>>, ApiError>
where
  S: AttendanceStore,
{
  let subject_id = Uuid::parse_str(form.subject.trim())
    .map_err(|_| ApiError::BadRequest(format!("invalid subject id: {:?}", form.subject)))?;

  let report = service
    .range(student_id, subject_id, &form.start_date, &form.end_date)
    .await?;
  Ok(Json(report.entries))
}
