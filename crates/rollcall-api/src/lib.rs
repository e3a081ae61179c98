//! JSON API for Rollcall attendance reports.
//!
//! Exposes an axum [`Router`] backed by a [`ReportService`] over any
//! [`AttendanceStore`]. Auth, TLS, and page rendering are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rollcall_api::api_router(service.clone()))
//! ```

pub mod attendance;
pub mod error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use rollcall_core::{cache::CacheConfig, service::ReportService, store::AttendanceStore};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub cache:      CacheConfig,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: Arc<ReportService<S>>) -> Router<()>
where
  S: AttendanceStore + 'static,
{
  Router::new()
    .route("/students/{id}/attendance", get(attendance::overall::<S>))
    .route("/students/{id}/attendance/range", post(attendance::range::<S>))
    .route("/students/{id}/subjects", get(attendance::subjects::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(service)
}

// ─── Cache maintenance ───────────────────────────────────────────────────────

/// Periodically drop expired entries from the service's report cache.
pub fn spawn_cache_purge<S>(service: Arc<ReportService<S>>, every: Duration) -> JoinHandle<()>
where
  S: AttendanceStore + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    loop {
      ticker.tick().await;
      let purged = service.cache().purge_expired().await;
      if purged > 0 {
        tracing::debug!(purged, "purged expired report cache entries");
      }
    }
  })
}

// ─── Integration tests ────────────────────────────────────────────────────────
