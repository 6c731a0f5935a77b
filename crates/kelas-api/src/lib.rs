//! JSON HTTP surface for Kelas.
//!
//! Exposes an axum [`Router`] backed by any [`kelas_core::store::ClassStore`]
//! through the authorization engine. Every privilege decision goes through
//! the engine; no handler re-derives role logic of its own.

pub mod auth;
pub mod directory;
pub mod error;
pub mod privileges;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use kelas_core::{Engine, store::ClassStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Server configuration, loaded from `config.toml` and `KELAS_*` env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".into(),
      port:       8270,
      store_path: PathBuf::from("kelas.db"),
    }
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared application state.
pub struct AppState<S> {
  pub engine: Engine<S>,
  pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { engine: self.engine.clone(), config: self.config.clone() }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised router for `state`.
pub fn router<S>(state: AppState<S>) -> Router<()>
where
  S: ClassStore + Send + Sync + 'static,
{
  Router::new()
    // Directory plumbing (admin only)
    .route("/users", post(directory::create_user::<S>))
    .route("/users/{id}", get(directory::get_user::<S>))
    .route("/terms", post(directory::create_term::<S>))
    .route("/classes", post(directory::create_class::<S>))
    .route("/classes/{id}", get(directory::get_class::<S>))
    .route("/classes/{id}/groups", post(directory::create_group::<S>))
    .route(
      "/classes/{id}/study-areas",
      post(directory::create_study_area::<S>),
    )
    .route(
      "/classes/{id}/enrollments",
      post(directory::create_enrollment::<S>),
    )
    .route(
      "/enrollments/{id}",
      patch(directory::update_enrollment_status::<S>),
    )
    // Privilege queries
    .route(
      "/classes/{class}/members/{user}/privileges",
      get(privileges::member_privileges::<S>),
    )
    .route(
      "/classes/{class}/members/{user}/can/{capability}",
      get(privileges::capability_check::<S>),
    )
    // Privilege mutations
    .route(
      "/classes/{class}/instructor-roles",
      put(privileges::assign_instructor_role::<S>)
        .delete(privileges::remove_instructor_role::<S>),
    )
    .route(
      "/classes/{class}/general-leader",
      put(privileges::assign_general_leader::<S>),
    )
    .route(
      "/classes/{class}/student-roles",
      put(privileges::assign_student_role::<S>)
        .delete(privileges::remove_student_role::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};
  use tower::ServiceExt as _;

  use super::*;

  #[tokio::test]
  async fn mutation_routes_require_credentials() {
    let store =
      Arc::new(kelas_store_sqlite::SqliteStore::open_in_memory().await.unwrap());
    let state = AppState {
      engine: Engine::new(store),
      config: Arc::new(ServerConfig::default()),
    };
    let app = router(state);

    let response = app
      .oneshot(
        Request::builder()
          .method("PUT")
          .uri("/classes/c-1/general-leader")
          .header("content-type", "application/json")
          .body(Body::from(r#"{"user_id":"u-1"}"#))
          .unwrap(),
      )
      .await
      .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("www-authenticate"));
  }
}
