//! Handlers for the directory plumbing: users, terms, classes, groups,
//! study areas, and enrollments.
//!
//! These are plain record operations with no privilege logic of their own —
//! they exist so the engine has data to decide over. All of them are
//! admin-only except the single-record reads.

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use kelas_core::{
  Error,
  id::{ClassId, EnrollmentId, TermId, UserId},
  record::{Class, EnrollmentStatus, NewUser, User},
  role::GlobalRole,
  store::ClassStore,
};
use rand_core::OsRng;
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
  pub name:     String,
  pub role:     GlobalRole,
  /// Plaintext password to hash on the way in; omitted for accounts that
  /// never log in directly.
  pub password: Option<String>,
}

/// `POST /users` — admin only.
pub async fn create_user<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, ApiError> {
  current.require_admin()?;

  let password_hash = body
    .password
    .as_deref()
    .map(|password| {
      let salt = SaltString::generate(&mut OsRng);
      Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::BadRequest(format!("unusable password: {e}")))
    })
    .transpose()?;

  let user = state
    .engine
    .store()
    .add_user(NewUser { name: body.name, role: body.role, password_hash })
    .await
    .map_err(Error::store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/{id}` — any authenticated user.
pub async fn get_user<S: ClassStore>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
  Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
  let user = state
    .engine
    .store()
    .get_user(id.clone())
    .await
    .map_err(Error::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}

// ─── Terms ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateTermBody {
  pub name: String,
}

/// `POST /terms` — admin only.
pub async fn create_term<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<CreateTermBody>,
) -> Result<impl IntoResponse, ApiError> {
  current.require_admin()?;
  let term =
    state.engine.store().add_term(body.name).await.map_err(Error::store)?;
  Ok((StatusCode::CREATED, Json(term)))
}

// ─── Classes ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateClassBody {
  pub term_id: TermId,
  pub name:    String,
}

/// `POST /classes` — admin only.
pub async fn create_class<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<CreateClassBody>,
) -> Result<impl IntoResponse, ApiError> {
  current.require_admin()?;
  let class = state
    .engine
    .store()
    .add_class(body.term_id, body.name)
    .await
    .map_err(Error::store)?;
  Ok((StatusCode::CREATED, Json(class)))
}

/// `GET /classes/{id}` — any authenticated user.
pub async fn get_class<S: ClassStore>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
  Path(id): Path<ClassId>,
) -> Result<Json<Class>, ApiError> {
  let class = state
    .engine
    .store()
    .get_class(id.clone())
    .await
    .map_err(Error::store)?
    .ok_or_else(|| ApiError::NotFound(format!("class {id} not found")))?;
  Ok(Json(class))
}

// ─── Groups and study areas ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateNamedBody {
  pub name: String,
}

/// `POST /classes/{id}/groups` — requires the manage-groups capability.
pub async fn create_group<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(class_id): Path<ClassId>,
  Json(body): Json<CreateNamedBody>,
) -> Result<impl IntoResponse, ApiError> {
  let allowed = state
    .engine
    .allows(
      &current.0.user_id,
      &class_id,
      kelas_core::engine::Capability::ManageGroups,
    )
    .await?;
  if !allowed {
    return Err(ApiError::Forbidden("manage-groups capability required".into()));
  }

  let group = state
    .engine
    .store()
    .add_group(class_id, body.name)
    .await
    .map_err(Error::store)?;
  Ok((StatusCode::CREATED, Json(group)))
}

/// `POST /classes/{id}/study-areas` — admin only.
pub async fn create_study_area<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(class_id): Path<ClassId>,
  Json(body): Json<CreateNamedBody>,
) -> Result<impl IntoResponse, ApiError> {
  current.require_admin()?;
  let area = state
    .engine
    .store()
    .add_study_area(class_id, body.name)
    .await
    .map_err(Error::store)?;
  Ok((StatusCode::CREATED, Json(area)))
}

// ─── Enrollments ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentBody {
  pub user_id: UserId,
  pub term_id: TermId,
}

/// `POST /classes/{id}/enrollments` — admin only.
pub async fn create_enrollment<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(class_id): Path<ClassId>,
  Json(body): Json<CreateEnrollmentBody>,
) -> Result<impl IntoResponse, ApiError> {
  current.require_admin()?;
  let enrollment = state
    .engine
    .store()
    .enroll(body.user_id, class_id, body.term_id)
    .await
    .map_err(Error::store)?;
  Ok((StatusCode::CREATED, Json(enrollment)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateEnrollmentBody {
  pub status: EnrollmentStatus,
}

/// `PATCH /enrollments/{id}` — admin only.
pub async fn update_enrollment_status<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<EnrollmentId>,
  Json(body): Json<UpdateEnrollmentBody>,
) -> Result<StatusCode, ApiError> {
  current.require_admin()?;
  state
    .engine
    .store()
    .set_enrollment_status(id, body.status)
    .await
    .map_err(Error::store)?;
  Ok(StatusCode::NO_CONTENT)
}
