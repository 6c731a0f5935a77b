//! Handlers for privilege queries and the assignment protocol.
//!
//! The mutation handlers forward straight into the engine's protocol
//! methods; the actor is always the authenticated user — never a field of
//! the request body.

use std::{collections::BTreeSet, str::FromStr};

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use kelas_core::{
  engine::Capability,
  grant::GrantScope,
  id::{ClassId, GroupId, StudyAreaId, UserId},
  role::{InstructorRole, StudentRole},
  store::ClassStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── Queries ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MemberPrivileges {
  pub actively_enrolled: bool,
  pub instructor:        BTreeSet<InstructorRole>,
  pub student:           BTreeSet<StudentRole>,
}

/// `GET /classes/{class}/members/{user}/privileges`
pub async fn member_privileges<S: ClassStore>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
  Path((class, user)): Path<(ClassId, UserId)>,
) -> Result<Json<MemberPrivileges>, ApiError> {
  let actively_enrolled = state.engine.is_actively_enrolled(&user, &class).await?;
  let instructor = state.engine.instructor_privileges(&user, &class).await?;
  let student = state.engine.student_privileges(&user, &class).await?;
  Ok(Json(MemberPrivileges { actively_enrolled, instructor, student }))
}

#[derive(Debug, Serialize)]
pub struct CapabilityCheck {
  pub allowed: bool,
}

/// `GET /classes/{class}/members/{user}/can/{capability}`
pub async fn capability_check<S: ClassStore>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
  Path((class, user, capability)): Path<(ClassId, UserId, String)>,
) -> Result<Json<CapabilityCheck>, ApiError> {
  let capability = Capability::from_str(&capability).map_err(|_| {
    ApiError::BadRequest(format!("unknown capability: {capability:?}"))
  })?;
  let allowed = state.engine.allows(&user, &class, capability).await?;
  Ok(Json(CapabilityCheck { allowed }))
}

// ─── Instructor role mutations ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InstructorRoleBody {
  pub user_id: UserId,
  pub role:    InstructorRole,
}

/// `PUT /classes/{class}/instructor-roles`
pub async fn assign_instructor_role<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(class): Path<ClassId>,
  Json(body): Json<InstructorRoleBody>,
) -> Result<StatusCode, ApiError> {
  state
    .engine
    .assign_instructor_role(&current.0.user_id, &body.user_id, &class, body.role)
    .await?;
  Ok(StatusCode::CREATED)
}

/// `DELETE /classes/{class}/instructor-roles`
pub async fn remove_instructor_role<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(class): Path<ClassId>,
  Json(body): Json<InstructorRoleBody>,
) -> Result<StatusCode, ApiError> {
  state
    .engine
    .remove_instructor_role(&current.0.user_id, &body.user_id, &class, body.role)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── General leader ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GeneralLeaderBody {
  pub user_id: UserId,
}

/// `PUT /classes/{class}/general-leader` — admin only, replaces any holder.
pub async fn assign_general_leader<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(class): Path<ClassId>,
  Json(body): Json<GeneralLeaderBody>,
) -> Result<StatusCode, ApiError> {
  state
    .engine
    .assign_general_leader(&current.0.user_id, &body.user_id, &class)
    .await?;
  Ok(StatusCode::CREATED)
}

// ─── Student role mutations ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StudentRoleBody {
  pub user_id:       UserId,
  pub role:          StudentRole,
  pub group_id:      Option<GroupId>,
  pub study_area_id: Option<StudyAreaId>,
}

/// `PUT /classes/{class}/student-roles`
pub async fn assign_student_role<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(class): Path<ClassId>,
  Json(body): Json<StudentRoleBody>,
) -> Result<StatusCode, ApiError> {
  let scope = GrantScope {
    group_id:      body.group_id,
    study_area_id: body.study_area_id,
  };
  state
    .engine
    .assign_student_role(&current.0.user_id, &body.user_id, &class, body.role, scope)
    .await?;
  Ok(StatusCode::CREATED)
}

/// `DELETE /classes/{class}/student-roles`
pub async fn remove_student_role<S: ClassStore>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(class): Path<ClassId>,
  Json(body): Json<StudentRoleBody>,
) -> Result<StatusCode, ApiError> {
  state
    .engine
    .remove_student_role(&current.0.user_id, &body.user_id, &class, body.role)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}
